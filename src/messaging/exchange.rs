use lapin::{
    options::ExchangeDeclareOptions,
    protocol::{AMQPErrorKind, AMQPSoftError},
    types::FieldTable,
    Channel, ExchangeKind,
};
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct ExchangeSpec {
    pub name: String,
    pub kind: ExchangeKind,
    pub durable: bool,
}

impl ExchangeSpec {
    /// Durable topic exchange, the only kind this publisher routes through.
    pub fn topic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ExchangeKind::Topic,
            durable: true,
        }
    }
}

/// Declares `spec` on the broker. Redeclaring an identical exchange is a
/// no-op; a conflicting one closes the channel with `PRECONDITION_FAILED`.
pub async fn declare_exchange(channel: &Channel, spec: &ExchangeSpec) -> Result<(), DeclarationError> {
    info!(
        exchange = %spec.name,
        kind = ?spec.kind,
        durable = spec.durable,
        "Declaring exchange"
    );

    channel
        .exchange_declare(
            &spec.name,
            spec.kind.clone(),
            ExchangeDeclareOptions {
                passive: false,
                durable: spec.durable,
                auto_delete: false,
                internal: false,
                nowait: false,
            },
            FieldTable::default(),
        )
        .await
        .map_err(|e| {
            let err = classify_declare_error(&spec.name, &e);
            error!(error = %e, exchange = %spec.name, label = err.as_label(), "Exchange declaration failed");
            err
        })?;

    info!(exchange = %spec.name, "Exchange declared");
    Ok(())
}

pub(crate) fn classify_declare_error(exchange: &str, err: &lapin::Error) -> DeclarationError {
    match err {
        lapin::Error::ProtocolError(amqp)
            if matches!(
                amqp.kind(),
                AMQPErrorKind::Soft(AMQPSoftError::PRECONDITIONFAILED)
            ) =>
        {
            DeclarationError::Mismatch {
                exchange: exchange.to_string(),
                reason: err.to_string(),
            }
        }
        _ => DeclarationError::Failed {
            exchange: exchange.to_string(),
            reason: err.to_string(),
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeclarationError {
    #[error("Exchange '{exchange}' already exists with different properties: {reason}")]
    Mismatch { exchange: String, reason: String },

    #[error("Failed to declare exchange '{exchange}': {reason}")]
    Failed { exchange: String, reason: String },
}

impl DeclarationError {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Mismatch { .. } => "exchange_mismatch",
            Self::Failed { .. } => "exchange_declare_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapin::protocol::AMQPError;

    fn protocol_error(kind: AMQPSoftError) -> lapin::Error {
        lapin::Error::ProtocolError(AMQPError::new(
            AMQPErrorKind::Soft(kind),
            "inequivalent arg 'type' for exchange".into(),
        ))
    }

    #[test]
    fn test_topic_spec_is_durable() {
        let spec = ExchangeSpec::topic("gymcore-exchange");
        assert_eq!(spec.name, "gymcore-exchange");
        assert!(matches!(spec.kind, ExchangeKind::Topic));
        assert!(spec.durable);
    }

    #[test]
    fn test_precondition_failed_is_mismatch() {
        let err = classify_declare_error(
            "gymcore-exchange",
            &protocol_error(AMQPSoftError::PRECONDITIONFAILED),
        );
        assert!(matches!(err, DeclarationError::Mismatch { ref exchange, .. } if exchange == "gymcore-exchange"));
        assert_eq!(err.as_label(), "exchange_mismatch");
    }

    #[test]
    fn test_access_refused_is_not_mismatch() {
        let err = classify_declare_error(
            "gymcore-exchange",
            &protocol_error(AMQPSoftError::ACCESSREFUSED),
        );
        assert!(matches!(err, DeclarationError::Failed { .. }));
    }

    #[test]
    fn test_missing_heartbeat_is_not_mismatch() {
        let err = classify_declare_error("gymcore-exchange", &lapin::Error::MissingHeartbeatError);
        assert_eq!(err.as_label(), "exchange_declare_failed");
    }
}
