use lapin::{options::BasicPublishOptions, BasicProperties, Connection};
use tracing::{error, info, warn};

use super::channel::{ChannelError, ChannelProvider};
use super::connection::{ConnectionError, RabbitMqConnection};
use super::exchange::{declare_exchange, DeclarationError, ExchangeSpec};

pub const JSON_CONTENT_TYPE: &str = "application/json";

const DELIVERY_MODE_TRANSIENT: u8 = 1;
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// Everything a single publish needs. The body is already serialized.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub url: String,
    pub exchange: ExchangeSpec,
    pub routing_key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub persistent: bool,
}

impl PublishRequest {
    /// Persistent `application/json` message.
    pub fn json(
        url: impl Into<String>,
        exchange: ExchangeSpec,
        routing_key: impl Into<String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            url: url.into(),
            exchange,
            routing_key: routing_key.into(),
            body,
            content_type: JSON_CONTENT_TYPE.to_string(),
            persistent: true,
        }
    }
}

pub fn message_properties(content_type: &str, persistent: bool) -> BasicProperties {
    let delivery_mode = if persistent {
        DELIVERY_MODE_PERSISTENT
    } else {
        DELIVERY_MODE_TRANSIENT
    };

    BasicProperties::default()
        .with_content_type(content_type.into())
        .with_delivery_mode(delivery_mode)
}

/// Connects, declares the exchange, publishes once and disconnects.
///
/// Returns only after the broker confirmed the message. The connection is
/// closed before returning on every path, including failures.
pub async fn publish(request: &PublishRequest) -> Result<(), PublishError> {
    let rabbitmq = RabbitMqConnection::connect(&request.url).await?;
    let outcome = deliver(rabbitmq.get_connection(), request).await;
    rabbitmq.release(outcome).await
}

async fn deliver(connection: &Connection, request: &PublishRequest) -> Result<(), PublishError> {
    let channel = ChannelProvider::create_channel(connection).await?;

    declare_exchange(&channel, &request.exchange).await?;

    let exchange = request.exchange.name.as_str();
    let routing_key = request.routing_key.as_str();

    info!(
        exchange,
        routing_key,
        payload_size = request.body.len(),
        content_type = %request.content_type,
        persistent = request.persistent,
        "Publishing message"
    );

    let publish_failed = |e: lapin::Error| {
        error!(error = %e, exchange, routing_key, "Failed to publish message");
        PublishError::Publish {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            reason: e.to_string(),
        }
    };

    let confirmation = channel
        .basic_publish(
            exchange,
            routing_key,
            BasicPublishOptions::default(),
            &request.body,
            message_properties(&request.content_type, request.persistent),
        )
        .await
        .map_err(publish_failed)?
        .await
        .map_err(publish_failed)?;

    if confirmation.is_nack() {
        error!(exchange, routing_key, "Broker rejected message");
        return Err(PublishError::Rejected {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
        });
    }

    info!(exchange, routing_key, "Message confirmed by broker");

    if let Err(e) = ChannelProvider::close_channel(channel).await {
        warn!(error = %e, "Channel close failed after confirmed publish");
    }

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    #[error("Failed to publish to exchange '{exchange}' with routing key '{routing_key}': {reason}")]
    Publish {
        exchange: String,
        routing_key: String,
        reason: String,
    },

    #[error("Broker rejected message for exchange '{exchange}' with routing key '{routing_key}'")]
    Rejected {
        exchange: String,
        routing_key: String,
    },
}

impl PublishError {
    /// Short stable label for structured logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection_failed",
            Self::Channel(_) => "channel_failed",
            Self::Declaration(e) => e.as_label(),
            Self::Publish { .. } => "publish_failed",
            Self::Rejected { .. } => "publish_rejected",
        }
    }

    pub fn is_exchange_mismatch(&self) -> bool {
        matches!(self, Self::Declaration(DeclarationError::Mismatch { .. }))
    }
}
