use lapin::{Connection, ConnectionProperties};
use tracing::{error, info, warn};

use crate::config::redact_url;

pub struct RabbitMqConnection {
    connection: Connection,
    url: String,
}

impl RabbitMqConnection {
    pub async fn connect(url: &str) -> Result<Self, ConnectionError> {
        // Only the redacted form is ever logged or kept.
        let redacted = redact_url(url);
        info!(url = %redacted, "Connecting to RabbitMQ");

        let properties = ConnectionProperties::default()
            .with_connection_name(env!("CARGO_PKG_NAME").into());

        let connection = Connection::connect(url, properties)
            .await
            .map_err(|e| {
                error!(error = %e, url = %redacted, "Failed to connect to RabbitMQ");
                ConnectionError::ConnectionFailed(e.to_string())
            })?;

        info!(url = %redacted, "Successfully connected to RabbitMQ");

        Ok(Self {
            connection,
            url: redacted,
        })
    }

    pub fn get_connection(&self) -> &Connection {
        &self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection.status().connected()
    }

    pub async fn shutdown(self) -> Result<(), ConnectionError> {
        info!(url = %self.url, "Shutting down RabbitMQ connection");

        self.connection
            .close(200, "Normal shutdown")
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to close RabbitMQ connection gracefully");
                ConnectionError::ShutdownFailed(e.to_string())
            })?;

        info!("RabbitMQ connection closed successfully");
        Ok(())
    }

    /// Closes the connection and hands `outcome` back unchanged.
    ///
    /// Every path that acquired a connection funnels through here, so the
    /// connection is released whether the work succeeded or not. A failed close
    /// is only logged: it neither masks the work's error nor undoes a publish
    /// the broker already confirmed.
    pub async fn release<T, E>(self, outcome: Result<T, E>) -> Result<T, E> {
        if !self.is_connected() {
            warn!(url = %self.url, "Connection already closed, nothing to release");
            return outcome;
        }

        if let Err(e) = self.shutdown().await {
            warn!(error = %e, "Connection release failed");
        }

        outcome
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Failed to connect to RabbitMQ: {0}")]
    ConnectionFailed(String),

    #[error("Failed to shutdown connection gracefully: {0}")]
    ShutdownFailed(String),
}
