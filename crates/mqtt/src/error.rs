//! Errors raised by the MQTT session.

use std::collections::HashMap;

/// Errors produced by [`crate::Session`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MqttError {
    /// The connection attempt did not complete within `io_deadline_ms`.
    #[error("mqtt operation timed out after {deadline_ms}ms: {operation}")]
    Timeout {
        /// The operation that timed out (`connect`, `publish`, `subscribe`).
        operation: &'static str,
        /// The configured deadline.
        deadline_ms: u64,
    },
    /// The underlying client reported a connection error.
    #[error("mqtt connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),
    /// A publish or subscribe call failed against a disconnected client.
    #[error("mqtt client error: {0}")]
    Client(#[from] rumqttc::ClientError),
    /// Any other session-level failure, with free-form diagnostic context.
    #[error("mqtt session error: {message}")]
    Session {
        /// Human-readable description.
        message: String,
        /// Additional structured context for logging.
        context: HashMap<String, String>,
    },
}
