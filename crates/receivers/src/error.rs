//! PLC transport errors, per §4.1's `{UNREACHABLE, AUTH, TLS, PROTOCOL}`
//! failure kinds.

/// Errors produced while opening or polling a PLC endpoint.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PlcError {
    /// The endpoint could not be reached (transient; caller reconnects).
    #[error("plc endpoint unreachable: {0}")]
    Unreachable(String),
    /// Authentication failed (fatal for this endpoint).
    #[error("plc authentication failed: {0}")]
    Auth(String),
    /// TLS handshake or certificate validation failed (fatal for this
    /// endpoint).
    #[error("plc tls error: {0}")]
    Tls(String),
    /// The endpoint responded but the protocol framing was invalid.
    #[error("plc protocol error: {0}")]
    Protocol(String),
}

impl PlcError {
    /// Whether this error is transient (driver should reconnect) or fatal
    /// (driver should stop the endpoint), per §4.1's failure semantics.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlcError::Unreachable(_) | PlcError::Protocol(_))
    }
}
