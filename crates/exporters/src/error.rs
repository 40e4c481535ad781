//! Sink transport errors, per §4.10's transient-vs-persistent failure split.

/// Errors produced while writing a batch to the downstream store.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SinkError {
    /// The store could not be reached, or responded with a retriable
    /// status (timeout, 5xx, connection reset). The batch is retried.
    #[error("sink endpoint unreachable: {0}")]
    Unreachable(String),

    /// The store rejected the batch in a way that will not succeed on
    /// retry (authentication, malformed payload, 4xx other than 429).
    #[error("sink write rejected: {0}")]
    Rejected(String),
}

impl SinkError {
    /// Whether this error is transient (retry with backoff) or persistent
    /// (move the batch to the retry queue and stop retrying inline), per
    /// §4.10 ("transient -> retry with backoff; persistent -> push back to
    /// an in-memory bounded retry queue").
    pub fn is_transient(&self) -> bool {
        matches!(self, SinkError::Unreachable(_))
    }
}
