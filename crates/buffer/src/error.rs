//! Errors raised by the store-and-forward buffer.

/// Errors produced by [`crate::DurableLog`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BufferError {
    /// The on-disk log or pointer file could not be read or written.
    #[error("buffer i/o error at {path}: {source}")]
    Io {
        /// The path being operated on.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A persisted envelope record failed to (de)serialize.
    #[error("buffer record corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
