//! Errors raised by the Sparkplug codec and alias cache.

use std::collections::HashMap;

/// Errors produced while encoding or decoding Sparkplug B frames.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SparkplugError {
    /// An NDATA/DDATA frame referenced a metric alias with no matching
    /// NBIRTH/DBIRTH entry (§4.2: "protocol error").
    #[error("unknown alias {alias} on node {group_id}/{node_id}")]
    UnknownAlias {
        /// The Sparkplug group id.
        group_id: String,
        /// The Sparkplug node id.
        node_id: String,
        /// The unresolved alias.
        alias: u64,
    },
    /// The frame's `seq` was not `(last_seq + 1) mod 256`.
    #[error("sequence gap on node {group_id}/{node_id}: expected {expected}, got {actual}")]
    SequenceGap {
        /// The Sparkplug group id.
        group_id: String,
        /// The Sparkplug node id.
        node_id: String,
        /// The expected sequence number.
        expected: u8,
        /// The sequence number actually observed.
        actual: u8,
    },
    /// The wire bytes did not decode as a well-formed `Payload`.
    #[error("malformed payload: {0}")]
    Decode(#[from] prost::DecodeError),
    /// A metric carried a `datatype` ordinal not in the supported subset.
    #[error("unsupported datatype ordinal {0}")]
    UnsupportedDatatype(u32),
    /// Any other protocol violation, with free-form diagnostic context.
    #[error("sparkplug protocol violation: {message}")]
    Protocol {
        /// Human-readable description.
        message: String,
        /// Additional structured context for logging.
        context: HashMap<String, String>,
    },
}
