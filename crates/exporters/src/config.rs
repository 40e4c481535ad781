//! Sink configuration, per §6's `sink.{endpoint,batch_size,flush_interval}`.

use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_batch_size() -> usize {
    1_000
}

fn default_flush_ms() -> u64 {
    1_000
}

fn default_retry_queue_capacity() -> usize {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Configuration for one Sink Writer instance, per §4.10.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// The downstream store's write endpoint (URL).
    #[validate(length(min = 1))]
    pub endpoint: String,
    /// Maximum batch size before an early flush, per §4.10 (default 1000).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Flush interval in milliseconds if `batch_size` is not reached first,
    /// per §4.10 (default 1 s).
    #[serde(default = "default_flush_ms")]
    pub flush_ms: u64,
    /// Bound on the in-memory retry queue a persistently-failing batch is
    /// pushed to, per §4.10 ("push back to an in-memory bounded retry
    /// queue and, when that fills, signal the upstream pipeline").
    #[serde(default = "default_retry_queue_capacity")]
    pub retry_queue_capacity: usize,
    /// Per-write deadline, per §5 ("every external I/O call has a deadline
    /// (default 30 s)").
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            batch_size: default_batch_size(),
            flush_ms: default_flush_ms(),
            retry_queue_capacity: default_retry_queue_capacity(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = SinkConfig {
            endpoint: "https://sink.example/write".into(),
            ..SinkConfig::default()
        };
        assert_eq!(config.batch_size, 1_000);
        assert_eq!(config.flush_ms, 1_000);
        assert_eq!(config.retry_queue_capacity, 10_000);
        assert_eq!(config.request_timeout_ms, 30_000);
    }
}
