//! Outbound envelopes queued for the cloud sink, per §3 and §4.10.

use serde::{Deserialize, Serialize};

/// A unit of work handed to the Sink Writer (C10), carrying its own retry
/// bookkeeping.
///
/// `monotonic_seq` is a per-edge-node 64-bit counter persisted across
/// restarts and never reused — it is the Sink Writer's idempotency key, not
/// the Sparkplug `seq` (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    /// Per-edge-node counter, persisted across restarts, never reused.
    pub monotonic_seq: u64,
    /// The destination topic or route.
    pub topic: String,
    /// The serialized payload bytes.
    pub payload: Vec<u8>,
    /// When this envelope was enqueued (milliseconds since epoch).
    pub enqueue_ts: i64,
    /// Number of delivery attempts made so far.
    #[serde(default)]
    pub attempts: u32,
}

impl OutboundEnvelope {
    /// Creates a fresh envelope with zero delivery attempts.
    pub fn new(monotonic_seq: u64, topic: impl Into<String>, payload: Vec<u8>, enqueue_ts: i64) -> Self {
        Self {
            monotonic_seq,
            topic: topic.into(),
            payload,
            enqueue_ts,
            attempts: 0,
        }
    }

    /// Records a delivery attempt, returning the new attempt count.
    pub fn record_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_envelope_has_zero_attempts() {
        let envelope = OutboundEnvelope::new(1, "oee/rollup", vec![1, 2, 3], 0);
        assert_eq!(envelope.attempts, 0);
    }

    #[test]
    fn record_attempt_increments_and_returns_count() {
        let mut envelope = OutboundEnvelope::new(1, "oee/rollup", vec![], 0);
        assert_eq!(envelope.record_attempt(), 1);
        assert_eq!(envelope.record_attempt(), 2);
    }
}
