//! The in-memory, bounded FIFO view of the store-and-forward buffer, backed
//! by a [`DurableLog`], per §4.4.

use std::{collections::VecDeque, path::Path};

use oee_domain::OutboundEnvelope;

use crate::{error::BufferError, log::DurableLog};

/// Default byte bound, per §4.4.
pub const DEFAULT_MAX_BYTES: u64 = 500 * 1024 * 1024;
/// Default envelope-count bound, per §4.4.
pub const DEFAULT_MAX_COUNT: usize = 10_000;

/// A durable, bounded, FIFO queue of [`OutboundEnvelope`]s awaiting
/// publish.
///
/// Invariant (§4.4): at any instant, the union of in-buffer envelopes and
/// broker-acknowledged envelopes is a contiguous prefix of the producer's
/// output stream, with at most the documented overflow loss at the head.
pub struct Buffer {
    log: DurableLog,
    queue: VecDeque<OutboundEnvelope>,
    max_bytes: u64,
    max_count: usize,
    current_bytes: u64,
    dropped_count: u64,
}

impl Buffer {
    /// Opens the buffer's durable log under `dir` and replays any envelopes
    /// left over from a previous process.
    pub async fn open(dir: impl AsRef<Path>, max_bytes: u64, max_count: usize) -> Result<Self, BufferError> {
        let log = DurableLog::open(dir).await?;
        let replayed = log.replay().await?;
        let highest_acked_seq = log.highest_acked_seq();
        let mut buffer = Self {
            log,
            queue: VecDeque::new(),
            max_bytes,
            max_count,
            current_bytes: 0,
            dropped_count: 0,
        };
        for envelope in replayed {
            if highest_acked_seq.is_some_and(|acked| envelope.monotonic_seq <= acked) {
                continue;
            }
            buffer.current_bytes += envelope.payload.len() as u64;
            buffer.queue.push_back(envelope);
        }
        buffer.enforce_bounds();
        Ok(buffer)
    }

    /// Assigns the next `monotonic_seq`, persists the envelope to the
    /// durable log, and enqueues it, evicting the oldest envelope(s) if the
    /// byte or count bound is now exceeded.
    pub async fn enqueue(&mut self, topic: impl Into<String>, payload: Vec<u8>, enqueue_ts: i64) -> Result<OutboundEnvelope, BufferError> {
        let seq = self.log.next_monotonic_seq();
        let envelope = OutboundEnvelope::new(seq, topic, payload, enqueue_ts);
        self.log.append(&envelope).await?;
        self.current_bytes += envelope.payload.len() as u64;
        self.queue.push_back(envelope.clone());
        self.enforce_bounds();
        Ok(envelope)
    }

    /// Drops envelopes from the head until both bounds are satisfied,
    /// counting each drop for observability (§4.4).
    fn enforce_bounds(&mut self) {
        while self.queue.len() > self.max_count || self.current_bytes > self.max_bytes {
            match self.queue.pop_front() {
                Some(dropped) => {
                    self.current_bytes = self.current_bytes.saturating_sub(dropped.payload.len() as u64);
                    self.dropped_count += 1;
                    tracing::warn!(monotonic_seq = dropped.monotonic_seq, "store-and-forward buffer overflow, dropping oldest envelope");
                }
                None => break,
            }
        }
    }

    /// Acknowledges every envelope up to and including `monotonic_seq`,
    /// removing them from the in-memory queue and fsyncing the durable ack
    /// pointer. Per §4.4, an envelope is removed only after the MQTT layer
    /// reports a QoS 1 ack.
    pub async fn ack(&mut self, monotonic_seq: u64) -> Result<(), BufferError> {
        while let Some(front) = self.queue.front() {
            if front.monotonic_seq > monotonic_seq {
                break;
            }
            let popped = self.queue.pop_front().expect("front just checked Some");
            self.current_bytes = self.current_bytes.saturating_sub(popped.payload.len() as u64);
        }
        self.log.advance_ack(monotonic_seq).await
    }

    /// Iterates envelopes currently queued, in strict enqueue order — the
    /// replay order required on reconnect (§4.4).
    pub fn iter(&self) -> impl Iterator<Item = &OutboundEnvelope> {
        self.queue.iter()
    }

    /// Current fill ratio against the byte bound, the input to the
    /// Backpressure Controller's control law (§4.5).
    pub fn fill_ratio(&self) -> f64 {
        if self.max_bytes == 0 {
            return 0.0;
        }
        self.current_bytes as f64 / self.max_bytes as f64
    }

    /// Number of envelopes dropped by overflow since this buffer was
    /// opened.
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    /// Number of envelopes currently queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the buffer currently holds no envelopes.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_assigns_increasing_monotonic_seq() {
        let dir = tempfile::tempdir().unwrap();
        let mut buffer = Buffer::open(dir.path(), DEFAULT_MAX_BYTES, DEFAULT_MAX_COUNT).await.unwrap();
        let first = buffer.enqueue("t", vec![1], 0).await.unwrap();
        let second = buffer.enqueue("t", vec![1], 0).await.unwrap();
        assert_eq!(first.monotonic_seq, 0);
        assert_eq!(second.monotonic_seq, 1);
    }

    #[tokio::test]
    async fn overflow_drops_oldest_and_counts_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut buffer = Buffer::open(dir.path(), DEFAULT_MAX_BYTES, 2).await.unwrap();
        let _ = buffer.enqueue("t", vec![1], 0).await.unwrap();
        let _ = buffer.enqueue("t", vec![1], 0).await.unwrap();
        let third = buffer.enqueue("t", vec![1], 0).await.unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.dropped_count(), 1);
        assert_eq!(buffer.iter().next().unwrap().monotonic_seq, third.monotonic_seq - 1);
    }

    #[tokio::test]
    async fn ack_removes_only_up_to_and_including_seq() {
        let dir = tempfile::tempdir().unwrap();
        let mut buffer = Buffer::open(dir.path(), DEFAULT_MAX_BYTES, DEFAULT_MAX_COUNT).await.unwrap();
        for _ in 0..3 {
            let _ = buffer.enqueue("t", vec![1], 0).await.unwrap();
        }
        buffer.ack(1).await.unwrap();
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.iter().next().unwrap().monotonic_seq, 2);
    }

    #[tokio::test]
    async fn reopening_replays_only_unacked_envelopes() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut buffer = Buffer::open(dir.path(), DEFAULT_MAX_BYTES, DEFAULT_MAX_COUNT).await.unwrap();
            for _ in 0..3 {
                let _ = buffer.enqueue("t", vec![1], 0).await.unwrap();
            }
            buffer.ack(0).await.unwrap();
        }
        let reopened = Buffer::open(dir.path(), DEFAULT_MAX_BYTES, DEFAULT_MAX_COUNT).await.unwrap();
        assert_eq!(reopened.len(), 2);
    }
}
