//! The Sink Writer (C10), per §4.10: batches Normalized Metrics, Fault
//! events, and OEE rollups into the downstream store.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use exporter::{effect::EffectHandler, AsyncExporter, Error};
use oee_domain::PipelineMessage;
use signal::{Signal, SignalReceiver};

use crate::{
    backoff::RetryBackoff,
    config::SinkConfig,
    record::{attach, SinkRecord},
    transport::SinkTransport,
};

/// How many times a batch is retried inline (with backoff) before it is
/// moved to the bounded retry queue instead, per §4.10/§5's "never block
/// indefinitely".
const MAX_INLINE_ATTEMPTS: u32 = 3;

/// A shared handle the Sink Writer raises when its retry queue fills, for
/// whichever upstream stage applies its own overflow policy (§4.10: "signal
/// the upstream pipeline"), the same `Arc<Atomic*>` handle pattern used by
/// `oee_domain::handles` for cross-stage coordination.
#[derive(Clone)]
pub struct SinkBackpressureHandle(Arc<AtomicBool>);

impl SinkBackpressureHandle {
    /// Creates a handle starting in the uncongested state.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Marks the sink as congested or not.
    pub fn set(&self, congested: bool) {
        self.0.store(congested, Ordering::Relaxed);
    }

    /// Reads the current congestion state.
    pub fn is_congested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for SinkBackpressureHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Batches [`PipelineMessage`]s into the downstream store, generic over the
/// write transport.
pub struct SinkWriter<T: SinkTransport> {
    name: String,
    config: SinkConfig,
    transport: T,
    backoff: RetryBackoff,
    next_seq: u64,
    batch: Vec<SinkRecord>,
    retry_queue: VecDeque<SinkRecord>,
    backpressure: SinkBackpressureHandle,
}

impl<T: SinkTransport> SinkWriter<T> {
    /// Creates a new Sink Writer owning `transport`.
    pub fn new(name: impl Into<String>, config: SinkConfig, transport: T) -> Self {
        Self {
            name: name.into(),
            batch: Vec::with_capacity(config.batch_size),
            config,
            transport,
            backoff: RetryBackoff::default(),
            next_seq: 1,
            retry_queue: VecDeque::new(),
            backpressure: SinkBackpressureHandle::new(),
        }
    }

    /// A clone of the handle the upstream pipeline watches for sink
    /// congestion.
    pub fn backpressure_handle(&self) -> SinkBackpressureHandle {
        self.backpressure.clone()
    }

    fn allocate_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn accept(&mut self, message: PipelineMessage) {
        let seq = self.allocate_seq();
        if let Some(record) = attach(message, seq) {
            self.batch.push(record);
        }
    }

    /// Attempts `records` up to [`MAX_INLINE_ATTEMPTS`] times, sleeping on
    /// backoff between transient failures. Returns whatever is left
    /// unwritten (empty on success, or a persistent/exhausted-retry error).
    async fn write_with_retry(&mut self, records: Vec<SinkRecord>) -> Vec<SinkRecord> {
        let mut remaining = records;
        for _ in 0..MAX_INLINE_ATTEMPTS {
            if remaining.is_empty() {
                return remaining;
            }
            match self.transport.write_batch(&remaining).await {
                Ok(()) => {
                    self.backoff.reset();
                    return Vec::new();
                }
                Err(error) if error.is_transient() => {
                    let delay = self.backoff.next_delay();
                    tracing::warn!(sink = %self.name, %error, delay_ms = %delay.as_millis(), "sink write failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    tracing::error!(sink = %self.name, %error, "sink write rejected, moving batch to retry queue");
                    return remaining;
                }
            }
        }
        remaining
    }

    /// Pushes records that failed all inline attempts into the bounded
    /// retry queue, dropping the oldest entries and raising the
    /// backpressure handle if it is already full, per §4.10.
    fn enqueue_for_retry(&mut self, records: Vec<SinkRecord>) {
        if records.is_empty() {
            return;
        }
        for record in records {
            if self.retry_queue.len() >= self.config.retry_queue_capacity {
                let _ = self.retry_queue.pop_front();
                self.backpressure.set(true);
                tracing::warn!(sink = %self.name, "retry queue full, dropping oldest and signaling backpressure");
            }
            self.retry_queue.push_back(record);
        }
    }

    async fn flush_batch(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let batch = std::mem::replace(&mut self.batch, Vec::with_capacity(self.config.batch_size));
        let failed = self.write_with_retry(batch).await;
        self.enqueue_for_retry(failed);
    }

    async fn drain_retry_queue(&mut self) {
        if self.retry_queue.is_empty() {
            return;
        }
        let drain_size = self.config.batch_size.min(self.retry_queue.len());
        let batch: Vec<SinkRecord> = self.retry_queue.drain(..drain_size).collect();
        let failed = self.write_with_retry(batch).await;
        if failed.is_empty() && self.retry_queue.len() < self.config.retry_queue_capacity {
            self.backpressure.set(false);
        }
        for record in failed.into_iter().rev() {
            self.retry_queue.push_front(record);
        }
    }
}

#[async_trait]
impl<T: SinkTransport + 'static> AsyncExporter<PipelineMessage> for SinkWriter<T> {
    async fn init(&mut self, engine_handler: &mut exporter::EngineHandler) -> Result<(), Error> {
        engine_handler.timer(Duration::from_millis(self.config.flush_ms));
        Ok(())
    }

    async fn export(&mut self, mut signal_receiver: SignalReceiver<PipelineMessage>, effect_handler: EffectHandler<PipelineMessage>) -> Result<(), Error> {
        loop {
            match signal_receiver.recv().await {
                Signal::Messages { messages } => {
                    for message in messages {
                        self.accept(message);
                    }
                    if self.batch.len() >= self.config.batch_size {
                        self.flush_batch().await;
                    }
                }
                Signal::TimerTick { .. } => {
                    self.flush_batch().await;
                    self.drain_retry_queue().await;
                }
                Signal::Stop => {
                    self.flush_batch().await;
                    break;
                }
                signal => {
                    effect_handler.warn(format!("unsupported signal: {signal}"), None);
                    return Err(Error::UnsupportedEvent {
                        exporter: self.name.clone(),
                        signal: signal.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oee_domain::{AssetRef, NormalizedMetric, Quality, SignalType};

    fn writer(capacity: usize) -> SinkWriter<crate::transport::RecordingTransport> {
        let config = SinkConfig {
            endpoint: "test://sink".into(),
            batch_size: 2,
            flush_ms: 1_000,
            retry_queue_capacity: capacity,
            request_timeout_ms: 1_000,
        };
        SinkWriter::new("sink1", config, crate::transport::RecordingTransport::new())
    }

    fn metric(value: f64) -> PipelineMessage {
        PipelineMessage::Metric(NormalizedMetric::new(
            AssetRef::new("M1"),
            SignalType::CounterGood,
            0,
            value,
            Quality::GOOD,
            "count",
        ))
    }

    #[tokio::test]
    async fn batch_flushes_once_batch_size_is_reached() {
        let mut writer = writer(10);
        writer.accept(metric(1.0));
        assert_eq!(writer.batch.len(), 1);
        writer.accept(metric(2.0));
        writer.flush_batch().await;
        assert_eq!(writer.transport.written.len(), 1);
        assert_eq!(writer.transport.written[0].len(), 2);
        assert!(writer.batch.is_empty());
    }

    #[tokio::test]
    async fn each_accepted_metric_gets_a_distinct_monotonic_seq() {
        let mut writer = writer(10);
        writer.accept(metric(1.0));
        writer.accept(metric(2.0));
        assert_eq!(writer.batch[0].dedup_key.monotonic_seq, 1);
        assert_eq!(writer.batch[1].dedup_key.monotonic_seq, 2);
    }

    #[tokio::test]
    async fn persistent_failure_moves_the_batch_to_the_retry_queue() {
        let mut writer = writer(10);
        writer.transport.fail_with = Some(crate::error::SinkError::Rejected("bad request".into()));
        writer.accept(metric(1.0));
        writer.flush_batch().await;
        assert!(writer.transport.written.is_empty());
        assert_eq!(writer.retry_queue.len(), 1);
    }

    #[tokio::test]
    async fn full_retry_queue_drops_oldest_and_signals_backpressure() {
        let mut writer = writer(1);
        writer.transport.fail_with = Some(crate::error::SinkError::Rejected("bad request".into()));
        writer.accept(metric(1.0));
        writer.flush_batch().await;
        writer.accept(metric(2.0));
        writer.flush_batch().await;
        assert_eq!(writer.retry_queue.len(), 1);
        assert!(writer.backpressure_handle().is_congested());
    }

    #[tokio::test]
    async fn successful_drain_clears_backpressure() {
        let mut writer = writer(1);
        writer.transport.fail_with = Some(crate::error::SinkError::Rejected("bad request".into()));
        writer.accept(metric(1.0));
        writer.flush_batch().await;
        writer.transport.fail_with = None;
        writer.drain_retry_queue().await;
        assert!(writer.retry_queue.is_empty());
        assert!(!writer.backpressure_handle().is_congested());
    }
}
