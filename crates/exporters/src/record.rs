//! The unit of work the Sink Writer batches: a [`PipelineMessage`] paired
//! with the deduplication key it writes alongside it, per §4.10
//! ("every write includes a deduplication key `(asset_ref, signal_type,
//! timestamp, monotonic_seq)`").

use oee_domain::{PipelineMessage, SignalType};
use serde::Serialize;

/// The idempotency key carried on every sink write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DedupKey {
    /// The asset the record concerns.
    pub asset_ref: String,
    /// The signal type, or a synthetic kind for records that don't carry
    /// one natively (fault events, OEE rollups).
    pub signal_type: String,
    /// The record's own timestamp.
    pub timestamp_ms: i64,
    /// The Sink Writer's own per-process counter, assigned when the
    /// message is first accepted into a batch.
    pub monotonic_seq: u64,
}

/// A message queued for (or retried against) the downstream store, carrying
/// the key the store uses to dedup retries after an ambiguous failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinkRecord {
    /// The deduplication key.
    pub dedup_key: DedupKey,
    /// The message payload.
    pub message: PipelineMessage,
}

/// Builds a [`SinkRecord`] for the message variants the Sink Writer is
/// responsible for (`Metric`, `Fault`, `Rollup`); returns `None` for any
/// other variant, which passes through the pipeline untouched instead.
///
/// For `Metric`, the assigned `monotonic_seq` is also written onto the
/// metric's own [`oee_domain::NormalizedMetric::monotonic_seq`] field so it
/// travels with the payload, not just the out-of-band key.
pub fn attach(message: PipelineMessage, monotonic_seq: u64) -> Option<SinkRecord> {
    match message {
        PipelineMessage::Metric(mut metric) => {
            metric.monotonic_seq = Some(monotonic_seq);
            let dedup_key = DedupKey {
                asset_ref: metric.asset_ref.to_string(),
                signal_type: metric.signal_type.to_string(),
                timestamp_ms: metric.timestamp_ms,
                monotonic_seq,
            };
            Some(SinkRecord {
                dedup_key,
                message: PipelineMessage::Metric(metric),
            })
        }
        PipelineMessage::Fault(event) => {
            let dedup_key = DedupKey {
                asset_ref: event.record.asset_ref.to_string(),
                signal_type: format!("fault.{}", event.record.code),
                timestamp_ms: event.record.opened_at_ms,
                monotonic_seq,
            };
            Some(SinkRecord {
                dedup_key,
                message: PipelineMessage::Fault(event),
            })
        }
        PipelineMessage::Rollup(rollup) => {
            let dedup_key = DedupKey {
                asset_ref: rollup.asset_ref.to_string(),
                signal_type: SignalType::RollupOee.to_string(),
                timestamp_ms: rollup.timestamp_ms,
                monotonic_seq,
            };
            Some(SinkRecord {
                dedup_key,
                message: PipelineMessage::Rollup(rollup),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oee_domain::{AssetRef, NormalizedMetric, Quality};

    #[test]
    fn metric_gets_its_monotonic_seq_written_back() {
        let metric = NormalizedMetric::new(AssetRef::new("M1"), SignalType::CounterGood, 0, 1.0, Quality::GOOD, "count");
        let record = attach(PipelineMessage::Metric(metric), 7).expect("metric is handled");
        assert_eq!(record.dedup_key.monotonic_seq, 7);
        let PipelineMessage::Metric(metric) = record.message else { panic!("expected metric") };
        assert_eq!(metric.monotonic_seq, Some(7));
    }

    #[test]
    fn control_commands_are_not_sink_records() {
        assert!(attach(PipelineMessage::Control(oee_domain::ControlCommand::FlushBuffer), 1).is_none());
    }
}
