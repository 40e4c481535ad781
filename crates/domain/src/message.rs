//! The unifying message envelope threaded through every pipeline stage.
//!
//! Every crate's `AsyncReceiver`/`AsyncProcessor`/`AsyncExporter`
//! implementation is generic over a `Msg: Clone + Send + Sync + 'static`
//! type parameter, per the teacher's `receiver`/`processor`/`exporter`
//! traits. `PipelineMessage` is that type for this pipeline: every stage
//! (PLC Drivers, Sparkplug Codec, Decoder, Normalizer, OEE Calculator, Fault
//! State Machine, Sink Writer) reads and writes one of its variants.

use serde::{Deserialize, Serialize};

use crate::{
    envelope::OutboundEnvelope, fault::FaultRecord, metric::NormalizedMetric, sample::Sample,
};

/// A control command accepted by a running pipeline, per §6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlCommand {
    /// Forces a rebirth of the named Sparkplug node (clears cached alias
    /// state and requests a fresh NBIRTH).
    RequestRebirth {
        /// The Sparkplug group id.
        group_id: String,
        /// The Sparkplug node id.
        node_id: String,
    },
    /// Flushes the store-and-forward buffer's current contents immediately,
    /// bypassing the normal flush interval.
    FlushBuffer,
    /// Requests a graceful shutdown of the pipeline.
    Shutdown,
    /// `Device Control/Acknowledge Fault`: an operator acknowledges an
    /// open fault, per §6/§4.9.
    AcknowledgeFault {
        /// The asset the fault applies to.
        asset_ref: crate::tag::AssetRef,
        /// The fault code to acknowledge.
        code: String,
    },
    /// `Device Control/Resolve Fault`: an operator resolves an open fault
    /// out of band, per §6/§4.9.
    ResolveFault {
        /// The asset the fault applies to.
        asset_ref: crate::tag::AssetRef,
        /// The fault code to resolve.
        code: String,
        /// When the command was issued (milliseconds since epoch), taken
        /// from the originating NCMD/DCMD frame — this becomes the fault
        /// record's `closed_at_ms`, not the time the fault was opened.
        timestamp_ms: i64,
    },
}

/// An OEE rollup emitted by the OEE Calculator (C8) at the end of a window
/// tick, per §4.8.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OeeRollup {
    /// The asset this rollup covers.
    pub asset_ref: crate::tag::AssetRef,
    /// Window end timestamp, milliseconds since epoch.
    pub timestamp_ms: i64,
    /// Availability fraction in `[0, 1]`.
    pub availability: f64,
    /// Performance fraction in `[0, 1]`.
    pub performance: f64,
    /// Quality fraction in `[0, 1]`.
    pub quality: f64,
    /// `availability * performance * quality`.
    pub oee: f64,
}

/// A fault lifecycle transition emitted by the Fault State Machine (C9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultEvent {
    /// The fault record after the transition was applied.
    pub record: FaultRecord,
}

/// An undecoded Sparkplug frame as received from the MQTT Session (C3),
/// carried through the pipeline until the Decoder (C6) can parse it.
///
/// Kept as a domain type (rather than decoded inline in the MQTT session) so
/// the Decoder & Alias Cache remains the single owner of node/device state,
/// per §9 ("Implicit shared mutable alias caches -> one owner task per
/// node").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    /// The Sparkplug topic this frame arrived on, e.g.
    /// `spBv1.0/Plant1/NDATA/Line1`.
    pub topic: String,
    /// The raw protobuf payload bytes.
    pub payload: Vec<u8>,
    /// When this frame was received at the edge (milliseconds since epoch).
    pub received_at_ms: i64,
}

/// The single message type flowing through every receiver, processor, and
/// exporter stage in this pipeline.
///
/// Variants correspond to the Data Model entities in §3 plus the control
/// plane of §6. Each processing stage matches on the variants it cares about
/// and passes the rest through unchanged — mirroring how the teacher's
/// `SeqProcessorChain` lets each link only transform what it understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PipelineMessage {
    /// A raw reading from a PLC Driver (C1), or an already-decoded Sparkplug
    /// metric (C6) resolved to a [`Sample`] before normalization.
    Sample(Sample),
    /// A normalized, canonical-unit metric (C7 output; also the OEE
    /// Calculator's and Backpressure Controller's synthetic output).
    Metric(NormalizedMetric),
    /// A fault lifecycle transition (C9 output).
    Fault(FaultEvent),
    /// An OEE rollup (C8 output).
    Rollup(OeeRollup),
    /// An envelope ready for the Sink Writer (C10) or the edge MQTT
    /// publisher.
    Envelope(OutboundEnvelope),
    /// An operator- or control-topic-issued command.
    Control(ControlCommand),
    /// An undecoded Sparkplug frame awaiting the Decoder (C6).
    Raw(RawFrame),
}

impl PipelineMessage {
    /// Returns the approximate timestamp this message concerns, where one is
    /// defined; used for logging and for the Backpressure Controller's
    /// fairness accounting across message kinds.
    pub fn timestamp_ms(&self) -> Option<i64> {
        match self {
            PipelineMessage::Sample(sample) => Some(sample.timestamp_ms),
            PipelineMessage::Metric(metric) => Some(metric.timestamp_ms),
            PipelineMessage::Rollup(rollup) => Some(rollup.timestamp_ms),
            PipelineMessage::Fault(event) => Some(event.record.opened_at_ms),
            PipelineMessage::Envelope(envelope) => Some(envelope.enqueue_ts),
            PipelineMessage::Control(_) => None,
            PipelineMessage::Raw(frame) => Some(frame.received_at_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::Quality;

    #[test]
    fn sample_variant_exposes_its_timestamp() {
        let message = PipelineMessage::Sample(Sample::new(42, "ns=2;s=Good", 1.0, Quality::GOOD));
        assert_eq!(message.timestamp_ms(), Some(42));
    }

    #[test]
    fn control_variant_has_no_timestamp() {
        let message = PipelineMessage::Control(ControlCommand::FlushBuffer);
        assert_eq!(message.timestamp_ms(), None);
    }

    #[test]
    fn raw_variant_exposes_its_receipt_time() {
        let message = PipelineMessage::Raw(RawFrame {
            topic: "spBv1.0/Plant1/NDATA/Line1".into(),
            payload: vec![],
            received_at_ms: 7,
        });
        assert_eq!(message.timestamp_ms(), Some(7));
    }
}
