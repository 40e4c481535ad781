#![deny(
    trivial_numeric_casts,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    unused_results
)]
#![warn(rust_2021_compatibility, unreachable_pub)]

//! Core data model shared by every stage of the OEE telemetry pipeline:
//! Tag Bindings, Samples, Sparkplug Node/Device state, Normalized Metrics,
//! Rolling Windows, Fault Records, Outbound Envelopes, and the
//! [`PipelineMessage`] envelope that unifies them for the generic
//! receiver/processor/exporter machinery.

mod envelope;
mod fault;
mod handles;
mod message;
mod metric;
mod quality;
mod sample;
mod signal_type;
mod sparkplug_state;
mod tag;
mod window;

pub use envelope::OutboundEnvelope;
pub use fault::{FaultRecord, FaultSeverity, FaultState};
pub use handles::{BackpressureHandle, BdSeqHandle, RebirthRequestHandle};
pub use message::{ControlCommand, FaultEvent, OeeRollup, PipelineMessage, RawFrame};
pub use metric::NormalizedMetric;
pub use quality::Quality;
pub use sample::Sample;
pub use signal_type::{SignalType, UnknownSignalType};
pub use sparkplug_state::{DeviceState, MetricDescriptor, NodeState, NodeStatus};
pub use tag::{AssetRef, TagBinding};
pub use window::RollingWindow;
