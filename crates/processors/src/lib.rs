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

//! Sparkplug Codec encoder (C2), Decoder & Alias Cache (C6), Normalizer
//! (C7), OEE Calculator (C8), and Fault State Machine (C9).
//!
//! The encoder runs standalone at the edge, ahead of the Store-and-Forward
//! Buffer. Centrally, the other four processors chain in sequence
//! (`decoder -> normalizer`) and then fan the normalized stream out to two
//! independent branches (`oee`, `faults`), per §4's "parallel branches for
//! OEE rolling calculation and fault-event state machine" — expressed as
//! two separate entries in the same `ProcessorSet`, both fed from the
//! normalizer's output channel.

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod factory;
pub mod fault;
pub mod normalizer;
pub mod oee;

pub use config::{EncoderConfig, EncoderDataType, EncoderMetricConfig, FaultsConfig, NormalizerConfig, OeeConfig};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use factory::OeeProcessorFactory;
pub use fault::FaultStateMachine;
pub use normalizer::Normalizer;
pub use oee::{counter_delta, OeeCalculator};
