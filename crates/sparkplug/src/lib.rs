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

//! Sparkplug B payload encode/decode, topic parsing, and the central-side
//! alias cache (C2 and C6).
//!
//! Frame bytes are [`payload::Payload`]/[`payload::Metric`], hand-derived to
//! match the Eclipse Tahu `sparkplug_b.proto` schema field-for-field so this
//! crate interoperates with any conformant Sparkplug B implementation.
//! [`codec::encode_birth`]/[`codec::encode_data`]/[`codec::decode`] bridge
//! between these wire types and [`oee_domain::Sample`]; [`cache::AliasCache`]
//! is the TTL-bounded registry of per-node decode state the Decoder (C6)
//! owns.

mod cache;
mod codec;
mod error;
mod payload;
mod topic;

pub use cache::{AliasCache, DEFAULT_TTL};
pub use codec::{decode, encode_birth, encode_data};
pub use error::SparkplugError;
pub use payload::{
    DataType, Metric, Payload, ACK_FAULT_METRIC_NAME, ASSET_REF_METRIC_NAME, BD_SEQ_METRIC_NAME, FAULT_CODE_METRIC_NAME, RESOLVE_FAULT_METRIC_NAME,
};
pub use topic::{MessageType, Topic, TopicError};
