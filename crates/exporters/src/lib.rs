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

//! Sink Writer (C10): the final pipeline stage, batching Normalized
//! Metrics, Fault events, and OEE rollups into the downstream time-series
//! and event stores.

pub mod backoff;
pub mod config;
pub mod error;
pub mod factory;
pub mod record;
pub mod sink_writer;
pub mod transport;

pub use backoff::RetryBackoff;
pub use config::SinkConfig;
pub use error::SinkError;
pub use factory::SinkWriterFactory;
pub use record::{DedupKey, SinkRecord};
pub use sink_writer::{SinkBackpressureHandle, SinkWriter};
pub use transport::{HttpSinkTransport, RecordingTransport, SinkTransport};
