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

//! Edge store-and-forward buffer (C4) and backpressure controller (C5).
//!
//! [`Buffer`] is the bounded, durable FIFO queue of [`oee_domain::OutboundEnvelope`]s
//! awaiting publish, backed by [`DurableLog`]'s append-only file plus fsync'd
//! ack pointer. [`BackpressureController`] watches [`Buffer::fill_ratio`]
//! and derives the sampling/deadband/suppression regime the rest of the
//! edge pipeline reacts to.

mod backpressure;
mod buffer;
mod error;
mod log;

pub use backpressure::{BackpressureController, BackpressureState, DEFAULT_HYSTERESIS_MS};
pub use buffer::{Buffer, DEFAULT_MAX_BYTES, DEFAULT_MAX_COUNT};
pub use error::BufferError;
pub use log::DurableLog;
