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

//! PLC Drivers (C1): polls or subscribes to PLC tag values and emits
//! [`oee_domain::Sample`]s into the pipeline.
//!
//! Protocol coverage is expressed as a closed [`transport::PlcTransport`]
//! capability set, per the redesign note asking for a `PLCDriver` trait
//! rather than one receiver type per vendor. Only [`transport::SimulatedTransport`]
//! is fully wired; OPC-UA, Allen-Bradley, and Siemens are represented by
//! [`transport::UnwiredTransport`], which fails loudly at `open` rather than
//! silently falling back to simulated data.

pub mod backoff;
pub mod config;
pub mod error;
pub mod factory;
pub mod plc_receiver;
pub mod transport;

pub use backoff::ReconnectBackoff;
pub use config::{PlcEndpointConfig, PlcKind, SecurityConfig};
pub use error::PlcError;
pub use factory::PlcReceiverFactory;
pub use plc_receiver::{PlcReceiver, SamplingHandle, MAX_SAMPLING_MS, MIN_SAMPLING_MS};
pub use transport::{PlcTransport, SimulatedTransport, UnwiredTransport};
