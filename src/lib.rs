#![deny(
    trivial_numeric_casts,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    unused_results,
    variant_size_differences
)]
#![warn(rust_2021_compatibility, unreachable_pub)]

//! Edge-to-cloud telemetry pipeline core for manufacturing OEE analytics.
//!
//! This crate re-exports the generic pipeline runtime (**receiver**,
//! **processor**, **exporter**, **engine**, **config**) together with the
//! domain crates that specialize it for this system: PLC ingestion
//! (`oee-receivers`), Sparkplug B encode/decode (`oee-sparkplug`), an MQTT
//! session (`oee-mqtt`), an edge store-and-forward buffer with backpressure
//! control (`oee-buffer`), stream processing (`oee-processors`: decode,
//! normalize, compute OEE, track faults) and a cloud sink (`oee-exporters`).
//!
//! A pipeline is built from a YAML configuration file resolved against
//! receiver/processor/exporter factories, exactly as the generic `config`
//! and `engine` crates already support. The two binaries in `apps/` (edge
//! and central) each wire a different factory set onto the same engine.

pub use config;
pub use context;
pub use engine;
pub use exporter;
pub use oee_buffer;
pub use oee_domain;
pub use oee_exporters;
pub use oee_mqtt;
pub use oee_observability;
pub use oee_processors;
pub use oee_receivers;
pub use oee_sparkplug;
pub use processor;
pub use receiver;
pub use signal;
pub use task;
