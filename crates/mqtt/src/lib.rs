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

//! MQTT session management (C3): a single authenticated connection to the
//! broker, honoring Sparkplug B's Last-Will and rebirth-before-data
//! conventions.
//!
//! [`Session`] wraps `rumqttc`'s `AsyncClient`/`EventLoop` split. Callers
//! drive the paired `EventLoop` on whichever runtime they're using (the
//! multi-threaded or thread-per-core engine) and feed each polled
//! [`rumqttc::Event`] back into [`Session::observe_event`] so the session
//! can track when a reconnect requires a fresh NBIRTH.

mod backoff;
mod config;
mod error;
mod factory;
mod publisher;
mod session;
mod subscriber;

pub use config::{MqttConfig, PublisherConfig, SubscriberConfig, TlsConfig};
pub use error::MqttError;
pub use factory::{PublisherFactory, SubscriberFactory};
pub use publisher::Publisher;
pub use session::{Session, DEFAULT_QOS};
pub use subscriber::MqttSubscriber;
