//! MQTT session configuration, per §6's `mqtt.*` and `sparkplug.*` keys.

use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_keep_alive_secs() -> u64 {
    30
}

fn default_io_deadline_ms() -> u64 {
    30_000
}

/// Mutual-TLS material, present only when TLS is enabled.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TlsConfig {
    /// Path to the CA certificate bundle.
    #[validate(length(min = 1))]
    pub ca: String,
    /// Path to the client certificate, for mutual TLS.
    pub cert: Option<String>,
    /// Path to the client private key, for mutual TLS.
    pub key: Option<String>,
}

/// MQTT session configuration, per §6.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MqttConfig {
    /// Broker hostname.
    #[validate(length(min = 1))]
    pub broker_host: String,
    /// Broker port.
    pub broker_port: u16,
    /// MQTT client id, also used as the edge node's session identity.
    #[validate(length(min = 1))]
    pub client_id: String,
    /// mTLS material; TLS is enabled when present.
    pub tls: Option<TlsConfig>,
    /// Keep-alive interval, seconds.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    /// Deadline applied to every I/O call (connect, publish, subscribe),
    /// milliseconds, per §5 ("every external I/O call has a deadline").
    #[serde(default = "default_io_deadline_ms")]
    pub io_deadline_ms: u64,
}

fn default_max_bytes() -> u64 {
    oee_buffer::DEFAULT_MAX_BYTES
}

fn default_max_count() -> usize {
    oee_buffer::DEFAULT_MAX_COUNT
}

/// The central-side MQTT Subscriber's (C3, subscribe half) configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubscriberConfig {
    /// The broker connection this subscriber maintains.
    #[validate]
    pub mqtt: MqttConfig,
    /// The Sparkplug group id subscribed to, as `spBv1.0/{group_id}/#`.
    #[validate(length(min = 1))]
    pub group_id: String,
}

/// The edge MQTT Publisher's (C3 publish half, combined with the C4
/// Store-and-Forward Buffer) configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PublisherConfig {
    /// The broker connection this publisher maintains.
    #[validate]
    pub mqtt: MqttConfig,
    /// The Sparkplug group id this edge node publishes under.
    #[validate(length(min = 1))]
    pub group_id: String,
    /// The Sparkplug edge node id, used for the NDEATH Last Will topic.
    #[validate(length(min = 1))]
    pub node_id: String,
    /// Directory the store-and-forward buffer's durable log is kept in.
    #[validate(length(min = 1))]
    pub buffer_dir: String,
    /// Store-and-forward byte bound, per §4.4.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Store-and-forward envelope-count bound, per §4.4.
    #[serde(default = "default_max_count")]
    pub max_count: usize,
}
