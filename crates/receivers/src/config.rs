//! PLC endpoint configuration, per §6's `plc[*].{type,endpoint,tags,sampling_ms,security}`.

use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_sampling_ms() -> u64 {
    1_000
}

/// The supported PLC protocol families, per §2/§9
/// ("drivers are variants (`OPCUA`, `AllenBradley`, `Siemens`)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlcKind {
    /// OPC-UA, subscription or polling style.
    OpcUa,
    /// Allen-Bradley CIP (EtherNet/IP).
    AllenBradley,
    /// Siemens S7 (S7comm).
    Siemens,
    /// A deterministic in-process driver for development and tests.
    Simulated,
}

/// Authentication/transport security for a PLC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SecurityConfig {
    /// Username, if the endpoint requires authentication.
    pub username: Option<String>,
    /// Password, if the endpoint requires authentication.
    pub password: Option<String>,
    /// Path to a CA bundle, if the endpoint requires TLS.
    pub ca: Option<String>,
}

/// One configured PLC endpoint, per §6.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PlcEndpointConfig {
    /// Which protocol driver to instantiate.
    pub kind: PlcKind,
    /// The endpoint address (connection string, host:port, or similar).
    #[validate(length(min = 1))]
    pub endpoint: String,
    /// The source addresses to poll or subscribe to.
    pub tags: Vec<String>,
    /// Base sampling interval, milliseconds. The Backpressure Controller
    /// may widen this (250ms-2000ms) at runtime, per §4.1/§4.5.
    #[serde(default = "default_sampling_ms")]
    pub sampling_ms: u64,
    /// Authentication/transport security, if required.
    pub security: Option<SecurityConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sampling_interval_is_one_second() {
        let config = PlcEndpointConfig {
            kind: PlcKind::Simulated,
            endpoint: "sim://line1".into(),
            tags: vec!["ns=2;s=Good".into()],
            sampling_ms: default_sampling_ms(),
            security: None,
        };
        assert_eq!(config.sampling_ms, 1_000);
    }
}
