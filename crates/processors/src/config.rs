//! Configuration for the C2, C6-C9 processors, per §6's `encoder.*`,
//! `normalizer.mappings[*]`, `oee.*`, and `faults.*` keys.

use std::collections::HashMap;

use oee_domain::{FaultSeverity, TagBinding};
use oee_sparkplug::DataType;
use serde::{Deserialize, Serialize};

/// One metric the Sparkplug Codec's encoder (C2) declares in its NBIRTH,
/// in the fixed alias order it's listed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderMetricConfig {
    /// The metric name, and the [`oee_domain::Sample::source_address`] this
    /// encoder reads its value from.
    pub name: String,
    /// The Sparkplug wire datatype to declare and encode this metric as.
    pub datatype: EncoderDataType,
}

/// A config-friendly mirror of [`oee_sparkplug::DataType`] (which carries no
/// `serde` impls of its own, since it must stay field-compatible with the
/// Tahu wire schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderDataType {
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// IEEE-754 single precision.
    Float,
    /// IEEE-754 double precision.
    Double,
    /// Boolean.
    Boolean,
    /// UTF-8 string.
    String,
    /// Milliseconds since the Unix epoch.
    DateTime,
}

impl From<EncoderDataType> for DataType {
    fn from(value: EncoderDataType) -> Self {
        match value {
            EncoderDataType::Int8 => DataType::Int8,
            EncoderDataType::Int16 => DataType::Int16,
            EncoderDataType::Int32 => DataType::Int32,
            EncoderDataType::Int64 => DataType::Int64,
            EncoderDataType::UInt8 => DataType::UInt8,
            EncoderDataType::UInt16 => DataType::UInt16,
            EncoderDataType::UInt32 => DataType::UInt32,
            EncoderDataType::UInt64 => DataType::UInt64,
            EncoderDataType::Float => DataType::Float,
            EncoderDataType::Double => DataType::Double,
            EncoderDataType::Boolean => DataType::Boolean,
            EncoderDataType::String => DataType::String,
            EncoderDataType::DateTime => DataType::DateTime,
        }
    }
}

/// The Sparkplug Codec encoder's (C2) identity and declared metric set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// The Sparkplug group id this edge node publishes under.
    #[serde(default)]
    pub group_id: String,
    /// The Sparkplug edge node id.
    #[serde(default)]
    pub node_id: String,
    /// The metrics declared at birth, and subsequently encodable by name,
    /// in alias order.
    #[serde(default)]
    pub metrics: Vec<EncoderMetricConfig>,
}

fn default_window_ms() -> i64 {
    60 * 60 * 1_000
}

fn default_tick_ms() -> i64 {
    60_000
}

fn default_rollover_bits() -> u32 {
    32
}

fn default_min_counter_decrease() -> f64 {
    1.0
}

/// The Normalizer's (C7) tag binding table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// One binding per source address the Normalizer understands.
    #[serde(default)]
    pub mappings: Vec<TagBinding>,
}

/// The OEE Calculator's (C8) window and counter-rollover configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OeeConfig {
    /// Rolling window horizon, milliseconds (default 1h).
    #[serde(default = "default_window_ms")]
    pub window_ms: i64,
    /// How often a rollup is emitted per machine, milliseconds (default 60s).
    #[serde(default = "default_tick_ms")]
    pub tick_ms: i64,
    /// Bit width counters roll over at (default 32, i.e. `2^32`).
    #[serde(default = "default_rollover_bits")]
    pub counter_rollover_bits: u32,
    /// Minimum decrease to classify a counter drop as rollover rather than a
    /// reset, per §4.8/§9.
    #[serde(default = "default_min_counter_decrease")]
    pub min_counter_decrease: f64,
}

impl Default for OeeConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            tick_ms: default_tick_ms(),
            counter_rollover_bits: default_rollover_bits(),
            min_counter_decrease: default_min_counter_decrease(),
        }
    }
}

fn default_dedup_window_ms() -> i64 {
    5 * 60 * 1_000
}

fn default_merge_window_ms() -> i64 {
    60_000
}

/// The Fault State Machine's (C9) dedup/merge windows and severity/relation
/// mappings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultsConfig {
    /// Window within which a repeated `fault.active=true` for the same
    /// (asset, code) is ignored as a duplicate (default 5 min).
    #[serde(default = "default_dedup_window_ms")]
    pub dedup_window_ms: i64,
    /// Window within which two distinct ACTIVE faults on the same asset may
    /// be merged (default 60s).
    #[serde(default = "default_merge_window_ms")]
    pub merge_window_ms: i64,
    /// `code -> severity`. Codes absent from the map default to `Info`.
    #[serde(default)]
    pub severity_map: HashMap<String, FaultSeverity>,
    /// `younger_code -> older_code` merge relation: a fault opened with the
    /// key code merges into an open fault with the value code on the same
    /// asset, within `merge_window_ms`.
    #[serde(default)]
    pub merge_relations: HashMap<String, String>,
}

impl Default for FaultsConfig {
    fn default() -> Self {
        Self {
            dedup_window_ms: default_dedup_window_ms(),
            merge_window_ms: default_merge_window_ms(),
            severity_map: HashMap::new(),
            merge_relations: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oee_config_defaults_match_spec() {
        let config = OeeConfig::default();
        assert_eq!(config.window_ms, 3_600_000);
        assert_eq!(config.tick_ms, 60_000);
        assert_eq!(config.counter_rollover_bits, 32);
    }

    #[test]
    fn faults_config_defaults_match_spec() {
        let config = FaultsConfig::default();
        assert_eq!(config.dedup_window_ms, 300_000);
        assert_eq!(config.merge_window_ms, 60_000);
    }
}
