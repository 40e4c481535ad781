//! Tag Bindings and asset references.

use serde::{Deserialize, Serialize};

use crate::signal_type::SignalType;

/// Identifies the site/line/machine a tag belongs to.
///
/// Created at config load, immutable at runtime, destroyed only by a config
/// reload — see §3.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRef(pub String);

impl AssetRef {
    /// Creates a new asset reference.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A source-to-canonical mapping: triple (`source_address`, `signal_type`,
/// `asset_ref`), per §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagBinding {
    /// The PLC/Sparkplug-side address this binding resolves (an OPC-UA node
    /// id, a CIP tag path, an S7 DB offset, or a Sparkplug metric name).
    pub source_address: String,
    /// The canonical signal type this address is mapped to.
    pub signal_type: SignalType,
    /// The asset this tag belongs to.
    pub asset_ref: AssetRef,
    /// `canonical = raw * unit_scale + unit_offset`.
    #[serde(default = "default_scale")]
    pub unit_scale: f64,
    /// See [`TagBinding::unit_scale`].
    #[serde(default)]
    pub unit_offset: f64,
    /// The canonical unit name carried on the resulting Normalized Metric
    /// (e.g. `"celsius"`, `"count"`, `"bool"`).
    #[serde(default)]
    pub unit: String,
    /// Minimum quality accepted before the Normalizer drops the sample.
    #[serde(default = "crate::quality::Quality::default_min")]
    pub min_quality: crate::quality::Quality,
    /// Absolute deadband threshold, in canonical units.
    #[serde(default)]
    pub deadband_abs: f64,
    /// Percent deadband threshold (fraction, e.g. `0.01` for 1%).
    #[serde(default)]
    pub deadband_pct: f64,
    /// For `fault.code`/`fault.active` bindings, the fault code this address
    /// reports (e.g. `"E17"`). Carried onto the Normalized Metric's
    /// [`crate::metric::NormalizedMetric::label`] since the metric's `value`
    /// is numeric. Unused for other signal types.
    #[serde(default)]
    pub fault_code: Option<String>,
}

fn default_scale() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_scale_offset_is_default() {
        let binding = TagBinding {
            source_address: "ns=2;s=Good".into(),
            signal_type: SignalType::CounterGood,
            asset_ref: AssetRef::new("M1"),
            unit_scale: default_scale(),
            unit_offset: 0.0,
            unit: "count".into(),
            min_quality: crate::quality::Quality::default_min(),
            deadband_abs: 0.0,
            deadband_pct: 0.0,
            fault_code: None,
        };
        assert_eq!(binding.unit_scale, 1.0);
        assert_eq!(binding.unit_offset, 0.0);
    }
}
