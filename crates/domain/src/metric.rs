//! Canonical, normalized metrics — the Normalizer's (C7) output domain.

use serde::{Deserialize, Serialize};

use crate::{quality::Quality, signal_type::SignalType, tag::AssetRef};

/// A Sample projected into canonical units and tagged with its asset and
/// signal type, per §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetric {
    /// The asset this metric belongs to.
    pub asset_ref: AssetRef,
    /// The canonical signal type.
    pub signal_type: SignalType,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Value in canonical units (SI where applicable).
    pub value: f64,
    /// Quality carried through from the source Sample.
    pub quality: Quality,
    /// The canonical unit name, e.g. `"celsius"`.
    pub unit: String,
    /// The original raw value, preserved only when audit requires it
    /// (§3: "preserved in a side-band field only when required").
    #[serde(default)]
    pub raw_value: Option<f64>,
    /// For `fault.code`/`fault.active` signals, the fault code this metric
    /// reports (e.g. `"E17"`); `value` alone only carries the boolean
    /// active/inactive state. Unused for other signal types.
    #[serde(default)]
    pub label: Option<String>,
    /// Deduplication key components are derived from
    /// (`asset_ref`, `signal_type`, `timestamp_ms`) plus the Sink Writer's
    /// `monotonic_seq`; this field carries that `monotonic_seq` once the
    /// metric has been assigned one, per §4.10.
    #[serde(default)]
    pub monotonic_seq: Option<u64>,
}

impl NormalizedMetric {
    /// Re-applying the Normalizer to an already-normalized metric must be a
    /// no-op (§4.7: "All steps are idempotent"); this constructor is used by
    /// both the Normalizer and synthetic emitters (OEE rollups, backpressure
    /// state changes) that already produce canonical output.
    pub fn new(
        asset_ref: AssetRef,
        signal_type: SignalType,
        timestamp_ms: i64,
        value: f64,
        quality: Quality,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            asset_ref,
            signal_type,
            timestamp_ms,
            value,
            quality,
            unit: unit.into(),
            raw_value: None,
            label: None,
            monotonic_seq: None,
        }
    }

    /// Attaches a label (used for fault codes). Consumed builder-style.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_leaves_audit_fields_unset() {
        let metric = NormalizedMetric::new(
            AssetRef::new("M1"),
            SignalType::CounterGood,
            0,
            100.0,
            Quality::GOOD,
            "count",
        );
        assert!(metric.raw_value.is_none());
        assert!(metric.monotonic_seq.is_none());
    }
}
