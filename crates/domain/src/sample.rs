//! Raw samples produced by PLC Drivers and consumed by the Sparkplug Codec.

use serde::{Deserialize, Serialize};

use crate::quality::Quality;

/// A scalar value reported by a PLC driver for a bound tag, per §3.
///
/// Timestamps are monotonically non-decreasing per tag on the fast path;
/// out-of-order samples are tagged via [`Sample::out_of_order`] and routed,
/// never silently reordered into the in-memory series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// The source address this sample was read from (resolved against a
    /// [`crate::TagBinding`] downstream by the Normalizer).
    pub source_address: String,
    /// The numeric value. Booleans and counters are represented as `f64`;
    /// callers preserve precision up to 2^53.
    pub value: f64,
    /// Quality code reported by the driver.
    pub quality: Quality,
    /// Set by the Decoder when a sample arrives with a timestamp earlier
    /// than the last one seen for this tag; never cleared downstream.
    #[serde(default)]
    pub out_of_order: bool,
}

impl Sample {
    /// Creates a new, in-order sample.
    pub fn new(timestamp_ms: i64, source_address: impl Into<String>, value: f64, quality: Quality) -> Self {
        Self {
            timestamp_ms,
            source_address: source_address.into(),
            value,
            quality,
            out_of_order: false,
        }
    }

    /// A BAD-quality sample for a source address that failed to read. Per
    /// §4.1, drivers MUST emit this instead of dropping the reading so
    /// downstream state machines can observe the loss.
    pub fn bad(timestamp_ms: i64, source_address: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            source_address: source_address.into(),
            value: 0.0,
            quality: Quality::BAD,
            out_of_order: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_sample_carries_bad_quality_not_a_drop() {
        let sample = Sample::bad(1_000, "ns=2;s=Good");
        assert_eq!(sample.quality, Quality::BAD);
        assert_eq!(sample.source_address, "ns=2;s=Good");
    }
}
