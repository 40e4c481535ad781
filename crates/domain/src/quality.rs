//! Sample quality codes.

use serde::{Deserialize, Serialize};

/// Quality byte attached to every [`crate::Sample`] and
/// [`crate::NormalizedMetric`].
///
/// The three named levels (`GOOD`, `UNCERTAIN`, `BAD`) are the only values
/// produced by this pipeline; the newtype still exposes the raw byte since
/// some PLC protocols (OPC-UA in particular) report finer-grained status
/// codes that round down to one of these three buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(pub u8);

impl Quality {
    /// Value is valid and fresh.
    pub const GOOD: Quality = Quality(192);
    /// Value is valid but derived from stale or interpolated data.
    pub const UNCERTAIN: Quality = Quality(64);
    /// Value is not to be trusted (driver error, disconnected tag, etc).
    pub const BAD: Quality = Quality(0);

    /// Returns whether this quality is at least as good as `min`.
    pub fn is_at_least(self, min: Quality) -> bool {
        self.0 >= min.0
    }

    /// Default minimum quality accepted by the Normalizer, per §4.7.
    pub fn default_min() -> Self {
        Quality::GOOD
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality::BAD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_semantic_ranking() {
        assert!(Quality::GOOD > Quality::UNCERTAIN);
        assert!(Quality::UNCERTAIN > Quality::BAD);
    }

    #[test]
    fn is_at_least_respects_threshold() {
        assert!(Quality::GOOD.is_at_least(Quality::GOOD));
        assert!(!Quality::UNCERTAIN.is_at_least(Quality::GOOD));
        assert!(Quality(200).is_at_least(Quality::GOOD));
    }
}
