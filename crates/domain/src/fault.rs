//! Fault records and the severity taxonomy, per §3 and §4.9.

use serde::{Deserialize, Serialize};

use crate::tag::AssetRef;

/// Lifecycle state of a [`FaultRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultState {
    /// Open and unacknowledged.
    Active,
    /// Open and acknowledged by an operator.
    Acknowledged,
    /// Closed.
    Resolved,
    /// Folded into another, older fault on the same asset.
    Merged,
}

/// Severity taxonomy derived from a configured mapping of fault code, per
/// §4.9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultSeverity {
    /// Informational only.
    Info,
    /// Low severity.
    Low,
    /// Medium severity.
    Medium,
    /// High severity.
    High,
    /// Requires immediate attention.
    Critical,
}

/// A fault lifecycle record, per §3.
///
/// Invariant: at most one `Active` record exists per (`asset_ref`, `code`) —
/// enforced by the Fault State Machine (C9), not by this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultRecord {
    /// Opaque identifier assigned when the fault is opened.
    pub fault_id: u64,
    /// The asset this fault applies to.
    pub asset_ref: AssetRef,
    /// The fault code as reported by the PLC/Sparkplug source.
    pub code: String,
    /// Severity derived from the configured code→severity mapping.
    pub severity: FaultSeverity,
    /// Current lifecycle state.
    pub state: FaultState,
    /// When the fault was first opened (milliseconds since epoch).
    pub opened_at_ms: i64,
    /// When the fault was resolved, if it has been.
    pub closed_at_ms: Option<i64>,
    /// If this fault was merged into another, the id of that fault.
    pub merged_into: Option<u64>,
}

impl FaultRecord {
    /// Opens a new Active fault.
    pub fn open(fault_id: u64, asset_ref: AssetRef, code: impl Into<String>, severity: FaultSeverity, opened_at_ms: i64) -> Self {
        Self {
            fault_id,
            asset_ref,
            code: code.into(),
            severity,
            state: FaultState::Active,
            opened_at_ms,
            closed_at_ms: None,
            merged_into: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_places_critical_highest() {
        assert!(FaultSeverity::Critical > FaultSeverity::High);
        assert!(FaultSeverity::High > FaultSeverity::Medium);
        assert!(FaultSeverity::Low > FaultSeverity::Info);
    }

    #[test]
    fn open_starts_active_with_no_close_time() {
        let fault = FaultRecord::open(1, AssetRef::new("M1"), "E17", FaultSeverity::High, 0);
        assert_eq!(fault.state, FaultState::Active);
        assert!(fault.closed_at_ms.is_none());
    }
}
