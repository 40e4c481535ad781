//! The Backpressure Controller (C5), per §4.5.

use oee_domain::{AssetRef, NormalizedMetric, Quality, SignalType};

/// The three fill-ratio regimes of the control law, per §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackpressureState {
    /// `f < 0.5`: configured sampling interval, no deadband adjustment.
    Nominal,
    /// `0.5 <= f < 0.85`: sampling interval x2, deadband thresholds raised.
    Degraded,
    /// `f >= 0.85`: sampling interval x8, low-priority signals suppressed.
    Critical,
}

impl BackpressureState {
    fn from_fill_ratio(f: f64) -> Self {
        if f >= 0.85 {
            BackpressureState::Critical
        } else if f >= 0.5 {
            BackpressureState::Degraded
        } else {
            BackpressureState::Nominal
        }
    }

    /// The sampling-interval multiplier for this state, per §4.5.
    pub fn sampling_multiplier(self) -> u32 {
        match self {
            BackpressureState::Nominal => 1,
            BackpressureState::Degraded => 2,
            BackpressureState::Critical => 8,
        }
    }

    /// Whether low-priority signal types (temperature, vibration) should be
    /// suppressed while state/fault/counter signals are retained, per
    /// §4.5.
    pub fn suppresses_low_priority(self) -> bool {
        matches!(self, BackpressureState::Critical)
    }

    /// The signal type name used for the synthetic metric this state
    /// transition emits, per §4.5.
    pub fn as_signal_value(self) -> f64 {
        match self {
            BackpressureState::Nominal => 0.0,
            BackpressureState::Degraded => 1.0,
            BackpressureState::Critical => 2.0,
        }
    }
}

/// Default hysteresis: a fill-ratio regime must hold for this long before
/// the controller commits to the transition, per §4.5.
pub const DEFAULT_HYSTERESIS_MS: i64 = 5_000;

/// Tracks the buffer fill ratio and derives the current [`BackpressureState`],
/// applying hysteresis so the state does not flap across regime boundaries.
pub struct BackpressureController {
    asset_ref: AssetRef,
    hysteresis_ms: i64,
    committed: BackpressureState,
    candidate: Option<(BackpressureState, i64)>,
}

impl BackpressureController {
    /// Creates a controller starting in the nominal state.
    pub fn new(asset_ref: AssetRef, hysteresis_ms: i64) -> Self {
        Self {
            asset_ref,
            hysteresis_ms,
            committed: BackpressureState::Nominal,
            candidate: None,
        }
    }

    /// Current committed state.
    pub fn state(&self) -> BackpressureState {
        self.committed
    }

    /// Observes a new fill ratio at time `now_ms`. Returns `Some(metric)`
    /// carrying a `state.backpressure` Normalized Metric if the committed
    /// state just changed, per §4.5 ("state change events are themselves
    /// logged as Normalized Metrics of kind `state.backpressure`").
    pub fn observe(&mut self, fill_ratio: f64, now_ms: i64) -> Option<NormalizedMetric> {
        let observed = BackpressureState::from_fill_ratio(fill_ratio);

        if observed == self.committed {
            self.candidate = None;
            return None;
        }

        match self.candidate {
            Some((candidate_state, since_ms)) if candidate_state == observed => {
                if now_ms - since_ms >= self.hysteresis_ms {
                    self.committed = observed;
                    self.candidate = None;
                    return Some(NormalizedMetric::new(
                        self.asset_ref.clone(),
                        SignalType::StateBackpressure,
                        now_ms,
                        observed.as_signal_value(),
                        Quality::GOOD,
                        "enum",
                    ));
                }
            }
            _ => {
                self.candidate = Some((observed, now_ms));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> BackpressureController {
        BackpressureController::new(AssetRef::new("M1"), DEFAULT_HYSTERESIS_MS)
    }

    #[test]
    fn brief_spike_below_hysteresis_does_not_commit() {
        let mut ctl = controller();
        assert!(ctl.observe(0.9, 0).is_none());
        assert!(ctl.observe(0.3, 1_000).is_none());
        assert_eq!(ctl.state(), BackpressureState::Nominal);
    }

    #[test]
    fn sustained_regime_commits_after_hysteresis() {
        let mut ctl = controller();
        assert!(ctl.observe(0.9, 0).is_none());
        let metric = ctl.observe(0.9, 5_000).expect("commits at hysteresis boundary");
        assert_eq!(metric.signal_type, SignalType::StateBackpressure);
        assert_eq!(ctl.state(), BackpressureState::Critical);
    }

    #[test]
    fn degraded_regime_uses_2x_multiplier() {
        assert_eq!(BackpressureState::from_fill_ratio(0.6).sampling_multiplier(), 2);
    }

    #[test]
    fn critical_regime_suppresses_low_priority_signals() {
        assert!(BackpressureState::from_fill_ratio(0.9).suppresses_low_priority());
        assert!(!BackpressureState::from_fill_ratio(0.6).suppresses_low_priority());
    }
}
