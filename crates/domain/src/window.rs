//! Rolling, time-bounded windows of Normalized Metrics, per §3 and §4.8.

use std::collections::VecDeque;

use crate::metric::NormalizedMetric;

/// A bounded, time-ordered deque of Normalized Metrics for one machine.
///
/// The memory bound is enforced by evicting the tail *by time*, not by
/// count — see §3: "Memory bound is enforced by evicting the tail by time,
/// not count."
#[derive(Debug, Clone)]
pub struct RollingWindow {
    horizon_ms: i64,
    metrics: VecDeque<NormalizedMetric>,
}

impl RollingWindow {
    /// Creates an empty window over the given horizon (default 60 min per
    /// §3, but callers configure this per the `oee.window_ms` key).
    pub fn new(horizon_ms: i64) -> Self {
        Self {
            horizon_ms,
            metrics: VecDeque::new(),
        }
    }

    /// Pushes a metric and evicts anything older than `now - horizon_ms`.
    ///
    /// A metric with `timestamp_ms` exactly at `now - horizon_ms` is inside
    /// the window; `now - horizon_ms - 1` is outside (§8 "Window edges").
    pub fn push(&mut self, metric: NormalizedMetric, now_ms: i64) {
        self.metrics.push_back(metric);
        self.evict(now_ms);
    }

    /// Drops entries older than the horizon without inserting a new one —
    /// used by the window tick so eviction also happens when no new metric
    /// arrived in this tick.
    pub fn evict(&mut self, now_ms: i64) {
        let cutoff = now_ms - self.horizon_ms;
        while let Some(front) = self.metrics.front() {
            if front.timestamp_ms < cutoff {
                let _ = self.metrics.pop_front();
            } else {
                break;
            }
        }
    }

    /// Iterates the metrics currently retained in the window, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &NormalizedMetric> {
        self.metrics.iter()
    }

    /// Returns the most recent metric matching `predicate`, if any — used to
    /// read the "latest `state.*`"/"latest `counter.total`" style values the
    /// OEE Calculator's formulas reference.
    pub fn latest_matching(&self, mut predicate: impl FnMut(&NormalizedMetric) -> bool) -> Option<&NormalizedMetric> {
        self.metrics.iter().rev().find(|m| predicate(m))
    }

    /// Number of metrics currently retained.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether the window is currently empty.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{quality::Quality, signal_type::SignalType, tag::AssetRef};

    fn metric(ts: i64) -> NormalizedMetric {
        NormalizedMetric::new(AssetRef::new("M1"), SignalType::CounterGood, ts, 1.0, Quality::GOOD, "count")
    }

    #[test]
    fn metric_exactly_at_horizon_is_retained() {
        let mut window = RollingWindow::new(60_000);
        window.push(metric(0), 60_000);
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn metric_one_ms_past_horizon_is_evicted() {
        let mut window = RollingWindow::new(60_000);
        window.push(metric(0), 60_001);
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn evict_without_push_still_trims_tail() {
        let mut window = RollingWindow::new(1_000);
        window.push(metric(0), 0);
        window.push(metric(500), 500);
        window.evict(2_000);
        assert_eq!(window.len(), 0);
    }
}
