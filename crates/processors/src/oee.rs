//! OEE Calculator (C8), per §4.8.
//!
//! Maintains a [`RollingWindow`] of Normalized Metrics per machine and
//! emits an `OeeRollup` on every `tick_ms` timer, per §4.8's formulas:
//!
//! - `Runtime` = Σ(time spent with `state.*` equal to `state.run`) across the window
//! - `PlannedTime` = window minus declared planned-downtime
//! - `Availability` = `Runtime / PlannedTime`
//! - `Performance` = `(IdealCycleTime * TotalCount) / Runtime`, clamped `[0,1]`
//! - `Quality` = `GoodCount / TotalCount` (0 if `TotalCount == 0`)
//! - `OEE` = `Availability * Performance * Quality`

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use oee_domain::{AssetRef, NormalizedMetric, OeeRollup, PipelineMessage, RollingWindow, SignalType};
use processor::{effect::EffectHandler, AsyncProcessor, Error};
use signal::Signal;

use crate::config::OeeConfig;

fn epoch_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}

/// Per-machine state: the rolling window plus the counter values needed to
/// detect rollover across ticks without re-scanning the whole window.
struct MachineState {
    window: RollingWindow,
    last_total: Option<f64>,
    last_good: Option<f64>,
}

/// Computes the counter delta across a tick, treating a decrease larger
/// than `min_decrease` as a rollover at `2^rollover_bits` rather than a
/// negative delta, per §4.8/§9/S6.
pub fn counter_delta(previous: f64, current: f64, rollover_bits: u32, min_decrease: f64) -> f64 {
    let delta = current - previous;
    if delta < 0.0 && (-delta) > min_decrease {
        let modulus = 2f64.powi(rollover_bits as i32);
        current + (modulus - previous)
    } else {
        delta.max(0.0)
    }
}

/// Maintains rolling OEE state per machine and emits rollups on a timer.
pub struct OeeCalculator {
    name: String,
    config: OeeConfig,
    machines: HashMap<AssetRef, MachineState>,
}

impl OeeCalculator {
    /// Creates a calculator with the given configuration.
    pub fn new(name: impl Into<String>, config: OeeConfig) -> Self {
        Self {
            name: name.into(),
            config,
            machines: HashMap::new(),
        }
    }

    fn ingest(&mut self, metric: NormalizedMetric) {
        let now = metric.timestamp_ms;
        let state = self.machines.entry(metric.asset_ref.clone()).or_insert_with(|| MachineState {
            window: RollingWindow::new(self.config.window_ms),
            last_total: None,
            last_good: None,
        });
        state.window.push(metric, now);
    }

    fn tick_one(&self, asset_ref: &AssetRef, state: &MachineState, now_ms: i64) -> OeeRollup {
        let runtime_ms = Self::runtime_ms(state, self.config.window_ms, now_ms);
        let planned_ms = self.config.window_ms; // no declared planned-downtime source wired yet
        let total_count = state
            .window
            .latest_matching(|m| m.signal_type == SignalType::CounterTotal)
            .map(|m| m.value)
            .unwrap_or(0.0);
        let good_count = state
            .window
            .latest_matching(|m| m.signal_type == SignalType::CounterGood)
            .map(|m| m.value)
            .unwrap_or(0.0);
        let ideal_cycle_time = state
            .window
            .latest_matching(|m| m.signal_type == SignalType::CycleTimeIdeal)
            .map(|m| m.value)
            .unwrap_or(0.0);

        let total_delta = match state.last_total {
            Some(last) => counter_delta(last, total_count, self.config.counter_rollover_bits, self.config.min_counter_decrease),
            None => 0.0,
        };
        let good_delta = match state.last_good {
            Some(last) => counter_delta(last, good_count, self.config.counter_rollover_bits, self.config.min_counter_decrease),
            None => 0.0,
        };

        let availability = if planned_ms > 0 {
            (runtime_ms as f64 / planned_ms as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let performance = if runtime_ms > 0 {
            ((ideal_cycle_time * total_delta) / runtime_ms as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let quality = if total_delta > 0.0 { (good_delta / total_delta).clamp(0.0, 1.0) } else { 0.0 };

        OeeRollup {
            asset_ref: asset_ref.clone(),
            timestamp_ms: now_ms,
            availability,
            performance,
            quality,
            oee: availability * performance * quality,
        }
    }

    /// Integrates Σ(time spent in `state.run`) across the window, per
    /// §4.8: walks the retained `state.*` samples oldest-first, attributing
    /// the gap between consecutive samples to whichever state was active at
    /// the start of that gap. The span from the window's start to the first
    /// sample, and from the last sample to `now_ms`, is attributed to that
    /// first/last state too, since a `state.*` sample only fires on
    /// transition, not on every tick.
    fn runtime_ms(state: &MachineState, window_ms: i64, now_ms: i64) -> i64 {
        let mut states: Vec<&NormalizedMetric> = state
            .window
            .iter()
            .filter(|m| matches!(m.signal_type, SignalType::StateRun | SignalType::StateIdle | SignalType::StateDown))
            .collect();
        states.sort_by_key(|m| m.timestamp_ms);
        let Some(first) = states.first() else { return 0 };

        let window_start_ms = now_ms - window_ms;
        let mut runtime_ms = 0i64;
        let mut segment_start_ms = window_start_ms;
        let mut running = first.signal_type == SignalType::StateRun;
        for sample in &states {
            let segment_end_ms = sample.timestamp_ms.clamp(window_start_ms, now_ms);
            if running {
                runtime_ms += (segment_end_ms - segment_start_ms).max(0);
            }
            segment_start_ms = segment_end_ms;
            running = sample.signal_type == SignalType::StateRun;
        }
        if running {
            runtime_ms += (now_ms - segment_start_ms).max(0);
        }
        runtime_ms.clamp(0, window_ms)
    }

    fn tick(&mut self, now_ms: i64, out: &mut Vec<PipelineMessage>) {
        let asset_refs: Vec<AssetRef> = self.machines.keys().cloned().collect();
        for asset_ref in asset_refs {
            let rollup = {
                let state = self.machines.get(&asset_ref).expect("key just read from this map");
                self.tick_one(&asset_ref, state, now_ms)
            };
            let state = self.machines.get_mut(&asset_ref).expect("key just read from this map");
            state.window.evict(now_ms);
            let total_count = state
                .window
                .latest_matching(|m| m.signal_type == SignalType::CounterTotal)
                .map(|m| m.value);
            let good_count = state
                .window
                .latest_matching(|m| m.signal_type == SignalType::CounterGood)
                .map(|m| m.value);
            if let Some(total) = total_count {
                state.last_total = Some(total);
            }
            if let Some(good) = good_count {
                state.last_good = Some(good);
            }
            out.push(PipelineMessage::Rollup(rollup));
        }
    }
}

#[async_trait]
impl AsyncProcessor<PipelineMessage> for OeeCalculator {
    async fn init(&mut self, engine_handler: &mut processor::EngineHandler) -> Result<(), Error> {
        engine_handler.timer(std::time::Duration::from_millis(self.config.tick_ms.max(1) as u64));
        Ok(())
    }

    async fn process(&mut self, signal: Signal<PipelineMessage>, effects_handler: &mut EffectHandler<PipelineMessage>) -> Result<(), Error> {
        match signal {
            Signal::Messages { messages } => {
                let mut out = Vec::with_capacity(messages.len());
                for message in messages {
                    if let PipelineMessage::Metric(metric) = &message {
                        self.ingest(metric.clone());
                    }
                    out.push(message);
                }
                effects_handler.emit_messages(out);
                Ok(())
            }
            Signal::TimerTick { .. } => {
                let now_ms = epoch_ms();
                let mut out = Vec::new();
                self.tick(now_ms, &mut out);
                effects_handler.emit_messages(out);
                Ok(())
            }
            Signal::Stop => Ok(()),
            _ => Err(Error::UnsupportedEvent {
                processor: self.name.clone(),
                signal: signal.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use oee_domain::Quality;

    use super::*;

    fn state_sample(ts: i64, signal_type: SignalType) -> NormalizedMetric {
        NormalizedMetric::new(AssetRef::new("M1"), signal_type, ts, 1.0, Quality::GOOD, "bool")
    }

    fn machine_state(window_ms: i64, samples: &[(i64, SignalType)]) -> MachineState {
        let mut window = RollingWindow::new(window_ms);
        for &(ts, signal_type) in samples {
            window.push(state_sample(ts, signal_type), ts);
        }
        MachineState { window, last_total: None, last_good: None }
    }

    #[test]
    fn runtime_is_zero_with_no_state_samples() {
        let state = machine_state(60_000, &[]);
        assert_eq!(OeeCalculator::runtime_ms(&state, 60_000, 60_000), 0);
    }

    #[test]
    fn a_single_run_sample_counts_from_window_start_to_now() {
        let state = machine_state(60_000, &[(0, SignalType::StateRun)]);
        assert_eq!(OeeCalculator::runtime_ms(&state, 60_000, 60_000), 60_000);
    }

    #[test]
    fn integrates_across_multiple_state_transitions() {
        // run [0, 20_000), idle [20_000, 50_000), run [50_000, 60_000)
        let state = machine_state(
            60_000,
            &[(0, SignalType::StateRun), (20_000, SignalType::StateIdle), (50_000, SignalType::StateRun)],
        );
        assert_eq!(OeeCalculator::runtime_ms(&state, 60_000, 60_000), 20_000 + 10_000);
    }

    #[test]
    fn a_trailing_down_state_contributes_no_runtime() {
        let state = machine_state(60_000, &[(0, SignalType::StateRun), (10_000, SignalType::StateDown)]);
        assert_eq!(OeeCalculator::runtime_ms(&state, 60_000, 60_000), 10_000);
    }

    #[test]
    fn counter_rollover_yields_small_positive_delta() {
        let delta = counter_delta(4_294_967_290.0, 5.0, 32, 1.0);
        assert_eq!(delta, 11.0);
    }

    #[test]
    fn ordinary_increase_is_unaffected() {
        let delta = counter_delta(100.0, 110.0, 32, 1.0);
        assert_eq!(delta, 10.0);
    }

    #[test]
    fn small_decrease_within_min_decrease_is_not_rollover() {
        let delta = counter_delta(100.0, 99.5, 32, 1.0);
        assert_eq!(delta, 0.0);
    }
}
