//! Fault State Machine (C9), per §4.9.
//!
//! Tracks one [`FaultRecord`] lifecycle per `(asset_ref, code)`, driven by
//! `fault.active` Normalized Metrics and `AcknowledgeFault`/`ResolveFault`
//! control commands. At most one `ACTIVE` record exists per key at any time
//! (§3's invariant; enforced here, not by the record type itself).

use std::collections::HashMap;

use async_trait::async_trait;
use oee_domain::{AssetRef, ControlCommand, FaultEvent, FaultRecord, FaultSeverity, FaultState, PipelineMessage, SignalType};
use processor::{effect::EffectHandler, AsyncProcessor, Error};
use signal::Signal;

use crate::config::FaultsConfig;

/// Maintains fault lifecycles for all assets and emits a [`FaultEvent`] on
/// every state transition.
pub struct FaultStateMachine {
    name: String,
    config: FaultsConfig,
    next_fault_id: u64,
    /// All records ever opened, keyed by `(asset_ref, code)`. Resolved/merged
    /// records are retained so a repeat `fault.active=true` after resolution
    /// opens a fresh record rather than resurrecting the old one.
    records: HashMap<(AssetRef, String), FaultRecord>,
}

impl FaultStateMachine {
    /// Creates a fault state machine with the given configuration.
    pub fn new(name: impl Into<String>, config: FaultsConfig) -> Self {
        Self {
            name: name.into(),
            config,
            next_fault_id: 1,
            records: HashMap::new(),
        }
    }

    fn severity_for(&self, code: &str) -> FaultSeverity {
        self.config.severity_map.get(code).copied().unwrap_or(FaultSeverity::Info)
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_fault_id;
        self.next_fault_id += 1;
        id
    }

    fn is_open(record: &FaultRecord) -> bool {
        matches!(record.state, FaultState::Active | FaultState::Acknowledged)
    }

    /// Opens, dedups, or merges an incoming `fault.active=true` signal.
    fn on_active(&mut self, asset_ref: &AssetRef, code: &str, now_ms: i64, out: &mut Vec<PipelineMessage>) {
        let key = (asset_ref.clone(), code.to_string());
        if let Some(existing) = self.records.get(&key) {
            if Self::is_open(existing) && now_ms - existing.opened_at_ms < self.config.dedup_window_ms {
                tracing::debug!(fault_sm = %self.name, asset = %asset_ref, code, "duplicate fault.active ignored");
                return;
            }
        }

        // Check for a merge target: an open fault on the same asset whose
        // code this one merges into, opened within merge_window_ms.
        if let Some(older_code) = self.config.merge_relations.get(code).cloned() {
            let older_key = (asset_ref.clone(), older_code);
            if let Some(older) = self.records.get(&older_key) {
                if Self::is_open(older) && now_ms - older.opened_at_ms < self.config.merge_window_ms {
                    let merged_into = older.fault_id;
                    let fault_id = self.allocate_id();
                    let mut record = FaultRecord::open(fault_id, asset_ref.clone(), code, self.severity_for(code), now_ms);
                    record.state = FaultState::Merged;
                    record.merged_into = Some(merged_into);
                    tracing::info!(fault_sm = %self.name, asset = %asset_ref, code, merged_into, "fault merged");
                    out.push(PipelineMessage::Fault(FaultEvent { record: record.clone() }));
                    let _ = self.records.insert(key, record);
                    return;
                }
            }
        }

        let fault_id = self.allocate_id();
        let record = FaultRecord::open(fault_id, asset_ref.clone(), code, self.severity_for(code), now_ms);
        tracing::warn!(fault_sm = %self.name, asset = %asset_ref, code, severity = ?record.severity, "fault opened");
        out.push(PipelineMessage::Fault(FaultEvent { record: record.clone() }));
        let _ = self.records.insert(key, record);
    }

    fn resolve(&mut self, asset_ref: &AssetRef, code: &str, now_ms: i64, out: &mut Vec<PipelineMessage>) {
        let key = (asset_ref.clone(), code.to_string());
        let Some(record) = self.records.get_mut(&key) else {
            tracing::debug!(fault_sm = %self.name, asset = %asset_ref, code, "resolve for unknown fault ignored");
            return;
        };
        if !Self::is_open(record) {
            return;
        }
        record.state = FaultState::Resolved;
        record.closed_at_ms = Some(now_ms);
        let resolved = record.clone();
        out.push(PipelineMessage::Fault(FaultEvent { record: resolved }));

        // Any MERGED fault pointing at this one closes at the same time, per §8 S5.
        let closing_id = self.records.get(&key).map(|r| r.fault_id);
        if let Some(closing_id) = closing_id {
            for other in self.records.values_mut() {
                if other.merged_into == Some(closing_id) && other.closed_at_ms.is_none() {
                    other.closed_at_ms = Some(now_ms);
                    out.push(PipelineMessage::Fault(FaultEvent { record: other.clone() }));
                }
            }
        }
    }

    fn acknowledge(&mut self, asset_ref: &AssetRef, code: &str, out: &mut Vec<PipelineMessage>) {
        let key = (asset_ref.clone(), code.to_string());
        if let Some(record) = self.records.get_mut(&key) {
            if record.state == FaultState::Active {
                record.state = FaultState::Acknowledged;
                out.push(PipelineMessage::Fault(FaultEvent { record: record.clone() }));
            }
        }
    }
}

#[async_trait]
impl AsyncProcessor<PipelineMessage> for FaultStateMachine {
    async fn process(&mut self, signal: Signal<PipelineMessage>, effects_handler: &mut EffectHandler<PipelineMessage>) -> Result<(), Error> {
        match signal {
            Signal::Messages { messages } => {
                let mut out = Vec::with_capacity(messages.len());
                for message in messages {
                    match &message {
                        PipelineMessage::Metric(metric) if metric.signal_type == SignalType::FaultActive => {
                            let Some(code) = metric.label.clone() else {
                                tracing::warn!(fault_sm = %self.name, asset = %metric.asset_ref, "fault.active metric missing code label, dropping");
                                continue;
                            };
                            if metric.value != 0.0 {
                                self.on_active(&metric.asset_ref, &code, metric.timestamp_ms, &mut out);
                            } else {
                                self.resolve(&metric.asset_ref, &code, metric.timestamp_ms, &mut out);
                            }
                        }
                        PipelineMessage::Control(ControlCommand::AcknowledgeFault { asset_ref, code }) => {
                            self.acknowledge(asset_ref, code, &mut out);
                        }
                        PipelineMessage::Control(ControlCommand::ResolveFault { asset_ref, code, timestamp_ms }) => {
                            self.resolve(asset_ref, code, *timestamp_ms, &mut out);
                        }
                        _ => {}
                    }
                    out.push(message);
                }
                effects_handler.emit_messages(out);
                Ok(())
            }
            Signal::TimerTick { .. } => Ok(()),
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
    use super::*;
    fn config_with(severity_map: &[(&str, FaultSeverity)], merge_relations: &[(&str, &str)]) -> FaultsConfig {
        FaultsConfig {
            severity_map: severity_map.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            merge_relations: merge_relations.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            ..FaultsConfig::default()
        }
    }

    #[test]
    fn fresh_active_fault_opens_a_record() {
        let mut fsm = FaultStateMachine::new("f1", FaultsConfig::default());
        let mut out = Vec::new();
        fsm.on_active(&AssetRef::new("M1"), "E17", 0, &mut out);
        assert_eq!(out.len(), 1);
        let PipelineMessage::Fault(event) = &out[0] else { panic!("expected fault event") };
        assert_eq!(event.record.state, FaultState::Active);
    }

    #[test]
    fn repeated_active_within_dedup_window_is_ignored() {
        let mut fsm = FaultStateMachine::new("f1", FaultsConfig::default());
        let mut out = Vec::new();
        fsm.on_active(&AssetRef::new("M1"), "E17", 0, &mut out);
        fsm.on_active(&AssetRef::new("M1"), "E17", 2 * 60_000, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn younger_fault_merges_into_related_older_fault_within_merge_window() {
        let config = config_with(&[], &[("E18", "E17")]);
        let mut fsm = FaultStateMachine::new("f1", config);
        let mut out = Vec::new();
        fsm.on_active(&AssetRef::new("M1"), "E17", 0, &mut out);
        fsm.on_active(&AssetRef::new("M1"), "E18", 30_000, &mut out);
        assert_eq!(out.len(), 2);
        let PipelineMessage::Fault(event) = &out[1] else { panic!("expected fault event") };
        assert_eq!(event.record.state, FaultState::Merged);
        assert_eq!(event.record.merged_into, Some(1));
    }

    #[test]
    fn resolving_the_older_fault_also_closes_the_merged_one() {
        let config = config_with(&[], &[("E18", "E17")]);
        let mut fsm = FaultStateMachine::new("f1", config);
        let mut out = Vec::new();
        fsm.on_active(&AssetRef::new("M1"), "E17", 0, &mut out);
        fsm.on_active(&AssetRef::new("M1"), "E18", 30_000, &mut out);
        out.clear();
        fsm.resolve(&AssetRef::new("M1"), "E17", 600_000, &mut out);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|m| matches!(m, PipelineMessage::Fault(event) if event.record.closed_at_ms == Some(600_000))));
    }

    #[test]
    fn acknowledge_transitions_active_to_acknowledged() {
        let mut fsm = FaultStateMachine::new("f1", FaultsConfig::default());
        let mut out = Vec::new();
        fsm.on_active(&AssetRef::new("M1"), "E17", 0, &mut out);
        out.clear();
        fsm.acknowledge(&AssetRef::new("M1"), "E17", &mut out);
        assert_eq!(out.len(), 1);
        let PipelineMessage::Fault(event) = &out[0] else { panic!("expected fault event") };
        assert_eq!(event.record.state, FaultState::Acknowledged);
    }

    #[test]
    fn severity_is_resolved_from_configured_map() {
        let config = config_with(&[("E17", FaultSeverity::Critical)], &[]);
        let mut fsm = FaultStateMachine::new("f1", config);
        let mut out = Vec::new();
        fsm.on_active(&AssetRef::new("M1"), "E17", 0, &mut out);
        let PipelineMessage::Fault(event) = &out[0] else { panic!("expected fault event") };
        assert_eq!(event.record.severity, FaultSeverity::Critical);
    }
}
