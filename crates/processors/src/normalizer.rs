//! Normalizer (C7), per §4.7.
//!
//! Projects raw [`Sample`]s into the canonical [`NormalizedMetric`] domain
//! through five steps, each skippable only via explicit configuration:
//! lookup, quality gate, unit conversion, deadband, stamp. All steps are
//! idempotent.

use std::collections::HashMap;

use async_trait::async_trait;
use oee_domain::{AssetRef, NormalizedMetric, PipelineMessage, Quality, SignalType, TagBinding};
use processor::{effect::EffectHandler, AsyncProcessor, Error};
use signal::Signal;

/// Normalizes raw Samples against a configured set of Tag Bindings.
pub struct Normalizer {
    name: String,
    bindings: HashMap<String, TagBinding>,
    last_emitted: HashMap<(AssetRef, SignalType), f64>,
}

impl Normalizer {
    /// Creates a normalizer from the configured bindings, keyed by source
    /// address for O(1) lookup.
    pub fn new(name: impl Into<String>, bindings: Vec<TagBinding>) -> Self {
        let bindings = bindings.into_iter().map(|b| (b.source_address.clone(), b)).collect();
        Self {
            name: name.into(),
            bindings,
            last_emitted: HashMap::new(),
        }
    }

    fn normalize(&mut self, sample: &oee_domain::Sample) -> Option<NormalizedMetric> {
        // Step 1: lookup.
        let binding = match self.bindings.get(&sample.source_address) {
            Some(binding) => binding,
            None => {
                tracing::debug!(normalizer = %self.name, source = %sample.source_address, reason = "no_mapping", "sample dropped");
                return None;
            }
        };

        // Step 2: quality gate.
        if !sample.quality.is_at_least(binding.min_quality) {
            tracing::debug!(normalizer = %self.name, source = %sample.source_address, reason = "low_quality", "sample dropped");
            return None;
        }

        // Step 3: unit conversion.
        let value = sample.value * binding.unit_scale + binding.unit_offset;

        // Step 4: deadband (state/counter/fault signals bypass it).
        let key = (binding.asset_ref.clone(), binding.signal_type);
        if !binding.signal_type.bypasses_deadband() {
            if let Some(&last) = self.last_emitted.get(&key) {
                let abs_delta = (value - last).abs();
                let within_absolute = binding.deadband_abs > 0.0 && abs_delta < binding.deadband_abs;
                let within_percent = binding.deadband_pct > 0.0 && last != 0.0 && (abs_delta / last.abs()) < binding.deadband_pct;
                if within_absolute || within_percent {
                    tracing::debug!(normalizer = %self.name, source = %sample.source_address, reason = "deadband", "sample suppressed");
                    return None;
                }
            }
        }
        self.last_emitted.insert(key, value);

        // Step 5: stamp.
        let mut metric = NormalizedMetric::new(
            binding.asset_ref.clone(),
            binding.signal_type,
            sample.timestamp_ms,
            value,
            sample.quality,
            binding.unit.clone(),
        );
        if binding.unit_scale != 1.0 || binding.unit_offset != 0.0 {
            metric.raw_value = Some(sample.value);
        }
        if let Some(code) = &binding.fault_code {
            metric.label = Some(code.clone());
        }
        Some(metric)
    }
}

#[async_trait]
impl AsyncProcessor<PipelineMessage> for Normalizer {
    async fn process(&mut self, signal: Signal<PipelineMessage>, effects_handler: &mut EffectHandler<PipelineMessage>) -> Result<(), Error> {
        match signal {
            Signal::Messages { messages } => {
                let mut out = Vec::with_capacity(messages.len());
                for message in messages {
                    match message {
                        PipelineMessage::Sample(sample) => {
                            if let Some(metric) = self.normalize(&sample) {
                                out.push(PipelineMessage::Metric(metric));
                            }
                        }
                        other => out.push(other),
                    }
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
