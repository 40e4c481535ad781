//! Decoder & Alias Cache (C6), per §4.6.
//!
//! Owns one [`AliasCache`] per edge/central process and turns
//! [`RawFrame`]s into decoded [`Sample`]s. Unknown aliases and sequence
//! gaps both trigger a rebirth request and drop the frame rather than
//! queuing it for later, per §4.6.

use async_trait::async_trait;
use oee_domain::{AssetRef, ControlCommand, MetricDescriptor, PipelineMessage, RawFrame};
use oee_sparkplug::{
    AliasCache, MessageType, Payload, Topic, ACK_FAULT_METRIC_NAME, ASSET_REF_METRIC_NAME, BD_SEQ_METRIC_NAME, FAULT_CODE_METRIC_NAME, RESOLVE_FAULT_METRIC_NAME,
};
use processor::{effect::EffectHandler, AsyncProcessor, Error};
use prost::Message as _;
use signal::Signal;

/// Parses an NCMD/DCMD payload's metric set into a [`ControlCommand`], per
/// §6. A command frame carries the triggering metric
/// (`ACK_FAULT_METRIC_NAME`/`RESOLVE_FAULT_METRIC_NAME`) alongside two
/// companion string metrics naming the asset and fault code it applies to;
/// frames missing either are dropped rather than guessed at.
fn control_command_from_payload(payload: &Payload) -> Option<ControlCommand> {
    let string_metric = |wanted: &str| -> Option<String> { payload.metrics.iter().find(|m| m.name.as_deref() == Some(wanted))?.string_value.clone() };
    let asset_ref = string_metric(ASSET_REF_METRIC_NAME).map(AssetRef::new)?;
    let code = string_metric(FAULT_CODE_METRIC_NAME)?;
    if payload.metrics.iter().any(|m| m.name.as_deref() == Some(ACK_FAULT_METRIC_NAME)) {
        return Some(ControlCommand::AcknowledgeFault { asset_ref, code });
    }
    if payload.metrics.iter().any(|m| m.name.as_deref() == Some(RESOLVE_FAULT_METRIC_NAME)) {
        let timestamp_ms = payload.timestamp.unwrap_or(0) as i64;
        return Some(ControlCommand::ResolveFault { asset_ref, code, timestamp_ms });
    }
    None
}

/// Decodes raw Sparkplug frames into pipeline [`oee_domain::Sample`]s,
/// maintaining per-node/device birth/death and alias state.
pub struct Decoder {
    name: String,
    cache: AliasCache,
}

impl Decoder {
    /// Creates a decoder owning a fresh alias cache with the default TTL.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cache: AliasCache::new(oee_sparkplug::DEFAULT_TTL),
        }
    }

    fn decode_frame(&mut self, frame: &RawFrame, out: &mut Vec<PipelineMessage>) {
        let topic = match Topic::parse(&frame.topic) {
            Ok(topic) => topic,
            Err(error) => {
                tracing::warn!(decoder = %self.name, %error, topic = %frame.topic, "malformed sparkplug topic, dropping frame");
                return;
            }
        };
        let payload = match Payload::decode(frame.payload.as_slice()) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(decoder = %self.name, %error, topic = %frame.topic, "malformed sparkplug payload, dropping frame");
                return;
            }
        };

        let node = self.cache.get_or_insert(&topic.group_id, &topic.node_id, frame.received_at_ms);

        match topic.message_type {
            MessageType::NBirth => {
                let mut aliases = std::collections::HashMap::new();
                let mut bd_seq = node.bd_seq;
                for metric in &payload.metrics {
                    let Some(name) = metric.name.clone() else { continue };
                    if name == BD_SEQ_METRIC_NAME {
                        bd_seq = metric.int_value.unwrap_or(0);
                        continue;
                    }
                    if let Some(alias) = metric.alias {
                        let _ = aliases.insert(alias, MetricDescriptor { name, datatype: metric.datatype });
                    }
                }
                let seq = payload.seq.unwrap_or(0) as u8;
                node.on_nbirth(bd_seq, seq, aliases);
                tracing::info!(decoder = %self.name, group = %topic.group_id, node = %topic.node_id, "node birthed");
            }
            MessageType::NDeath => {
                node.on_ndeath();
                tracing::warn!(decoder = %self.name, group = %topic.group_id, node = %topic.node_id, "node death received");
            }
            MessageType::DBirth => {
                let device_id = topic.device_id.clone().unwrap_or_default();
                let device = node.devices.entry(device_id).or_default();
                let mut aliases = std::collections::HashMap::new();
                for metric in &payload.metrics {
                    let (Some(name), Some(alias)) = (metric.name.clone(), metric.alias) else { continue };
                    let _ = aliases.insert(alias, MetricDescriptor { name, datatype: metric.datatype });
                }
                device.alias_table = aliases;
                device.last_seq = Some(payload.seq.unwrap_or(0) as u8);
                device.status = oee_domain::NodeStatus::Birthed;
            }
            MessageType::DDeath => {
                if let Some(device_id) = &topic.device_id {
                    if let Some(device) = node.devices.get_mut(device_id) {
                        device.status = oee_domain::NodeStatus::Lost;
                        device.alias_table.clear();
                    }
                }
            }
            MessageType::NData | MessageType::DData => {
                let device_id = topic.device_id.clone();
                let mut device = device_id.as_ref().and_then(|id| node.devices.remove(id));
                let result = oee_sparkplug::decode(&topic.group_id, &topic.node_id, node, device.as_mut(), &payload);
                if let Some(device_id) = device_id {
                    if let Some(device) = device {
                        let _ = node.devices.insert(device_id, device);
                    }
                }
                match result {
                    Ok(samples) => {
                        out.extend(samples.into_iter().map(PipelineMessage::Sample));
                    }
                    Err(error) => {
                        tracing::warn!(decoder = %self.name, %error, "decode failed, requesting rebirth and dropping frame");
                        if matches!(error, oee_sparkplug::SparkplugError::SequenceGap { .. }) {
                            node.on_ndeath();
                        }
                        out.push(PipelineMessage::Control(ControlCommand::RequestRebirth {
                            group_id: topic.group_id.clone(),
                            node_id: topic.node_id.clone(),
                        }));
                    }
                }
            }
            MessageType::NCmd | MessageType::DCmd => match control_command_from_payload(&payload) {
                Some(command) => out.push(PipelineMessage::Control(command)),
                None => {
                    tracing::debug!(decoder = %self.name, topic = %frame.topic, "command frame carried no recognized device control metric, dropping");
                }
            },
        }
    }
}

#[async_trait]
impl AsyncProcessor<PipelineMessage> for Decoder {
    async fn process(&mut self, signal: Signal<PipelineMessage>, effects_handler: &mut EffectHandler<PipelineMessage>) -> Result<(), Error> {
        match signal {
            Signal::Messages { messages } => {
                let mut decoded = Vec::new();
                for message in messages {
                    match message {
                        PipelineMessage::Raw(frame) => self.decode_frame(&frame, &mut decoded),
                        other => decoded.push(other),
                    }
                }
                effects_handler.emit_messages(decoded);
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
    use oee_sparkplug::{DataType, Metric};
    use prost::Message as _;

    fn nbirth_frame(group: &str, node: &str, seq: u64) -> RawFrame {
        let payload = Payload {
            timestamp: Some(0),
            metrics: vec![
                Metric {
                    name: Some(BD_SEQ_METRIC_NAME.into()),
                    alias: None,
                    timestamp: Some(0),
                    datatype: DataType::UInt64 as u32,
                    is_null: None,
                    int_value: Some(7),
                    double_value: None,
                    string_value: None,
                },
                Metric {
                    name: Some("Good".into()),
                    alias: Some(1),
                    timestamp: Some(0),
                    datatype: DataType::UInt32 as u32,
                    is_null: None,
                    int_value: Some(0),
                    double_value: None,
                    string_value: None,
                },
            ],
            seq: Some(seq),
        };
        RawFrame {
            topic: format!("spBv1.0/{group}/NBIRTH/{node}"),
            payload: payload.encode_to_vec(),
            received_at_ms: 0,
        }
    }

    fn ndata_frame(group: &str, node: &str, seq: u64, alias: u64, value: u64) -> RawFrame {
        let payload = Payload {
            timestamp: Some(1_000),
            metrics: vec![Metric {
                name: None,
                alias: Some(alias),
                timestamp: Some(1_000),
                datatype: DataType::UInt32 as u32,
                is_null: None,
                int_value: Some(value),
                double_value: None,
                string_value: None,
            }],
            seq: Some(seq),
        };
        RawFrame {
            topic: format!("spBv1.0/{group}/NDATA/{node}"),
            payload: payload.encode_to_vec(),
            received_at_ms: 1_000,
        }
    }

    #[test]
    fn nbirth_populates_alias_table_and_extracts_bd_seq() {
        let mut decoder = Decoder::new("d1");
        let mut out = Vec::new();
        decoder.decode_frame(&nbirth_frame("Plant1", "Node1", 0), &mut out);
        assert!(out.is_empty());
        let node = decoder.cache.get_or_insert("Plant1", "Node1", 0);
        assert_eq!(node.bd_seq, 7);
        assert_eq!(node.alias_table.len(), 1);
    }

    #[test]
    fn ndata_after_birth_decodes_to_a_sample() {
        let mut decoder = Decoder::new("d1");
        let mut out = Vec::new();
        decoder.decode_frame(&nbirth_frame("Plant1", "Node1", 0), &mut out);
        decoder.decode_frame(&ndata_frame("Plant1", "Node1", 1, 1, 42), &mut out);
        assert_eq!(out.len(), 1);
        let PipelineMessage::Sample(sample) = &out[0] else { panic!("expected a sample") };
        assert_eq!(sample.source_address, "Good");
        assert_eq!(sample.value, 42.0);
    }

    #[test]
    fn sequence_gap_requests_rebirth_and_drops_the_frame() {
        let mut decoder = Decoder::new("d1");
        let mut out = Vec::new();
        decoder.decode_frame(&nbirth_frame("Plant1", "Node1", 0), &mut out);
        decoder.decode_frame(&ndata_frame("Plant1", "Node1", 5, 1, 42), &mut out);
        assert_eq!(out.len(), 1);
        assert!(matches!(
            out[0],
            PipelineMessage::Control(ControlCommand::RequestRebirth { .. })
        ));
    }

    fn metric_string(name: &str, value: &str) -> Metric {
        Metric {
            name: Some(name.into()),
            alias: None,
            timestamp: Some(0),
            datatype: DataType::String as u32,
            is_null: None,
            int_value: None,
            double_value: None,
            string_value: Some(value.into()),
        }
    }

    fn metric_trigger(name: &str) -> Metric {
        Metric {
            name: Some(name.into()),
            alias: None,
            timestamp: Some(0),
            datatype: DataType::Boolean as u32,
            is_null: None,
            int_value: Some(1),
            double_value: None,
            string_value: None,
        }
    }

    #[test]
    fn ncmd_acknowledge_fault_emits_a_control_command() {
        let payload = Payload {
            timestamp: Some(1_000),
            metrics: vec![
                metric_trigger(oee_sparkplug::ACK_FAULT_METRIC_NAME),
                metric_string(oee_sparkplug::ASSET_REF_METRIC_NAME, "M1"),
                metric_string(oee_sparkplug::FAULT_CODE_METRIC_NAME, "E17"),
            ],
            seq: Some(0),
        };
        let command = control_command_from_payload(&payload).unwrap();
        assert_eq!(
            command,
            ControlCommand::AcknowledgeFault {
                asset_ref: oee_domain::AssetRef::new("M1"),
                code: "E17".into(),
            }
        );
    }

    #[test]
    fn dcmd_resolve_fault_carries_the_frames_own_timestamp() {
        let payload = Payload {
            timestamp: Some(5_000),
            metrics: vec![
                metric_trigger(oee_sparkplug::RESOLVE_FAULT_METRIC_NAME),
                metric_string(oee_sparkplug::ASSET_REF_METRIC_NAME, "M1"),
                metric_string(oee_sparkplug::FAULT_CODE_METRIC_NAME, "E17"),
            ],
            seq: Some(0),
        };
        let command = control_command_from_payload(&payload).unwrap();
        assert_eq!(
            command,
            ControlCommand::ResolveFault {
                asset_ref: oee_domain::AssetRef::new("M1"),
                code: "E17".into(),
                timestamp_ms: 5_000,
            }
        );
    }

    #[test]
    fn command_frame_missing_asset_ref_yields_no_command() {
        let payload = Payload {
            timestamp: Some(0),
            metrics: vec![metric_trigger(oee_sparkplug::ACK_FAULT_METRIC_NAME)],
            seq: Some(0),
        };
        assert!(control_command_from_payload(&payload).is_none());
    }

    #[test]
    fn unknown_alias_requests_rebirth_and_drops_the_frame() {
        let mut decoder = Decoder::new("d1");
        let mut out = Vec::new();
        decoder.decode_frame(&nbirth_frame("Plant1", "Node1", 0), &mut out);
        decoder.decode_frame(&ndata_frame("Plant1", "Node1", 1, 99, 42), &mut out);
        assert_eq!(out.len(), 1);
        assert!(matches!(
            out[0],
            PipelineMessage::Control(ControlCommand::RequestRebirth { .. })
        ));
    }
}
