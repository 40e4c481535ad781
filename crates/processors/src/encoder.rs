//! Sparkplug Codec encoder (C2), per §4.2.
//!
//! Turns PLC [`Sample`]s into NBIRTH/NDATA [`Payload`] frames wrapped as
//! [`PipelineMessage::Envelope`]s, owning its own per-birth-session alias
//! table — the encoder's alias assignment is independent of (and need not
//! match) the Decoder's (C6), per §4.2 ("the encoder... owns its own alias
//! table per birth session").
//!
//! The encoder and the downstream MQTT publisher (C3) are split across a
//! processor and an exporter, which the engine never lets exchange
//! messages, so reconnect-driven rebirth is coordinated through
//! [`RebirthRequestHandle`] instead (see `oee_domain::handles`).

use std::collections::HashMap;

use async_trait::async_trait;
use oee_domain::{BdSeqHandle, ControlCommand, OutboundEnvelope, PipelineMessage, RebirthRequestHandle, Sample};
use oee_sparkplug::{encode_birth, encode_data, DataType, MessageType, Metric, Topic, BD_SEQ_METRIC_NAME};
use processor::{effect::EffectHandler, AsyncProcessor, Error};
use prost::Message as _;
use signal::Signal;

use crate::config::EncoderConfig;

/// Encodes a single edge node's declared metrics into Sparkplug B frames.
pub struct Encoder {
    name: String,
    group_id: String,
    node_id: String,
    declared: Vec<(String, DataType)>,
    alias_by_name: HashMap<String, u64>,
    datatype_by_alias: HashMap<u64, DataType>,
    seq: u8,
    birthed: bool,
    rebirth: RebirthRequestHandle,
    bd_seq: BdSeqHandle,
}

impl Encoder {
    /// Creates an encoder for `config`'s declared metric set, coordinating
    /// rebirth and `bd_seq` with the MQTT publisher through the given
    /// shared handles.
    pub fn new(name: impl Into<String>, config: EncoderConfig, rebirth: RebirthRequestHandle, bd_seq: BdSeqHandle) -> Self {
        let declared: Vec<(String, DataType)> = config.metrics.into_iter().map(|m| (m.name, m.datatype.into())).collect();
        Self {
            name: name.into(),
            group_id: config.group_id,
            node_id: config.node_id,
            declared,
            alias_by_name: HashMap::new(),
            datatype_by_alias: HashMap::new(),
            seq: 0,
            birthed: false,
            rebirth,
            bd_seq,
        }
    }

    fn topic(&self, message_type: MessageType) -> Topic {
        Topic {
            group_id: self.group_id.clone(),
            message_type,
            node_id: self.node_id.clone(),
            device_id: None,
        }
    }

    fn birth(&mut self, now_ms: i64) -> PipelineMessage {
        let metrics_for_birth: Vec<(String, DataType)> = self.declared.clone();
        let (mut payload, aliases) = encode_birth(now_ms, &metrics_for_birth);
        self.alias_by_name = aliases.iter().map(|(alias, descriptor)| (descriptor.name.clone(), *alias)).collect();
        self.datatype_by_alias = metrics_for_birth.iter().enumerate().map(|(alias, (_, datatype))| (alias as u64, *datatype)).collect();

        let bd_seq = self.bd_seq.advance();
        payload.metrics.push(Metric {
            name: Some(BD_SEQ_METRIC_NAME.to_string()),
            alias: None,
            timestamp: Some(now_ms as u64),
            datatype: DataType::UInt64 as u32,
            is_null: None,
            int_value: Some(bd_seq),
            double_value: None,
            string_value: None,
        });

        self.seq = 0;
        self.birthed = true;
        tracing::info!(encoder = %self.name, group = %self.group_id, node = %self.node_id, bd_seq, "emitting nbirth");
        PipelineMessage::Envelope(OutboundEnvelope::new(0, self.topic(MessageType::NBirth).to_topic_string(), payload.encode_to_vec(), now_ms))
    }

    fn data(&mut self, sample: &Sample) -> Option<PipelineMessage> {
        let alias = *self.alias_by_name.get(&sample.source_address)?;
        let datatype = *self.datatype_by_alias.get(&alias)?;
        let payload = encode_data(self.seq, alias, sample, datatype);
        self.seq = self.seq.wrapping_add(1);
        Some(PipelineMessage::Envelope(OutboundEnvelope::new(
            0,
            self.topic(MessageType::NData).to_topic_string(),
            payload.encode_to_vec(),
            sample.timestamp_ms,
        )))
    }
}

#[async_trait]
impl AsyncProcessor<PipelineMessage> for Encoder {
    async fn process(&mut self, signal: Signal<PipelineMessage>, effects_handler: &mut EffectHandler<PipelineMessage>) -> Result<(), Error> {
        match signal {
            Signal::Messages { messages } => {
                let mut out = Vec::with_capacity(messages.len() + 1);
                for message in &messages {
                    if let PipelineMessage::Control(ControlCommand::RequestRebirth { group_id, node_id }) = message {
                        if *group_id == self.group_id && *node_id == self.node_id {
                            self.birthed = false;
                        }
                    }
                }
                if !self.birthed || self.rebirth.take() {
                    let now_ms = messages.iter().find_map(PipelineMessage::timestamp_ms).unwrap_or(0);
                    out.push(self.birth(now_ms));
                }
                for message in messages {
                    match message {
                        PipelineMessage::Sample(sample) => {
                            if let Some(envelope) = self.data(&sample) {
                                out.push(envelope);
                            } else {
                                tracing::debug!(encoder = %self.name, source = %sample.source_address, "sample not in declared metric set, dropping");
                            }
                        }
                        PipelineMessage::Control(_) => {}
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EncoderDataType, EncoderMetricConfig};
    use oee_domain::Quality;
    use oee_sparkplug::Topic as SpTopic;

    fn encoder() -> Encoder {
        let config = EncoderConfig {
            group_id: "Plant1".into(),
            node_id: "Line1".into(),
            metrics: vec![EncoderMetricConfig {
                name: "ns=2;s=Good".into(),
                datatype: EncoderDataType::UInt32,
            }],
        };
        Encoder::new("enc1", config, RebirthRequestHandle::new(), BdSeqHandle::new())
    }

    #[test]
    fn first_batch_emits_birth_before_data() {
        let mut encoder = encoder();
        let sample = Sample::new(1, "ns=2;s=Good", 1.0, Quality::GOOD);
        let birth = encoder.birth(0);
        let PipelineMessage::Envelope(envelope) = birth else { panic!("expected envelope") };
        let topic = SpTopic::parse(&envelope.topic).unwrap();
        assert_eq!(topic.message_type, oee_sparkplug::MessageType::NBirth);
        assert!(encoder.data(&sample).is_some());
    }

    #[test]
    fn unknown_source_address_yields_no_data_frame() {
        let mut encoder = encoder();
        let _ = encoder.birth(0);
        let sample = Sample::new(1, "unbound", 1.0, Quality::GOOD);
        assert!(encoder.data(&sample).is_none());
    }

    #[test]
    fn rebirth_reassigns_a_fresh_bd_seq() {
        let mut encoder = encoder();
        let PipelineMessage::Envelope(first) = encoder.birth(0) else { panic!() };
        let PipelineMessage::Envelope(second) = encoder.birth(0) else { panic!() };
        assert_ne!(first.payload, second.payload);
    }
}
