//! The MQTT Publisher (C3, publish half), combined with the Edge
//! Store-and-Forward Buffer (C4), per §4.3/§4.4/§4.5's "PLC -> C1 ->
//! C2(encode) -> C4 -> C3(pub)" data path.
//!
//! The Sparkplug Codec encoder (C2) runs as a processor upstream and has no
//! way to assign a durable `monotonic_seq` or persist anything — it emits
//! placeholder [`OutboundEnvelope`]s (`monotonic_seq = 0`). This exporter is
//! the envelope's one real owner: it re-enqueues every envelope through its
//! own [`Buffer`], which assigns the durable sequence and fsyncs it, then
//! drains the buffer over the wire in order.

use std::{
    collections::VecDeque,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use exporter::{effect::EffectHandler, AsyncExporter, EngineHandler, Error};
use oee_buffer::{Buffer, BackpressureController, DEFAULT_HYSTERESIS_MS};
use oee_domain::{AssetRef, BackpressureHandle, BdSeqHandle, OutboundEnvelope, PipelineMessage, RebirthRequestHandle};
use oee_sparkplug::{DataType, MessageType, Metric, Payload, Topic, BD_SEQ_METRIC_NAME};
use prost::Message as _;
use rumqttc::{Event, Packet};
use signal::{Signal, SignalReceiver};

use crate::{config::PublisherConfig, session::Session, DEFAULT_QOS};

/// How often the buffer fill ratio is re-observed even with no new traffic,
/// so the Backpressure Controller's regime decays back to nominal once the
/// backlog drains.
const BACKPRESSURE_TICK_MS: u64 = 1_000;
/// Sleep applied between consecutive `EventLoop::poll` errors, to avoid a
/// busy loop while `rumqttc` reconnects internally.
const POLL_ERROR_BACKOFF: Duration = Duration::from_millis(500);

fn epoch_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}

fn death_payload(bd_seq: u64) -> Vec<u8> {
    Payload {
        timestamp: Some(epoch_ms() as u64),
        seq: None,
        metrics: vec![Metric {
            name: Some(BD_SEQ_METRIC_NAME.to_string()),
            alias: None,
            timestamp: Some(epoch_ms() as u64),
            datatype: DataType::UInt64 as u32,
            is_null: None,
            int_value: Some(bd_seq),
            double_value: None,
            string_value: None,
        }],
    }
    .encode_to_vec()
}

fn buffer_error(exporter: &str, error: oee_buffer::BufferError) -> Error {
    Error::Exporter {
        exporter: exporter.into(),
        error: error.to_string(),
        context: Default::default(),
    }
}

/// Drains a durable [`Buffer`] over an MQTT session, assigning the real
/// `monotonic_seq` the upstream encoder couldn't, and throttling C1 through
/// a shared [`BackpressureHandle`] once the buffer fills.
pub struct Publisher {
    name: String,
    config: PublisherConfig,
    buffer: Option<Buffer>,
    controller: BackpressureController,
    backpressure: BackpressureHandle,
    rebirth: RebirthRequestHandle,
    bd_seq: BdSeqHandle,
    next_unsent_seq: u64,
    in_flight: VecDeque<u64>,
}

impl Publisher {
    /// Creates a publisher for `config`, coordinating rebirth and `bd_seq`
    /// with the upstream encoder (C2) and throttling with the PLC drivers
    /// (C1) through the given shared handles.
    pub fn new(name: impl Into<String>, config: PublisherConfig, backpressure: BackpressureHandle, rebirth: RebirthRequestHandle, bd_seq: BdSeqHandle) -> Self {
        let controller = BackpressureController::new(AssetRef::new(config.node_id.clone()), DEFAULT_HYSTERESIS_MS);
        Self {
            name: name.into(),
            config,
            buffer: None,
            controller,
            backpressure,
            rebirth,
            bd_seq,
            next_unsent_seq: 0,
            in_flight: VecDeque::new(),
        }
    }

    fn buffer_mut(&mut self) -> &mut Buffer {
        self.buffer.as_mut().expect("buffer opened in init() before export() runs")
    }

    async fn enqueue(&mut self, envelope: OutboundEnvelope) {
        match self.buffer_mut().enqueue(envelope.topic, envelope.payload, envelope.enqueue_ts).await {
            Ok(_) => {}
            Err(error) => tracing::error!(publisher = %self.name, %error, "failed to persist outbound envelope"),
        }
    }

    fn observe_backpressure(&mut self, now_ms: i64, effect_handler: &EffectHandler<PipelineMessage>) {
        let fill_ratio = self.buffer_mut().fill_ratio();
        if let Some(metric) = self.controller.observe(fill_ratio, now_ms) {
            effect_handler.info(format!("backpressure state changed (fill_ratio={fill_ratio:.2}, signal={:?})", metric.signal_type));
        }
        self.backpressure.set(self.controller.state().sampling_multiplier(), self.controller.state().suppresses_low_priority());
    }

    /// Publishes every queued envelope not yet attempted, in
    /// `monotonic_seq` order, stopping at the first publish failure so the
    /// next tick retries from the same point.
    ///
    /// While `session.rebirth_pending()` holds (freshly connected, no
    /// NBIRTH republished yet), any NDATA/DDATA ahead of the next NBIRTH in
    /// the queue predates the outage and is dropped rather than published,
    /// so a reconnect never republishes stale data before the fresh NBIRTH
    /// it belongs after — per §4.3.
    async fn drain(&mut self, session: &mut Session) {
        let pending: Vec<OutboundEnvelope> = self.buffer_mut().iter().filter(|e| e.monotonic_seq >= self.next_unsent_seq).cloned().collect();
        for envelope in pending {
            let topic = match Topic::parse(&envelope.topic) {
                Ok(topic) => topic,
                Err(error) => {
                    tracing::error!(publisher = %self.name, %error, topic = %envelope.topic, "malformed envelope topic, skipping");
                    self.next_unsent_seq = envelope.monotonic_seq + 1;
                    continue;
                }
            };
            let is_birth = topic.message_type == MessageType::NBirth;
            if session.rebirth_pending() && !is_birth {
                tracing::debug!(publisher = %self.name, monotonic_seq = envelope.monotonic_seq, "withholding stale data until nbirth is republished");
                self.next_unsent_seq = envelope.monotonic_seq + 1;
                continue;
            }
            match session.publish(&topic, DEFAULT_QOS, envelope.payload.clone()).await {
                Ok(()) => {
                    self.in_flight.push_back(envelope.monotonic_seq);
                    self.next_unsent_seq = envelope.monotonic_seq + 1;
                    if is_birth {
                        session.mark_rebirth_sent();
                        let _ = self.rebirth.take();
                    }
                }
                Err(error) => {
                    tracing::warn!(publisher = %self.name, %error, monotonic_seq = envelope.monotonic_seq, "publish failed, will retry");
                    break;
                }
            }
        }
    }

    /// Assumes QoS 1 acks arrive in the order their publishes were sent, a
    /// property a single ordered MQTT connection holds in practice (see
    /// module docs) but `rumqttc` does not expose a way to verify per-ack.
    async fn ack_next_in_flight(&mut self) {
        if let Some(seq) = self.in_flight.pop_front() {
            if let Err(error) = self.buffer_mut().ack(seq).await {
                tracing::error!(publisher = %self.name, %error, monotonic_seq = seq, "failed to persist ack pointer");
            }
        }
    }
}

#[async_trait]
impl AsyncExporter<PipelineMessage> for Publisher {
    async fn init(&mut self, engine_handler: &mut EngineHandler) -> Result<(), Error> {
        let buffer = Buffer::open(&self.config.buffer_dir, self.config.max_bytes, self.config.max_count)
            .await
            .map_err(|error| buffer_error(&self.name, error))?;
        self.next_unsent_seq = buffer.iter().next().map(|e| e.monotonic_seq).unwrap_or(0);
        self.buffer = Some(buffer);
        engine_handler.timer(Duration::from_millis(BACKPRESSURE_TICK_MS));
        Ok(())
    }

    async fn export(&mut self, mut signal_receiver: SignalReceiver<PipelineMessage>, effect_handler: EffectHandler<PipelineMessage>) -> Result<(), Error> {
        let ndeath_topic = Topic {
            group_id: self.config.group_id.clone(),
            message_type: MessageType::NDeath,
            node_id: self.config.node_id.clone(),
            device_id: None,
        };
        let (mut session, mut event_loop) = Session::connect(self.config.mqtt.clone(), &ndeath_topic, death_payload(self.bd_seq.current()));

        loop {
            tokio::select! {
                signal = signal_receiver.recv() => {
                    match signal {
                        Signal::Messages { messages } => {
                            for message in messages {
                                if let PipelineMessage::Envelope(envelope) = message {
                                    self.enqueue(envelope).await;
                                }
                            }
                            self.drain(&mut session).await;
                        }
                        Signal::TimerTick { .. } => {
                            self.observe_backpressure(epoch_ms(), &effect_handler);
                            self.drain(&mut session).await;
                        }
                        Signal::Stop => break,
                        other => {
                            effect_handler.warn(format!("unsupported signal: {other}"), None);
                            return Err(Error::UnsupportedEvent {
                                exporter: self.name.clone(),
                                signal: other.to_string(),
                            });
                        }
                    }
                }
                polled = event_loop.poll() => {
                    match polled {
                        Ok(event) => {
                            session.observe_event(&event);
                            match event {
                                Event::Incoming(Packet::ConnAck(_)) => {
                                    self.rebirth.request();
                                    effect_handler.info("mqtt reconnected, requesting rebirth before further ndata".into());
                                }
                                Event::Incoming(Packet::PubAck(_)) => self.ack_next_in_flight().await,
                                _ => {}
                            }
                        }
                        Err(error) => {
                            effect_handler.warn(error.to_string(), Some("mqtt event loop error".into()));
                            tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
