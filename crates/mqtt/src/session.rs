//! A single authenticated MQTT connection honoring Sparkplug conventions,
//! per §4.3.

use std::time::Duration;

use oee_sparkplug::Topic;
use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use tokio::time::timeout;

use crate::{config::MqttConfig, error::MqttError};

/// Sparkplug's default publish QoS; exactly-once (QoS 2) is never used,
/// per §4.3.
pub const DEFAULT_QOS: QoS = QoS::AtLeastOnce;

/// A live MQTT session.
///
/// `Session` owns the `AsyncClient` half; the caller is responsible for
/// polling the paired [`EventLoop`] returned by [`Session::connect`] — this
/// mirrors `rumqttc`'s standard split and lets the caller drive polling on
/// whichever runtime (multi-threaded or thread-per-core) it's using.
pub struct Session {
    client: AsyncClient,
    config: MqttConfig,
    /// Set after a reconnect until NBIRTH has been republished, per §4.3
    /// ("on reconnect, the session MUST republish NBIRTH before any
    /// NDATA").
    rebirth_pending: bool,
}

impl Session {
    /// Opens a new session, registering the serialized NDEATH payload as
    /// the MQTT Last Will (QoS 1, retain=false, per §4.3).
    pub fn connect(config: MqttConfig, ndeath_topic: &Topic, ndeath_payload: Vec<u8>) -> (Self, EventLoop) {
        let mut options = MqttOptions::new(config.client_id.clone(), config.broker_host.clone(), config.broker_port);
        let _ = options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        let _ = options.set_last_will(LastWill::new(ndeath_topic.to_topic_string(), ndeath_payload, DEFAULT_QOS, false));
        if let Some(tls) = &config.tls {
            if tls.cert.is_some() && tls.key.is_some() {
                tracing::warn!("mutual TLS client cert/key configured but not yet wired into the transport; connecting with CA verification only");
            }
            let ca = std::fs::read(&tls.ca).unwrap_or_default();
            options.set_transport(Transport::Tls(TlsConfiguration::Simple { ca, alpn: None, client_auth: None }));
        }
        let (client, event_loop) = AsyncClient::new(options, 64);
        (
            Self {
                client,
                config,
                rebirth_pending: true,
            },
            event_loop,
        )
    }

    /// Publishes `payload` to `topic` at the given QoS, bounded by the
    /// configured I/O deadline.
    pub async fn publish(&self, topic: &Topic, qos: QoS, payload: Vec<u8>) -> Result<(), MqttError> {
        let deadline = Duration::from_millis(self.config.io_deadline_ms);
        timeout(deadline, self.client.publish(topic.to_topic_string(), qos, false, payload))
            .await
            .map_err(|_| MqttError::Timeout {
                operation: "publish",
                deadline_ms: self.config.io_deadline_ms,
            })??;
        Ok(())
    }

    /// Subscribes to a topic filter, bounded by the configured I/O
    /// deadline.
    pub async fn subscribe(&self, filter: &str, qos: QoS) -> Result<(), MqttError> {
        let deadline = Duration::from_millis(self.config.io_deadline_ms);
        timeout(deadline, self.client.subscribe(filter, qos))
            .await
            .map_err(|_| MqttError::Timeout {
                operation: "subscribe",
                deadline_ms: self.config.io_deadline_ms,
            })??;
        Ok(())
    }

    /// Gracefully disconnects. In-flight unacked QoS 1 publishes are the
    /// caller's responsibility to have already persisted to the
    /// Store-and-Forward buffer before calling this (§4.3).
    pub async fn disconnect(&self) -> Result<(), MqttError> {
        self.client.disconnect().await?;
        Ok(())
    }

    /// Whether NBIRTH must be republished before any further NDATA is
    /// sent, per §4.3.
    pub fn rebirth_pending(&self) -> bool {
        self.rebirth_pending
    }

    /// Clears the rebirth-pending flag after NBIRTH has been republished.
    pub fn mark_rebirth_sent(&mut self) {
        self.rebirth_pending = false;
    }

    /// Inspects a polled [`Event`] and updates reconnect-driven state
    /// (`rebirth_pending`). Callers drive the paired `EventLoop` and feed
    /// each event here.
    pub fn observe_event(&mut self, event: &Event) {
        if let Event::Incoming(Packet::ConnAck(_)) = event {
            self.rebirth_pending = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use rumqttc::{ConnAck, ConnectReturnCode};

    use super::*;

    fn config() -> MqttConfig {
        serde_yaml::from_str(
            r#"
            broker_host: "broker.example"
            broker_port: 1883
            client_id: "edge-1"
            "#,
        )
        .unwrap()
    }

    fn topic() -> Topic {
        Topic {
            group_id: "Plant1".into(),
            message_type: oee_sparkplug::MessageType::NDeath,
            node_id: "Line1".into(),
            device_id: None,
        }
    }

    #[test]
    fn a_fresh_session_starts_with_rebirth_pending() {
        let (session, _event_loop) = Session::connect(config(), &topic(), Vec::new());
        assert!(session.rebirth_pending());
    }

    #[test]
    fn mark_rebirth_sent_clears_the_flag() {
        let (mut session, _event_loop) = Session::connect(config(), &topic(), Vec::new());
        session.mark_rebirth_sent();
        assert!(!session.rebirth_pending());
    }

    #[test]
    fn a_fresh_connack_sets_rebirth_pending_again() {
        let (mut session, _event_loop) = Session::connect(config(), &topic(), Vec::new());
        session.mark_rebirth_sent();
        session.observe_event(&Event::Incoming(Packet::ConnAck(ConnAck::new(ConnectReturnCode::Success, false))));
        assert!(session.rebirth_pending());
    }
}
