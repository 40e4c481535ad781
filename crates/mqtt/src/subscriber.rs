//! The MQTT Subscriber (C3, subscribe half): the central-side ingest that
//! turns broker publishes under a Sparkplug group's namespace into
//! undecoded [`RawFrame`]s, per §4.3/§4.6.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use oee_domain::{PipelineMessage, RawFrame};
use oee_sparkplug::{MessageType, Topic};
use receiver::{effect::EffectHandler, signal::Signal, signal::SignalReceiver, AsyncReceiver, Error as ReceiverError};
use rumqttc::{Event, Packet};

use crate::{backoff::ReconnectBackoff, config::SubscriberConfig, session::Session, DEFAULT_QOS};

fn epoch_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}

/// Subscribes to `spBv1.0/{group_id}/#` and forwards every broker publish
/// as a [`PipelineMessage::Raw`] for the Decoder & Alias Cache (C6) to
/// parse; it holds no Sparkplug state of its own, per §9's "single owner
/// task per node".
pub struct MqttSubscriber {
    name: String,
    config: SubscriberConfig,
}

impl MqttSubscriber {
    /// Creates a subscriber for `config`'s broker and group.
    pub fn new(name: impl Into<String>, config: SubscriberConfig) -> Self {
        Self { name: name.into(), config }
    }

    fn topic_filter(&self) -> String {
        format!("spBv1.0/{}/#", self.config.group_id)
    }
}

#[async_trait]
impl AsyncReceiver<PipelineMessage> for MqttSubscriber {
    async fn receive(&mut self, mut signal_receiver: SignalReceiver, effect_handler: EffectHandler<PipelineMessage>) -> Result<(), ReceiverError> {
        // The subscriber has no Sparkplug node identity of its own; the Last
        // Will this registers is never subscribed to by anyone, but `Session`
        // requires one to stay a single reusable abstraction across both
        // halves of C3.
        let sentinel_topic = Topic {
            group_id: self.config.group_id.clone(),
            message_type: MessageType::NDeath,
            node_id: self.config.mqtt.client_id.clone(),
            device_id: None,
        };
        let (mut session, mut event_loop) = Session::connect(self.config.mqtt.clone(), &sentinel_topic, Vec::new());

        let mut backoff = ReconnectBackoff::default();
        loop {
            match session.subscribe(&self.topic_filter(), DEFAULT_QOS).await {
                Ok(()) => {
                    backoff.reset();
                    tracing::info!(receiver = %self.name, group = %self.config.group_id, "subscribed to sparkplug namespace");
                    break;
                }
                Err(error) => {
                    let delay = backoff.next_delay();
                    tracing::warn!(receiver = %self.name, %error, delay_ms = %delay.as_millis(), "subscribe failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }

        loop {
            tokio::select! {
                signal = signal_receiver.recv() => {
                    if matches!(signal, Signal::Stop) {
                        break;
                    }
                }
                polled = event_loop.poll() => {
                    match polled {
                        Ok(event) => {
                            session.observe_event(&event);
                            if let Event::Incoming(Packet::Publish(publish)) = event {
                                let frame = PipelineMessage::Raw(RawFrame {
                                    topic: publish.topic,
                                    payload: publish.payload.to_vec(),
                                    received_at_ms: epoch_ms(),
                                });
                                effect_handler.send_messages(vec![frame]).await?;
                            }
                        }
                        Err(error) => {
                            tracing::warn!(receiver = %self.name, %error, "mqtt event loop error, rumqttc will reconnect internally");
                        }
                    }
                }
            }
        }

        if let Err(error) = session.disconnect().await {
            tracing::warn!(receiver = %self.name, %error, "mqtt disconnect failed during shutdown");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SubscriberConfig {
        serde_yaml::from_str(
            r#"
            mqtt:
              broker_host: "broker.example"
              broker_port: 1883
              client_id: "central-1"
            group_id: "Plant1"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn topic_filter_subscribes_to_the_configured_group_namespace() {
        let subscriber = MqttSubscriber::new("sub1", config());
        assert_eq!(subscriber.topic_filter(), "spBv1.0/Plant1/#");
    }
}
