//! Resolves `mqtt_subscriber.*`/`mqtt_publisher.*` configuration entries
//! into [`MqttSubscriber`]/[`Publisher`] instances, per the teacher's
//! one-step `ReceiverFactory` and two-step `ExporterFactory`/
//! `ExporterBuilder` patterns.

use exporter::{AsyncExporter, ConcurrencyModel, Error as ExporterError, ExporterBuilder, ExporterFactory};
use oee_domain::{BackpressureHandle, BdSeqHandle, PipelineMessage, RebirthRequestHandle};
use receiver::{AsyncReceiver, Error as ReceiverError, ReceiverFactory};
use serde_yaml::Value;

use crate::{config::PublisherConfig, config::SubscriberConfig, publisher::Publisher, subscriber::MqttSubscriber};

fn invalid_exporter_config(exporter: &str, error: serde_yaml::Error) -> ExporterError {
    ExporterError::InvalidConfig {
        exporter: exporter.into(),
        message: error.to_string(),
        line: None,
        column: None,
    }
}

/// Builds an [`MqttSubscriber`] for every `receiver_type == "mqtt_subscriber"`
/// entry.
#[derive(Default)]
pub struct SubscriberFactory {}

impl ReceiverFactory<PipelineMessage> for SubscriberFactory {
    fn create(&self, receiver_name: &str, receiver_type: &str, config: Value) -> Result<Box<dyn AsyncReceiver<PipelineMessage> + Send + Sync>, ReceiverError> {
        if receiver_type != "mqtt_subscriber" {
            return Err(ReceiverError::UnknownReceiver {
                receiver: receiver_name.into(),
                receiver_type: receiver_type.into(),
            });
        }
        let subscriber_config: SubscriberConfig = serde_yaml::from_value(config).map_err(|error| ReceiverError::InvalidConfig {
            receiver: receiver_name.into(),
            message: error.to_string(),
            line: None,
            column: None,
        })?;
        Ok(Box::new(MqttSubscriber::new(receiver_name, subscriber_config)))
    }
}

struct PublisherBuilder {
    name: String,
    raw_config: Value,
    backpressure: BackpressureHandle,
    rebirth: RebirthRequestHandle,
    bd_seq: BdSeqHandle,
}

impl ExporterBuilder<PipelineMessage> for PublisherBuilder {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn r#type(&self) -> String {
        "mqtt_publisher".into()
    }

    fn concurrency_model(&self) -> ConcurrencyModel {
        ConcurrencyModel::Singleton
    }

    fn build(&self) -> Result<Box<dyn AsyncExporter<PipelineMessage> + Send + Sync>, ExporterError> {
        let config: PublisherConfig = serde_yaml::from_value(self.raw_config.clone()).map_err(|error| invalid_exporter_config(&self.name, error))?;
        Ok(Box::new(Publisher::new(self.name.clone(), config, self.backpressure.clone(), self.rebirth.clone(), self.bd_seq.clone())))
    }
}

/// Builds a [`Publisher`] for every `exporter_type == "mqtt_publisher"`
/// entry, sharing rebirth, `bd_seq`, and backpressure coordination with
/// whichever [`crate::PublisherConfig`]-adjacent processor/receiver
/// factories were constructed with the same handles.
pub struct PublisherFactory {
    backpressure: BackpressureHandle,
    rebirth: RebirthRequestHandle,
    bd_seq: BdSeqHandle,
}

impl PublisherFactory {
    /// Creates a factory sharing the given coordination handles.
    pub fn new(backpressure: BackpressureHandle, rebirth: RebirthRequestHandle, bd_seq: BdSeqHandle) -> Self {
        Self { backpressure, rebirth, bd_seq }
    }
}

impl Default for PublisherFactory {
    fn default() -> Self {
        Self::new(BackpressureHandle::default(), RebirthRequestHandle::default(), BdSeqHandle::default())
    }
}

impl ExporterFactory<PipelineMessage> for PublisherFactory {
    fn builder(&self, exporter_name: &str, exporter_type: &str, config: Value) -> Option<Box<dyn ExporterBuilder<PipelineMessage> + Send + Sync>> {
        if exporter_type != "mqtt_publisher" {
            return None;
        }
        Some(Box::new(PublisherBuilder {
            name: exporter_name.to_string(),
            raw_config: config,
            backpressure: self.backpressure.clone(),
            rebirth: self.rebirth.clone(),
            bd_seq: self.bd_seq.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_receiver_type_is_rejected() {
        let factory = SubscriberFactory::default();
        let err = factory.create("sub1", "not-mqtt", Value::Null).unwrap_err();
        assert!(matches!(err, ReceiverError::UnknownReceiver { .. }));
    }

    #[test]
    fn subscriber_builds_from_well_formed_config() {
        let factory = SubscriberFactory::default();
        let yaml = serde_yaml::from_str(
            r#"
            mqtt:
              broker_host: "broker.example"
              broker_port: 1883
              client_id: "central-1"
            group_id: "Plant1"
            "#,
        )
        .unwrap();
        assert!(factory.create("sub1", "mqtt_subscriber", yaml).is_ok());
    }

    #[test]
    fn unknown_exporter_type_yields_no_builder() {
        let factory = PublisherFactory::default();
        assert!(factory.builder("pub1", "not-mqtt", Value::Null).is_none());
    }

    #[test]
    fn publisher_build_fails_on_malformed_config() {
        let factory = PublisherFactory::default();
        let builder = factory.builder("pub1", "mqtt_publisher", Value::Null).expect("type matched, builder returned");
        assert!(matches!(builder.build().unwrap_err(), ExporterError::InvalidConfig { .. }));
    }
}
