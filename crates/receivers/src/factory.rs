//! Resolves `plc.*` configuration entries into [`PlcReceiver`] instances,
//! per the `ReceiverFactory` pattern used to build a pipeline from YAML.

use oee_domain::{BackpressureHandle, PipelineMessage};
use receiver::{AsyncReceiver, Error, ReceiverFactory};
use serde_yaml::Value;

use crate::{
    config::{PlcEndpointConfig, PlcKind},
    plc_receiver::PlcReceiver,
    transport::{SimulatedTransport, UnwiredTransport},
};

/// Builds a [`PlcReceiver`] for every `receiver_type == "plc"` entry, reading
/// the protocol family from the entry's own `kind` field.
///
/// Every receiver it builds shares the same [`BackpressureHandle`], so a
/// single edge node's Backpressure Controller (C5) throttles all of its PLC
/// lines together regardless of how many `plc.*` entries the config has.
pub struct PlcReceiverFactory {
    backpressure: BackpressureHandle,
}

impl PlcReceiverFactory {
    /// Creates a factory whose receivers read throttling state from
    /// `backpressure`.
    pub fn new(backpressure: BackpressureHandle) -> Self {
        Self { backpressure }
    }
}

impl Default for PlcReceiverFactory {
    fn default() -> Self {
        Self::new(BackpressureHandle::default())
    }
}

impl ReceiverFactory<PipelineMessage> for PlcReceiverFactory {
    fn create(
        &self,
        receiver_name: &str,
        receiver_type: &str,
        config: Value,
    ) -> Result<Box<dyn AsyncReceiver<PipelineMessage> + Send + Sync>, Error> {
        if receiver_type != "plc" {
            return Err(Error::UnknownReceiver {
                receiver: receiver_name.into(),
                receiver_type: receiver_type.into(),
            });
        }

        let endpoint: PlcEndpointConfig = serde_yaml::from_value(config).map_err(|e| Error::InvalidConfig {
            receiver: receiver_name.into(),
            message: e.to_string(),
            line: None,
            column: None,
        })?;

        let receiver: Box<dyn AsyncReceiver<PipelineMessage> + Send + Sync> = match endpoint.kind {
            PlcKind::Simulated => Box::new(PlcReceiver::new(receiver_name, endpoint, SimulatedTransport::new()).with_backpressure(self.backpressure.clone())),
            PlcKind::OpcUa => Box::new(PlcReceiver::new(receiver_name, endpoint, UnwiredTransport::new("opc-ua")).with_backpressure(self.backpressure.clone())),
            PlcKind::AllenBradley => {
                Box::new(PlcReceiver::new(receiver_name, endpoint, UnwiredTransport::new("allen-bradley")).with_backpressure(self.backpressure.clone()))
            }
            PlcKind::Siemens => Box::new(PlcReceiver::new(receiver_name, endpoint, UnwiredTransport::new("siemens-s7")).with_backpressure(self.backpressure.clone())),
        };

        Ok(receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_receiver_type_is_rejected() {
        let factory = PlcReceiverFactory::default();
        let err = factory.create("line1", "not-plc", Value::Null).unwrap_err();
        assert!(matches!(err, Error::UnknownReceiver { .. }));
    }

    #[test]
    fn simulated_kind_builds_successfully() {
        let factory = PlcReceiverFactory::default();
        let yaml = serde_yaml::from_str(
            r#"
            kind: simulated
            endpoint: "sim://line1"
            tags: ["ns=2;s=Good"]
            "#,
        )
        .unwrap();
        let result = factory.create("line1", "plc", yaml);
        assert!(result.is_ok());
    }
}
