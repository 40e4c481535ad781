//! Resolves `encoder`/`decoder`/`normalizer`/`oee`/`faults` configuration
//! entries into processor instances, per the `ProcessorFactory` pattern
//! used to build a pipeline from YAML.

use oee_domain::{BdSeqHandle, PipelineMessage, RebirthRequestHandle};
use processor::{AsyncProcessor, Error, ProcessorFactory};
use serde_yaml::Value;

use crate::{
    config::{EncoderConfig, FaultsConfig, NormalizerConfig, OeeConfig},
    decoder::Decoder,
    encoder::Encoder,
    fault::FaultStateMachine,
    normalizer::Normalizer,
    oee::OeeCalculator,
};

fn invalid_config(processor: &str, error: serde_yaml::Error) -> Error {
    Error::InvalidConfig {
        processor: processor.into(),
        message: error.to_string(),
        line: None,
        column: None,
    }
}

/// Builds the C2, C6-C9 stream processors from their `processor_type`
/// entries.
///
/// `rebirth`/`bd_seq` are only consumed by `"encoder"` entries, which only
/// ever appear in an edge pipeline; a central-only process may construct
/// this factory with handles it never ends up using.
pub struct OeeProcessorFactory {
    rebirth: RebirthRequestHandle,
    bd_seq: BdSeqHandle,
}

impl OeeProcessorFactory {
    /// Creates a factory, wiring any `"encoder"` entries to the given
    /// shared rebirth/`bd_seq` handles.
    pub fn new(rebirth: RebirthRequestHandle, bd_seq: BdSeqHandle) -> Self {
        Self { rebirth, bd_seq }
    }
}

impl Default for OeeProcessorFactory {
    fn default() -> Self {
        Self::new(RebirthRequestHandle::new(), BdSeqHandle::new())
    }
}

impl ProcessorFactory<PipelineMessage> for OeeProcessorFactory {
    fn create(&self, processor_name: &str, processor_type: &str, config: Value) -> Result<Box<dyn AsyncProcessor<PipelineMessage> + Send + Sync>, Error> {
        match processor_type {
            "encoder" => {
                let encoder_config: EncoderConfig = serde_yaml::from_value(config).map_err(|e| invalid_config(processor_name, e))?;
                Ok(Box::new(Encoder::new(processor_name, encoder_config, self.rebirth.clone(), self.bd_seq.clone())))
            }
            "decoder" => Ok(Box::new(Decoder::new(processor_name))),
            "normalizer" => {
                let normalizer_config: NormalizerConfig = serde_yaml::from_value(config).map_err(|e| invalid_config(processor_name, e))?;
                Ok(Box::new(Normalizer::new(processor_name, normalizer_config.mappings)))
            }
            "oee" => {
                let oee_config: OeeConfig = serde_yaml::from_value(config).map_err(|e| invalid_config(processor_name, e))?;
                Ok(Box::new(OeeCalculator::new(processor_name, oee_config)))
            }
            "faults" => {
                let faults_config: FaultsConfig = serde_yaml::from_value(config).map_err(|e| invalid_config(processor_name, e))?;
                Ok(Box::new(FaultStateMachine::new(processor_name, faults_config)))
            }
            other => Err(Error::UnknownProcessor {
                processor: processor_name.into(),
                r#type: other.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_processor_type_is_rejected() {
        let factory = OeeProcessorFactory::default();
        let err = factory.create("p1", "not-a-type", Value::Null).unwrap_err();
        assert!(matches!(err, Error::UnknownProcessor { .. }));
    }

    #[test]
    fn encoder_builds_from_declared_metrics() {
        let factory = OeeProcessorFactory::default();
        let yaml = serde_yaml::from_str(
            r#"
            group_id: Plant1
            node_id: Line1
            metrics:
              - name: "ns=2;s=Good"
                datatype: u_int32
            "#,
        )
        .unwrap();
        let result = factory.create("encoder1", "encoder", yaml);
        assert!(result.is_ok());
    }

    #[test]
    fn decoder_builds_with_no_configuration() {
        let factory = OeeProcessorFactory::default();
        let result = factory.create("decoder1", "decoder", Value::Null);
        assert!(result.is_ok());
    }

    #[test]
    fn normalizer_builds_from_empty_mappings() {
        let factory = OeeProcessorFactory::default();
        let yaml = serde_yaml::from_str("mappings: []").unwrap();
        let result = factory.create("normalizer1", "normalizer", yaml);
        assert!(result.is_ok());
    }

    #[test]
    fn oee_rejects_malformed_configuration() {
        let factory = OeeProcessorFactory::default();
        let yaml = serde_yaml::from_str("window_ms: \"not-a-number\"").unwrap();
        let err = factory.create("oee1", "oee", yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }
}
