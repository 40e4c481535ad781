//! Resolves `sink.*` configuration entries into [`SinkWriter`] instances,
//! per the teacher's two-step `ExporterFactory`/`ExporterBuilder` pattern
//! (a builder is returned first so the engine can read its concurrency model
//! before constructing it).

use std::time::Duration;

use exporter::{AsyncExporter, ConcurrencyModel, Error, ExporterBuilder, ExporterFactory};
use oee_domain::PipelineMessage;
use serde_yaml::Value;

use crate::{config::SinkConfig, sink_writer::SinkWriter, transport::HttpSinkTransport};

fn invalid_config(exporter: &str, error: serde_yaml::Error) -> Error {
    Error::InvalidConfig {
        exporter: exporter.into(),
        message: error.to_string(),
        line: None,
        column: None,
    }
}

struct SinkWriterBuilder {
    name: String,
    raw_config: Value,
}

impl ExporterBuilder<PipelineMessage> for SinkWriterBuilder {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn r#type(&self) -> String {
        "sink".into()
    }

    fn concurrency_model(&self) -> ConcurrencyModel {
        ConcurrencyModel::Singleton
    }

    fn build(&self) -> Result<Box<dyn AsyncExporter<PipelineMessage> + Send + Sync>, Error> {
        let config: SinkConfig = serde_yaml::from_value(self.raw_config.clone()).map_err(|error| invalid_config(&self.name, error))?;
        let transport = HttpSinkTransport::new(config.endpoint.clone(), Duration::from_millis(config.request_timeout_ms)).map_err(|error| Error::InvalidConfig {
            exporter: self.name.clone(),
            message: error.to_string(),
            line: None,
            column: None,
        })?;
        Ok(Box::new(SinkWriter::new(self.name.clone(), config, transport)))
    }
}

/// Builds a [`SinkWriter`] for every `exporter_type == "sink"` entry. YAML
/// validation is deferred to `build()`, the only step with a `Result`
/// return, per the teacher's two-step builder/build split.
#[derive(Default)]
pub struct SinkWriterFactory {}

impl ExporterFactory<PipelineMessage> for SinkWriterFactory {
    fn builder(&self, exporter_name: &str, exporter_type: &str, config: Value) -> Option<Box<dyn ExporterBuilder<PipelineMessage> + Send + Sync>> {
        if exporter_type != "sink" {
            return None;
        }
        Some(Box::new(SinkWriterBuilder {
            name: exporter_name.to_string(),
            raw_config: config,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_exporter_type_yields_no_builder() {
        let factory = SinkWriterFactory::default();
        assert!(factory.builder("sink1", "not-sink", Value::Null).is_none());
    }

    #[test]
    fn malformed_configuration_fails_at_build_time() {
        let factory = SinkWriterFactory::default();
        let builder = factory.builder("sink1", "sink", Value::Null).expect("type matched, builder returned");
        assert!(matches!(builder.build().unwrap_err(), Error::InvalidConfig { .. }));
    }

    #[test]
    fn well_formed_configuration_builds_a_writer() {
        let factory = SinkWriterFactory::default();
        let yaml = serde_yaml::from_str("endpoint: \"https://sink.example/write\"\n").unwrap();
        let builder = factory.builder("sink1", "sink", yaml).expect("builder is returned");
        assert_eq!(builder.name(), "sink1");
        assert_eq!(builder.concurrency_model(), ConcurrencyModel::Singleton);
        assert!(builder.build().is_ok());
    }
}
