//! The `SinkTransport` capability every downstream store implementation
//! provides, per §4.10 ("batched insert to time-series and event stores").

use std::time::Duration;

use async_trait::async_trait;

use crate::{error::SinkError, record::SinkRecord};

/// Writes one batch of [`SinkRecord`]s to a downstream store.
#[async_trait]
pub trait SinkTransport: Send {
    /// Writes `batch` to the store, or fails with a transient/persistent
    /// [`SinkError`] per §4.10.
    async fn write_batch(&mut self, batch: &[SinkRecord]) -> Result<(), SinkError>;
}

/// An HTTP JSON sink: `POST`s each batch to a configured endpoint.
///
/// This is the one place the crate stack diverges from the teacher's raw-TCP
/// receivers, grounded in the same `reqwest` dependency `oee-mqtt`'s sibling
/// crates already carry for outbound HTTP, per `DESIGN.md`.
pub struct HttpSinkTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSinkTransport {
    /// Builds a transport posting batches to `endpoint`, with `timeout` as
    /// the per-request deadline (§5's default-30s external I/O deadline).
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| SinkError::Rejected(error.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl SinkTransport for HttpSinkTransport {
    async fn write_batch(&mut self, batch: &[SinkRecord]) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(batch)
            .send()
            .await
            .map_err(|error| SinkError::Unreachable(error.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.is_server_error() || status.as_u16() == 429 {
            Err(SinkError::Unreachable(format!("sink responded {status}")))
        } else {
            Err(SinkError::Rejected(format!("sink responded {status}")))
        }
    }
}

/// A deterministic in-process transport for development and tests: records
/// every batch it is handed, optionally failing on command.
pub struct RecordingTransport {
    /// Batches accepted so far.
    pub written: Vec<Vec<SinkRecord>>,
    /// If set, `write_batch` returns this error instead of succeeding.
    pub fail_with: Option<SinkError>,
}

impl RecordingTransport {
    /// Creates a transport that accepts every batch.
    pub fn new() -> Self {
        Self {
            written: Vec::new(),
            fail_with: None,
        }
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SinkTransport for RecordingTransport {
    async fn write_batch(&mut self, batch: &[SinkRecord]) -> Result<(), SinkError> {
        if let Some(error) = &self.fail_with {
            return Err(match error {
                SinkError::Unreachable(msg) => SinkError::Unreachable(msg.clone()),
                SinkError::Rejected(msg) => SinkError::Rejected(msg.clone()),
            });
        }
        self.written.push(batch.to_vec());
        Ok(())
    }
}
