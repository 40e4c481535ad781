//! The `PlcTransport` capability set every PLC driver variant implements,
//! per §9 ("define a closed `PLCDriver` capability set {`open`,
//! `read_batch`, `subscribe`, `close`}; drivers are variants").

use async_trait::async_trait;
use oee_domain::Sample;

use crate::error::PlcError;

/// A single PLC endpoint session: open it, poll a batch of tags, close it.
///
/// Subscription-style protocols (OPC-UA change-of-value) are expected to
/// implement `read_batch` as "wait for the next batch of changed tags"
/// rather than an active poll; the receiver loop treats both uniformly.
#[async_trait]
pub trait PlcTransport: Send {
    /// Establishes a session. Per §4.1, failures are one of `UNREACHABLE`,
    /// `AUTH`, `TLS`.
    async fn open(&mut self) -> Result<(), PlcError>;

    /// Reads (or waits for) the current value of every tag in `tags`.
    /// Drivers MUST report a quality code for every sample, substituting a
    /// BAD-quality [`Sample::bad`] rather than omitting a tag that failed
    /// to read (§4.1).
    async fn read_batch(&mut self, tags: &[String]) -> Result<Vec<Sample>, PlcError>;

    /// Releases session resources. Called on every exit path, including
    /// after a failed `open`.
    async fn close(&mut self) -> Result<(), PlcError>;
}

/// A deterministic, in-process transport for development and tests.
///
/// Each tag's value increases by 10 on every poll starting from 100,
/// mirroring the walkthrough in §8's S1 scenario (`100` then `110`).
pub struct SimulatedTransport {
    next_value: f64,
    next_timestamp_ms: i64,
    opened: bool,
}

impl SimulatedTransport {
    /// Creates a transport that has not yet been opened.
    pub fn new() -> Self {
        Self {
            next_value: 100.0,
            next_timestamp_ms: 0,
            opened: false,
        }
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlcTransport for SimulatedTransport {
    async fn open(&mut self) -> Result<(), PlcError> {
        self.opened = true;
        Ok(())
    }

    async fn read_batch(&mut self, tags: &[String]) -> Result<Vec<Sample>, PlcError> {
        if !self.opened {
            return Err(PlcError::Unreachable("transport not open".into()));
        }
        let timestamp_ms = self.next_timestamp_ms;
        let value = self.next_value;
        self.next_value += 10.0;
        self.next_timestamp_ms += 1_000;
        Ok(tags
            .iter()
            .map(|tag| Sample::new(timestamp_ms, tag.clone(), value, oee_domain::Quality::GOOD))
            .collect())
    }

    async fn close(&mut self) -> Result<(), PlcError> {
        self.opened = false;
        Ok(())
    }
}

/// A transport placeholder for a protocol family not yet wired into this
/// build. Kept as a distinct type (rather than silently falling back to
/// `Simulated`) so misconfiguration fails loudly at `open`, per §4.1
/// ("malformed tag config → fail during `open`").
pub struct UnwiredTransport {
    protocol_name: &'static str,
}

impl UnwiredTransport {
    /// Creates a placeholder for the named protocol family.
    pub fn new(protocol_name: &'static str) -> Self {
        Self { protocol_name }
    }
}

#[async_trait]
impl PlcTransport for UnwiredTransport {
    async fn open(&mut self) -> Result<(), PlcError> {
        Err(PlcError::Protocol(format!("{} transport is not linked into this build", self.protocol_name)))
    }

    async fn read_batch(&mut self, _tags: &[String]) -> Result<Vec<Sample>, PlcError> {
        Err(PlcError::Protocol(format!("{} transport is not linked into this build", self.protocol_name)))
    }

    async fn close(&mut self) -> Result<(), PlcError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_transport_emits_ascending_values() {
        let mut transport = SimulatedTransport::new();
        transport.open().await.unwrap();
        let first = transport.read_batch(&["ns=2;s=Good".into()]).await.unwrap();
        let second = transport.read_batch(&["ns=2;s=Good".into()]).await.unwrap();
        assert_eq!(first[0].value, 100.0);
        assert_eq!(second[0].value, 110.0);
    }

    #[tokio::test]
    async fn read_before_open_is_unreachable() {
        let mut transport = SimulatedTransport::new();
        let err = transport.read_batch(&["t".into()]).await.unwrap_err();
        assert!(matches!(err, PlcError::Unreachable(_)));
    }
}
