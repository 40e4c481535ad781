//! The `AsyncReceiver<PipelineMessage>` implementation shared by every PLC
//! protocol variant, parameterized over a [`PlcTransport`], per §4.1.

use async_trait::async_trait;
use oee_domain::{BackpressureHandle, PipelineMessage, Sample};
use receiver::{effect::EffectHandler, signal::Signal, signal::SignalReceiver, AsyncReceiver, Error as ReceiverError};

use crate::{backoff::ReconnectBackoff, config::PlcEndpointConfig, transport::PlcTransport};

/// Lower bound the Backpressure Controller may widen the sampling interval
/// to, per §4.1 ("250 ms -> up to 2000 ms").
pub const MIN_SAMPLING_MS: u64 = 250;
/// Upper bound the Backpressure Controller may widen the sampling interval
/// to, per §4.1.
pub const MAX_SAMPLING_MS: u64 = 2_000;

/// A PLC driver receiver, generic over the protocol-specific transport.
pub struct PlcReceiver<T: PlcTransport> {
    name: String,
    config: PlcEndpointConfig,
    transport: T,
    backpressure: BackpressureHandle,
}

impl<T: PlcTransport> PlcReceiver<T> {
    /// Creates a new receiver for `config`, owning `transport`. Starts
    /// unthrottled; wire in a shared [`BackpressureHandle`] with
    /// [`PlcReceiver::with_backpressure`] to let the Backpressure Controller
    /// (C5) widen its sampling interval at runtime.
    pub fn new(name: impl Into<String>, config: PlcEndpointConfig, transport: T) -> Self {
        Self {
            name: name.into(),
            config,
            transport,
            backpressure: BackpressureHandle::new(),
        }
    }

    /// Replaces this receiver's backpressure handle with one shared across
    /// every PLC driver this edge node runs, so a single store-and-forward
    /// buffer's fill ratio throttles all of them together.
    pub fn with_backpressure(mut self, handle: BackpressureHandle) -> Self {
        self.backpressure = handle;
        self
    }

    /// A clone of the handle this receiver reads to learn the Backpressure
    /// Controller's current regime.
    pub fn backpressure_handle(&self) -> BackpressureHandle {
        self.backpressure.clone()
    }
}

#[async_trait]
impl<T: PlcTransport + 'static> AsyncReceiver<PipelineMessage> for PlcReceiver<T> {
    async fn receive(&mut self, mut signal_receiver: SignalReceiver, effect_handler: EffectHandler<PipelineMessage>) -> Result<(), ReceiverError> {
        let mut backoff = ReconnectBackoff::default();

        loop {
            match self.transport.open().await {
                Ok(()) => {
                    backoff.reset();
                    tracing::info!(receiver = %self.name, "plc endpoint opened");
                    break;
                }
                Err(error) if error.is_transient() => {
                    let delay = backoff.next_delay();
                    tracing::warn!(receiver = %self.name, %error, delay_ms = %delay.as_millis(), "plc endpoint open failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    tracing::error!(receiver = %self.name, %error, "plc endpoint open failed fatally");
                    return Err(ReceiverError::Receiver {
                        receiver: self.name.clone(),
                        error: error.to_string(),
                        context: Default::default(),
                    });
                }
            }
        }

        loop {
            let sampling_ms = self
                .config
                .sampling_ms
                .saturating_mul(u64::from(self.backpressure.multiplier()))
                .clamp(MIN_SAMPLING_MS, MAX_SAMPLING_MS);
            let sleep = tokio::time::sleep(std::time::Duration::from_millis(sampling_ms));
            tokio::select! {
                signal = signal_receiver.recv() => {
                    if matches!(signal, Signal::Stop) {
                        break;
                    }
                }
                () = sleep => {
                    match self.transport.read_batch(&self.config.tags).await {
                        Ok(samples) => {
                            let messages = samples.into_iter().map(PipelineMessage::Sample).collect();
                            effect_handler.send_messages(messages).await?;
                        }
                        Err(error) if error.is_transient() => {
                            tracing::warn!(receiver = %self.name, %error, "plc read_batch failed, emitting bad-quality samples");
                            let degraded: Vec<PipelineMessage> = self
                                .config
                                .tags
                                .iter()
                                .map(|tag| PipelineMessage::Sample(Sample::bad(0, tag.clone())))
                                .collect();
                            effect_handler.send_messages(degraded).await?;
                        }
                        Err(error) => {
                            tracing::error!(receiver = %self.name, %error, "plc read_batch failed fatally");
                            return Err(ReceiverError::Receiver {
                                receiver: self.name.clone(),
                                error: error.to_string(),
                                context: Default::default(),
                            });
                        }
                    }
                }
            }
        }

        if let Err(error) = self.transport.close().await {
            tracing::warn!(receiver = %self.name, %error, "plc endpoint close failed");
        }
        Ok(())
    }
}
