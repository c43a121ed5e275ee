use std::sync::Arc;

use super::backpressure::BackpressureGate;
use super::channel::ChannelGateway;
use super::chunker::ChunkPlan;
use super::envelope::TransferEnvelope;
use super::errors::TransferError;
use super::events::{SendProgress, percent};
use super::source::FileSource;
use super::transfer_config::TransferConfig;
use crate::log::LogSink;
use crate::{sink_debug, sink_info, transfer_log};

/// Outbound side of the data channel: files, chat and typing notices.
pub struct TransferSender<C: ChannelGateway> {
    channel: C,
    gate: BackpressureGate,
    chunk_size: usize,
    log: Arc<dyn LogSink>,
}

impl<C: ChannelGateway> TransferSender<C> {
    pub fn new(channel: C, config: &TransferConfig, log: Arc<dyn LogSink>) -> Self {
        Self {
            channel,
            gate: BackpressureGate::new(config.buffered_threshold, config.poll_interval),
            chunk_size: config.chunk_size,
            log,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Send one file: `Meta`, every chunk, `Complete`.
    ///
    /// Each chunk waits behind the backpressure gate, during which `idle` runs
    /// so the caller can keep draining inbound messages. `progress` fires
    /// after every chunk is handed to the channel.
    pub fn send_file<P, I>(
        &mut self,
        source: &FileSource,
        mut progress: P,
        mut idle: I,
    ) -> Result<(), TransferError>
    where
        P: FnMut(SendProgress),
        I: FnMut(),
    {
        let plan = ChunkPlan::new(source, self.chunk_size)?;
        let total_chunks = plan.total_chunks();
        sink_info!(
            self.log,
            "[transfer] sending {} ({} bytes, {} chunks)",
            source.name(),
            source.size(),
            total_chunks
        );

        for envelope in plan {
            let is_chunk = matches!(envelope, TransferEnvelope::Chunk { .. });
            if is_chunk {
                let waits = self.gate.wait(&self.channel, &mut idle)?;
                if waits > 0 {
                    sink_debug!(
                        self.log,
                        "[transfer] {} held back for {} polls",
                        source.name(),
                        waits
                    );
                }
            }

            self.send_envelope(&envelope)?;

            if let TransferEnvelope::Chunk { index, .. } = envelope {
                transfer_log!(self.log, "[transfer] sent chunk {}/{}", index + 1, total_chunks);
                progress(SendProgress {
                    sent_chunks: index + 1,
                    total_chunks,
                    percent: percent(index + 1, total_chunks),
                });
            }
        }

        sink_info!(self.log, "[transfer] sent {}", source.name());
        Ok(())
    }

    pub fn send_chat(&mut self, text: &str) -> Result<(), TransferError> {
        self.send_envelope(&TransferEnvelope::Chat {
            text: text.to_owned(),
        })
    }

    pub fn send_typing(&mut self) -> Result<(), TransferError> {
        self.send_envelope(&TransferEnvelope::Typing)
    }

    fn send_envelope(&mut self, envelope: &TransferEnvelope) -> Result<(), TransferError> {
        let bytes = envelope.serialize()?;
        self.channel.send(&bytes)?;
        Ok(())
    }
}
