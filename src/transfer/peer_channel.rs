use std::sync::Arc;
use std::time::Instant;

use super::arena::ReceiveArena;
use super::envelope::TransferEnvelope;
use super::events::TransferEvent;
use super::transfer_config::TransferConfig;
use crate::log::LogSink;
use crate::relay::types::SessionId;
use crate::{sink_debug, sink_warn};

/// Inbound dispatcher for one peer's data channel.
///
/// Decodes every message and routes it: chat and typing straight to events,
/// file envelopes into the receive arena. Malformed messages are logged and
/// skipped.
pub struct PeerChannel {
    peer: SessionId,
    arena: ReceiveArena,
    log: Arc<dyn LogSink>,
}

impl PeerChannel {
    pub fn new(peer: SessionId, config: &TransferConfig, log: Arc<dyn LogSink>) -> Self {
        Self {
            peer,
            arena: ReceiveArena::new(config.receive_timeout, log.clone()),
            log,
        }
    }

    pub fn peer(&self) -> &SessionId {
        &self.peer
    }

    pub fn arena(&self) -> &ReceiveArena {
        &self.arena
    }

    pub fn on_message(&mut self, data: &[u8], now: Instant) -> Vec<TransferEvent> {
        let envelope = match TransferEnvelope::deserialize(data) {
            Ok(e) => e,
            Err(e) => {
                sink_warn!(
                    self.log,
                    "[peer-channel] skipping malformed message from {} ({} bytes): {}",
                    self.peer,
                    data.len(),
                    e
                );
                return Vec::new();
            }
        };

        match envelope {
            TransferEnvelope::Chat { text } => {
                sink_debug!(self.log, "[peer-channel] chat from {}", self.peer);
                vec![TransferEvent::Chat {
                    peer: self.peer.clone(),
                    text,
                }]
            }
            TransferEnvelope::Typing => vec![TransferEvent::Typing {
                peer: self.peer.clone(),
            }],
            TransferEnvelope::Meta { file_name, size } => {
                self.arena.on_meta(&self.peer, &file_name, size, now)
            }
            TransferEnvelope::Chunk {
                file_name,
                index,
                total_chunks,
                data,
            } => self
                .arena
                .on_chunk(&self.peer, &file_name, index, total_chunks, data, now),
            TransferEnvelope::Complete { file_name } => {
                self.arena.on_complete(&self.peer, &file_name)
            }
        }
    }

    pub fn cancel(&mut self, file_name: &str) -> Option<TransferEvent> {
        self.arena.cancel(&self.peer, file_name)
    }

    /// Channel went away: everything in flight fails.
    pub fn close(&mut self) -> Vec<TransferEvent> {
        self.arena.cancel_peer(&self.peer)
    }

    /// Periodic housekeeping; reports timed-out transfers.
    pub fn tick(&mut self, now: Instant) -> Vec<TransferEvent> {
        self.arena.evict_expired(now)
    }
}
