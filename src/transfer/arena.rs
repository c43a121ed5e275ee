use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::errors::TransferError;
use super::events::{DeliveredFile, TransferEvent, percent};
use super::incoming::{IncomingFile, ReceiveState};
use crate::log::LogSink;
use crate::relay::types::SessionId;
use crate::{sink_debug, sink_info, sink_warn, transfer_log};

type BufferKey = (SessionId, String);

/// Owns every in-flight receive buffer, keyed by (peer, file name).
///
/// Buffers leave the arena on delivery, failure, cancel or timeout. A transfer
/// that failed leaves a tombstone behind so its stragglers are dropped instead
/// of opening a new buffer; the next `Meta` or `evict_expired` clears it.
pub struct ReceiveArena {
    buffers: HashMap<BufferKey, IncomingFile>,
    ended: HashMap<BufferKey, Instant>,
    timeout: Duration,
    log: Arc<dyn LogSink>,
}

impl ReceiveArena {
    pub fn new(timeout: Duration, log: Arc<dyn LogSink>) -> Self {
        Self {
            buffers: HashMap::new(),
            ended: HashMap::new(),
            timeout,
            log,
        }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Whether late envelopes for this file are currently being dropped.
    pub fn is_ended(&self, peer: &SessionId, file_name: &str) -> bool {
        self.ended.contains_key(&(peer.clone(), file_name.to_owned()))
    }

    pub fn state_of(&self, peer: &SessionId, file_name: &str) -> ReceiveState {
        self.buffers
            .get(&(peer.clone(), file_name.to_owned()))
            .map_or(ReceiveState::Idle, IncomingFile::state)
    }

    /// `Meta`: open (or reopen) the buffer for this file.
    pub fn on_meta(
        &mut self,
        peer: &SessionId,
        file_name: &str,
        size: u64,
        now: Instant,
    ) -> Vec<TransferEvent> {
        let key = (peer.clone(), file_name.to_owned());
        self.ended.remove(&key);
        if self.buffers.remove(&key).is_some() {
            sink_warn!(
                self.log,
                "[transfer] {} restarted {} before completing it",
                peer,
                file_name
            );
        }
        sink_info!(self.log, "[transfer] {} announced {} ({} bytes)", peer, file_name, size);
        self.buffers.insert(key, IncomingFile::from_meta(file_name, size, now));

        vec![TransferEvent::Started {
            peer: peer.clone(),
            file_name: file_name.to_owned(),
            size: Some(size),
        }]
    }

    /// `Chunk`: store it, opening the buffer if no `Meta` came first.
    pub fn on_chunk(
        &mut self,
        peer: &SessionId,
        file_name: &str,
        index: u32,
        total_chunks: u32,
        data: Bytes,
        now: Instant,
    ) -> Vec<TransferEvent> {
        let mut out = Vec::new();
        let key = (peer.clone(), file_name.to_owned());
        if self.ended.contains_key(&key) {
            sink_debug!(
                self.log,
                "[transfer] dropping chunk {} of ended {} from {}",
                index,
                file_name,
                peer
            );
            return out;
        }

        let buffer = self.buffers.entry(key.clone()).or_insert_with(|| {
            out.push(TransferEvent::Started {
                peer: peer.clone(),
                file_name: file_name.to_owned(),
                size: None,
            });
            IncomingFile::lazy(file_name, now)
        });

        transfer_log!(
            self.log,
            "[transfer] {} chunk {}/{} of {} ({} bytes)",
            peer,
            index + 1,
            total_chunks,
            file_name,
            data.len()
        );

        match buffer.accept_chunk(index, total_chunks, data, now) {
            Ok(()) => {
                let received = buffer.received_chunks();
                out.push(TransferEvent::Progress {
                    peer: peer.clone(),
                    file_name: file_name.to_owned(),
                    received_chunks: received,
                    total_chunks,
                    percent: percent(received, total_chunks),
                });
            }
            Err(error) => {
                self.buffers.remove(&key);
                self.ended.insert(key, now);
                sink_warn!(self.log, "[transfer] {} from {}: {}", file_name, peer, error);
                out.push(TransferEvent::Failed {
                    peer: peer.clone(),
                    file_name: file_name.to_owned(),
                    error,
                });
            }
        }
        out
    }

    /// `Complete`: verify, reassemble and hand the file over.
    pub fn on_complete(&mut self, peer: &SessionId, file_name: &str) -> Vec<TransferEvent> {
        let key = (peer.clone(), file_name.to_owned());
        if self.ended.contains_key(&key) {
            sink_debug!(
                self.log,
                "[transfer] ignoring completion of ended {} from {}",
                file_name,
                peer
            );
            return Vec::new();
        }

        let Some(buffer) = self.buffers.remove(&key) else {
            // Nothing was ever announced or sent: a zero-chunk file.
            sink_debug!(self.log, "[transfer] {} completed {} with no data", peer, file_name);
            return vec![TransferEvent::Delivered(DeliveredFile {
                peer: peer.clone(),
                file_name: file_name.to_owned(),
                data: Bytes::new(),
            })];
        };

        match buffer.finish() {
            Ok(data) => {
                sink_info!(
                    self.log,
                    "[transfer] received {} from {} ({} bytes)",
                    file_name,
                    peer,
                    data.len()
                );
                vec![TransferEvent::Delivered(DeliveredFile {
                    peer: peer.clone(),
                    file_name: file_name.to_owned(),
                    data,
                })]
            }
            Err(error) => {
                sink_warn!(self.log, "[transfer] {} from {}: {}", file_name, peer, error);
                vec![TransferEvent::Failed {
                    peer: peer.clone(),
                    file_name: file_name.to_owned(),
                    error,
                }]
            }
        }
    }

    /// Drop a buffer on request. Returns the failure event if one existed.
    pub fn cancel(&mut self, peer: &SessionId, file_name: &str) -> Option<TransferEvent> {
        let key = (peer.clone(), file_name.to_owned());
        let buffer = self.buffers.remove(&key)?;
        self.ended.insert(key, buffer.last_activity());
        sink_info!(self.log, "[transfer] cancelled {} from {}", file_name, peer);
        Some(TransferEvent::Failed {
            peer: peer.clone(),
            file_name: file_name.to_owned(),
            error: TransferError::Cancelled {
                file_name: file_name.to_owned(),
            },
        })
    }

    /// Drop every buffer of `peer`, e.g. when its channel closes.
    pub fn cancel_peer(&mut self, peer: &SessionId) -> Vec<TransferEvent> {
        let names: Vec<String> = self
            .buffers
            .keys()
            .filter(|(p, _)| p == peer)
            .map(|(_, name)| name.clone())
            .collect();
        names
            .iter()
            .filter_map(|name| self.cancel(peer, name))
            .collect()
    }

    /// Drop buffers idle longer than the timeout, and tombstones as old.
    pub fn evict_expired(&mut self, now: Instant) -> Vec<TransferEvent> {
        let timeout = self.timeout;
        self.ended.retain(|_, at| now.saturating_duration_since(*at) <= timeout);
        let expired: Vec<BufferKey> = self
            .buffers
            .iter()
            .filter(|(_, f)| f.is_expired(now, timeout))
            .map(|(k, _)| k.clone())
            .collect();

        let mut out = Vec::with_capacity(expired.len());
        for (peer, file_name) in expired {
            let key = (peer.clone(), file_name.clone());
            self.buffers.remove(&key);
            self.ended.insert(key, now);
            sink_warn!(
                self.log,
                "[transfer] {} from {} timed out after {:?}",
                file_name,
                peer,
                timeout
            );
            out.push(TransferEvent::Failed {
                error: TransferError::Timeout {
                    file_name: file_name.clone(),
                },
                peer,
                file_name,
            });
        }
        out
    }
}
