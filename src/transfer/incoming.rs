use bytes::{Bytes, BytesMut};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::errors::{IncompleteReason, TransferError};

/// Where a receive stands. `Idle` means nothing is known about the file yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveState {
    Idle,
    AwaitingChunks,
    Reassembling,
    Delivered,
    Failed,
}

/// Reassembly buffer for one inbound file.
#[derive(Debug)]
pub struct IncomingFile {
    file_name: String,
    expected_size: Option<u64>,
    total_chunks: Option<u32>,
    slots: BTreeMap<u32, Bytes>,
    received_chunks: u32,
    received_bytes: u64,
    last_activity: Instant,
    state: ReceiveState,
}

impl IncomingFile {
    /// Buffer opened by a `Meta` envelope.
    pub fn from_meta(file_name: &str, size: u64, now: Instant) -> Self {
        let mut f = Self::lazy(file_name, now);
        f.expected_size = Some(size);
        f
    }

    /// Buffer opened by a chunk that arrived without `Meta`.
    pub fn lazy(file_name: &str, now: Instant) -> Self {
        Self {
            file_name: file_name.to_owned(),
            expected_size: None,
            total_chunks: None,
            slots: BTreeMap::new(),
            received_chunks: 0,
            received_bytes: 0,
            last_activity: now,
            state: ReceiveState::AwaitingChunks,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn state(&self) -> ReceiveState {
        self.state
    }

    pub fn expected_size(&self) -> Option<u64> {
        self.expected_size
    }

    pub fn received_chunks(&self) -> u32 {
        self.received_chunks
    }

    pub fn total_chunks(&self) -> Option<u32> {
        self.total_chunks
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) > timeout
    }

    /// Store one chunk. A repeated index replaces the earlier copy.
    pub fn accept_chunk(
        &mut self,
        index: u32,
        total_chunks: u32,
        data: Bytes,
        now: Instant,
    ) -> Result<(), TransferError> {
        match self.total_chunks {
            None => self.total_chunks = Some(total_chunks),
            Some(t) if t != total_chunks => {
                self.state = ReceiveState::Failed;
                return Err(self.invalid("totalChunks changed mid-transfer"));
            }
            Some(_) => {}
        }

        if index >= total_chunks {
            self.state = ReceiveState::Failed;
            return Err(self.invalid("chunk index out of range"));
        }

        let len = data.len() as u64;
        match self.slots.insert(index, data) {
            Some(old) => {
                self.received_bytes = self.received_bytes - old.len() as u64 + len;
            }
            None => {
                self.received_chunks += 1;
                self.received_bytes += len;
            }
        }

        if let Some(expected) = self.expected_size
            && self.received_bytes > expected
        {
            self.state = ReceiveState::Failed;
            return Err(self.invalid("more bytes than announced"));
        }

        self.last_activity = now;
        Ok(())
    }

    /// Verify and concatenate. Consumes the buffer either way.
    pub fn finish(mut self) -> Result<Bytes, TransferError> {
        self.state = ReceiveState::Reassembling;
        let total = self.total_chunks.unwrap_or(0);

        if self.received_chunks != total {
            return Err(TransferError::Incomplete {
                file_name: self.file_name,
                reason: IncompleteReason::MissingChunks {
                    received: self.received_chunks,
                    total,
                },
            });
        }

        if let Some(expected) = self.expected_size
            && expected != self.received_bytes
        {
            return Err(TransferError::Incomplete {
                file_name: self.file_name,
                reason: IncompleteReason::SizeMismatch {
                    expected,
                    actual: self.received_bytes,
                },
            });
        }

        let mut out = BytesMut::with_capacity(self.received_bytes as usize);
        for slot in self.slots.into_values() {
            out.extend_from_slice(&slot);
        }
        Ok(out.freeze())
    }

    fn invalid(&self, reason: &'static str) -> TransferError {
        TransferError::InvalidChunk {
            file_name: self.file_name.clone(),
            reason,
        }
    }
}
