use bytes::Bytes;

use super::errors::TransferError;
use crate::relay::types::SessionId;

/// A fully reassembled file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredFile {
    pub peer: SessionId,
    pub file_name: String,
    pub data: Bytes,
}

/// Sender-side progress after a chunk is handed to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendProgress {
    pub sent_chunks: u32,
    pub total_chunks: u32,
    pub percent: u8,
}

/// What inbound data-channel traffic produced, for the application to render.
#[derive(Debug)]
pub enum TransferEvent {
    Started {
        peer: SessionId,
        file_name: String,
        size: Option<u64>,
    },
    Progress {
        peer: SessionId,
        file_name: String,
        received_chunks: u32,
        total_chunks: u32,
        percent: u8,
    },
    Delivered(DeliveredFile),
    Failed {
        peer: SessionId,
        file_name: String,
        error: TransferError,
    },
    Chat {
        peer: SessionId,
        text: String,
    },
    Typing {
        peer: SessionId,
    },
}

/// `done` out of `total` as a whole percentage; an empty total counts as done.
pub fn percent(done: u32, total: u32) -> u8 {
    if total == 0 {
        return 100;
    }
    ((u64::from(done.min(total)) * 100) / u64::from(total)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_down_and_caps() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(5, 3), 100);
        assert_eq!(percent(0, 0), 100);
    }
}
