use std::{fmt, io};

/// Failure to encode or decode a transfer envelope.
#[derive(Debug)]
pub enum EnvelopeError {
    /// Ran out of bytes (or failed to write them).
    Io(io::Error),
    UnknownKind(u8),
    InvalidUtf8,
    /// A chunk payload above the 64 KiB cap.
    ChunkTooLarge(usize),
    NameTooLong(usize),
    TrailingBytes(usize),
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "envelope I/O: {e}"),
            Self::UnknownKind(k) => write!(f, "unknown envelope kind {k}"),
            Self::InvalidUtf8 => write!(f, "invalid UTF-8 in envelope"),
            Self::ChunkTooLarge(n) => write!(f, "chunk of {n} bytes exceeds 64 KiB"),
            Self::NameTooLong(n) => write!(f, "string of {n} bytes does not fit"),
            Self::TrailingBytes(n) => write!(f, "{n} trailing bytes after envelope"),
        }
    }
}

impl std::error::Error for EnvelopeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EnvelopeError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Failure reported by a [`ChannelGateway`](super::ChannelGateway).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    Closed,
    Send(String),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "channel closed"),
            Self::Send(why) => write!(f, "channel send failed: {why}"),
        }
    }
}

impl std::error::Error for ChannelError {}

/// Why a completed transfer could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncompleteReason {
    MissingChunks { received: u32, total: u32 },
    SizeMismatch { expected: u64, actual: u64 },
}

#[derive(Debug)]
pub enum TransferError {
    /// Completion arrived but the data does not add up.
    Incomplete {
        file_name: String,
        reason: IncompleteReason,
    },
    /// A chunk contradicts what we know about the file.
    InvalidChunk {
        file_name: String,
        reason: &'static str,
    },
    /// No traffic for the file within the receive timeout.
    Timeout { file_name: String },
    Cancelled { file_name: String },
    /// The file needs more chunks than a 32-bit index can address.
    TooManyChunks { file_name: String, size: u64 },
    Channel(ChannelError),
    Envelope(EnvelopeError),
    Io(io::Error),
}

impl TransferError {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incomplete { file_name, reason } => match reason {
                IncompleteReason::MissingChunks { received, total } => write!(
                    f,
                    "transfer of {file_name} incomplete: {received}/{total} chunks"
                ),
                IncompleteReason::SizeMismatch { expected, actual } => write!(
                    f,
                    "transfer of {file_name} incomplete: {actual} of {expected} bytes"
                ),
            },
            Self::InvalidChunk { file_name, reason } => {
                write!(f, "invalid chunk for {file_name}: {reason}")
            }
            Self::Timeout { file_name } => write!(f, "transfer of {file_name} timed out"),
            Self::Cancelled { file_name } => write!(f, "transfer of {file_name} cancelled"),
            Self::TooManyChunks { file_name, size } => {
                write!(f, "{file_name} ({size} bytes) needs more than {} chunks", u32::MAX)
            }
            Self::Channel(e) => write!(f, "{e}"),
            Self::Envelope(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Channel(e) => Some(e),
            Self::Envelope(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ChannelError> for TransferError {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}

impl From<EnvelopeError> for TransferError {
    fn from(e: EnvelopeError) -> Self {
        Self::Envelope(e)
    }
}

impl From<io::Error> for TransferError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
