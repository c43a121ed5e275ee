use std::{fmt, io};

/// Body parsing / format errors.
#[derive(Debug)]
pub enum ProtoError {
    UnknownType(u8),
    UnknownSignalKind(u8),
    UnknownTarget(u8),
    Truncated,
    InvalidUtf8,
    TooLarge,
    InvalidFormat(&'static str),
    StringTooLong { max: usize, actual: usize },
}

impl fmt::Display for ProtoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType(t) => write!(f, "unknown message type 0x{t:02x}"),
            Self::UnknownSignalKind(k) => write!(f, "unknown signal kind {k}"),
            Self::UnknownTarget(t) => write!(f, "unknown signal target tag {t}"),
            Self::Truncated => write!(f, "message body truncated"),
            Self::InvalidUtf8 => write!(f, "string is not valid UTF-8"),
            Self::TooLarge => write!(f, "frame body exceeds limit"),
            Self::InvalidFormat(what) => write!(f, "invalid format: {what}"),
            Self::StringTooLong { max, actual } => {
                write!(f, "string of {actual} bytes exceeds {max}")
            }
        }
    }
}

impl std::error::Error for ProtoError {}

/// Frame-level error: transport IO vs protocol.
#[derive(Debug)]
pub enum FrameError {
    Io(io::Error),
    Proto(ProtoError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Proto(e) => write!(f, "protocol error: {e}"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Proto(e) => Some(e),
        }
    }
}

impl From<io::Error> for FrameError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ProtoError> for FrameError {
    fn from(e: ProtoError) -> Self {
        Self::Proto(e)
    }
}
