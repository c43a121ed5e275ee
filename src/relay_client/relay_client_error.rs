use std::{fmt, io};

use crate::relay::protocol::FrameError;

/// Errors surfaced by [`RelayClient`](super::RelayClient).
#[derive(Debug)]
pub enum RelayClientError {
    Io(io::Error),
    Frame(FrameError),
    /// The relay spoke first with something other than `Welcome`.
    UnexpectedGreeting(&'static str),
    /// The network thread has exited.
    Disconnected,
}

impl fmt::Display for RelayClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Frame(e) => write!(f, "protocol error: {e}"),
            Self::UnexpectedGreeting(name) => write!(f, "expected Welcome, got {name}"),
            Self::Disconnected => write!(f, "relay client disconnected"),
        }
    }
}

impl std::error::Error for RelayClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Frame(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RelayClientError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<FrameError> for RelayClientError {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}
