use crate::relay::protocol::SignalEnvelope;
use crate::relay::types::{RoomId, SessionId};

/// What the relay told us, as seen by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    Joined { room: RoomId },
    Membership {
        room: RoomId,
        members: Vec<SessionId>,
    },
    Signal(SignalEnvelope),
    Pong { nonce: u64 },
    /// Connection to the relay is gone; no more events follow.
    Disconnected,
}
