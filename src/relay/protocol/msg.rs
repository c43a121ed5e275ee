use crate::relay::protocol::ProtoError;
use crate::relay::types::{RoomId, SessionId};

/// Kind of negotiation payload carried by a signal. The relay looks at nothing else.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SignalKind {
    Offer = 1,
    Answer = 2,
    Candidate = 3,
}

impl SignalKind {
    pub fn from_u8(v: u8) -> Result<Self, ProtoError> {
        match v {
            1 => Ok(SignalKind::Offer),
            2 => Ok(SignalKind::Answer),
            3 => Ok(SignalKind::Candidate),
            other => Err(ProtoError::UnknownSignalKind(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            SignalKind::Offer => "Offer",
            SignalKind::Answer => "Answer",
            SignalKind::Candidate => "Candidate",
        }
    }
}

/// Where a signal goes: one named session, or every other member of the sender's room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignalTarget {
    Peer(SessionId),
    Room,
}

/// Opaque negotiation message relayed between two sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalEnvelope {
    pub to: SignalTarget,
    /// Stamped by the relay with the actual sender before forwarding.
    pub from: SessionId,
    pub kind: SignalKind,
    pub payload: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelayMsg {
    /// relay → client, once per connection: the id the relay assigned.
    Welcome { session_id: SessionId },

    /// client → relay
    Join { room: RoomId },
    /// relay → joiner
    Joined { room: RoomId },
    /// relay → every room member after a join. Members are sorted.
    Membership {
        room: RoomId,
        members: Vec<SessionId>,
    },

    /// client → relay → client
    Signal(SignalEnvelope),

    // Keepalive
    Ping { nonce: u64 },
    Pong { nonce: u64 },
}

impl RelayMsg {
    /// Short variant name for logs; never includes payloads.
    pub fn name(&self) -> &'static str {
        match self {
            RelayMsg::Welcome { .. } => "Welcome",
            RelayMsg::Join { .. } => "Join",
            RelayMsg::Joined { .. } => "Joined",
            RelayMsg::Membership { .. } => "Membership",
            RelayMsg::Signal(env) => env.kind.name(),
            RelayMsg::Ping { .. } => "Ping",
            RelayMsg::Pong { .. } => "Pong",
        }
    }
}
