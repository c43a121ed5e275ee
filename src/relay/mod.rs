//! Rendezvous relay: rooms, membership broadcast and at-most-once forwarding
//! of negotiation signals between sessions.

pub mod engine;
pub mod protocol;
pub mod registry;
pub mod relay_server;
pub mod roles;
pub mod router;
pub mod run;
pub mod runtime;
pub mod server_event;
pub mod transport;
pub mod types;

pub use engine::SignalingRelay;
pub use registry::RoomRegistry;
pub use relay_server::RelayServer;
pub use roles::{Role, derive_role};
pub use run::{run_relay, run_relay_with_log};
pub use types::{ConnId, OutgoingMsg, RoomId, SessionId};
