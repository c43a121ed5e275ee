//! DeepDrop: two peers meet in a named room on a small relay, negotiate a
//! direct channel, and then exchange chat and files over it.
//!
//! The crate provides one binary, `deepdrop-relay`, and the peer-side pieces
//! an application needs around its own connection stack.

/// INI-style configuration loading.
pub mod config;
/// Logging utilities.
pub mod log;
/// Peer-side offer/answer/candidate state machine.
pub mod negotiation;
/// Rendezvous relay: rooms, membership and signal forwarding.
pub mod relay;
/// Peer-side client of the relay.
pub mod relay_client;
/// Chunked file transfer, chat and typing over the peer data channel.
pub mod transfer;
