//! Relay wire protocol.
//!
//! Frame header:
//!   `[ver: u8][msg_type: u8][flags: u16][body_len: u32]` (big-endian)
//! Body:
//!   message fields, up to [`MAX_BODY_LEN`] bytes.
//!
//! Strings are `str16` (u16 length + UTF-8), opaque blobs are `u32` length + bytes.

pub mod codec;
pub mod errors;
pub mod framing;
pub mod msg;
pub mod msg_type;

pub use codec::{decode_msg, encode_msg};
pub use errors::{FrameError, ProtoError};
pub use framing::{read_frame, read_msg, write_frame, write_msg};
pub use msg::{RelayMsg, SignalEnvelope, SignalKind, SignalTarget};
pub use msg_type::MsgType;

/// Protocol version (first byte in the frame header).
pub const PROTO_VERSION: u8 = 1;

/// Maximum allowed body size for a frame.
pub const MAX_BODY_LEN: usize = 1_048_576; // 1 MiB
