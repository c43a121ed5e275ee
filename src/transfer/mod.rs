//! Chunked file transfer, chat and typing over an open peer data channel.
//!
//! Envelopes are binary (`[kind u8]` then big-endian fields). A file travels
//! as one `Meta`, its chunks in index order, then `Complete`; the receiver
//! verifies the chunk count and byte size before delivering.

pub mod arena;
pub mod backpressure;
pub mod channel;
pub mod chunker;
pub mod envelope;
pub mod errors;
pub mod events;
pub mod incoming;
pub mod peer_channel;
pub mod sender;
pub mod source;
pub mod storage;
pub mod transfer_config;


pub use arena::ReceiveArena;
pub use backpressure::BackpressureGate;
pub use channel::{ChannelGateway, MemoryChannel, memory_channel_pair};
pub use chunker::{ChunkPlan, chunk_count};
pub use envelope::{MAX_CHUNK_SIZE, TransferEnvelope};
pub use errors::{ChannelError, EnvelopeError, IncompleteReason, TransferError};
pub use events::{DeliveredFile, SendProgress, TransferEvent};
pub use incoming::ReceiveState;
pub use peer_channel::PeerChannel;
pub use sender::TransferSender;
pub use source::FileSource;
pub use storage::{sanitize_file_name, save_delivered};
pub use transfer_config::TransferConfig;
