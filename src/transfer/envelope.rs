use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use std::io::{Cursor, Read, Write};

use super::errors::EnvelopeError;

/// Largest payload a single chunk may carry.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024;

/// One message on the peer data channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEnvelope {
    Meta {
        file_name: String,
        size: u64,
    },
    Chunk {
        file_name: String,
        index: u32,
        total_chunks: u32,
        data: Bytes,
    },
    Complete {
        file_name: String,
    },
    Chat {
        text: String,
    },
    Typing,
}

impl TransferEnvelope {
    const KIND_META: u8 = 1;
    const KIND_CHUNK: u8 = 2;
    const KIND_COMPLETE: u8 = 3;
    const KIND_CHAT: u8 = 4;
    const KIND_TYPING: u8 = 5;

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Meta { .. } => "meta",
            Self::Chunk { .. } => "chunk",
            Self::Complete { .. } => "complete",
            Self::Chat { .. } => "chat",
            Self::Typing => "typing",
        }
    }

    /// File this envelope belongs to, if it is a transfer envelope.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Meta { file_name, .. }
            | Self::Chunk { file_name, .. }
            | Self::Complete { file_name } => Some(file_name),
            Self::Chat { .. } | Self::Typing => None,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, EnvelopeError> {
        let mut buf = Vec::new();
        match self {
            Self::Meta { file_name, size } => {
                buf.write_u8(Self::KIND_META)?;
                write_str16(&mut buf, file_name)?;
                buf.write_u64::<BigEndian>(*size)?;
            }
            Self::Chunk {
                file_name,
                index,
                total_chunks,
                data,
            } => {
                if data.len() > MAX_CHUNK_SIZE {
                    return Err(EnvelopeError::ChunkTooLarge(data.len()));
                }
                buf.reserve(data.len() + file_name.len() + 15);
                buf.write_u8(Self::KIND_CHUNK)?;
                write_str16(&mut buf, file_name)?;
                buf.write_u32::<BigEndian>(*index)?;
                buf.write_u32::<BigEndian>(*total_chunks)?;
                buf.write_u32::<BigEndian>(data.len() as u32)?;
                buf.write_all(data)?;
            }
            Self::Complete { file_name } => {
                buf.write_u8(Self::KIND_COMPLETE)?;
                write_str16(&mut buf, file_name)?;
            }
            Self::Chat { text } => {
                buf.write_u8(Self::KIND_CHAT)?;
                let bytes = text.as_bytes();
                buf.write_u32::<BigEndian>(bytes.len() as u32)?;
                buf.write_all(bytes)?;
            }
            Self::Typing => buf.write_u8(Self::KIND_TYPING)?,
        }
        Ok(buf)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, EnvelopeError> {
        let mut cursor = Cursor::new(data);
        let kind = cursor.read_u8()?;

        let envelope = match kind {
            Self::KIND_META => {
                let file_name = read_str16(&mut cursor)?;
                let size = cursor.read_u64::<BigEndian>()?;
                Self::Meta { file_name, size }
            }
            Self::KIND_CHUNK => {
                let file_name = read_str16(&mut cursor)?;
                let index = cursor.read_u32::<BigEndian>()?;
                let total_chunks = cursor.read_u32::<BigEndian>()?;
                let len = cursor.read_u32::<BigEndian>()? as usize;
                if len > MAX_CHUNK_SIZE {
                    return Err(EnvelopeError::ChunkTooLarge(len));
                }
                let mut payload = vec![0u8; len];
                cursor.read_exact(&mut payload)?;
                Self::Chunk {
                    file_name,
                    index,
                    total_chunks,
                    data: Bytes::from(payload),
                }
            }
            Self::KIND_COMPLETE => Self::Complete {
                file_name: read_str16(&mut cursor)?,
            },
            Self::KIND_CHAT => {
                let len = cursor.read_u32::<BigEndian>()? as usize;
                let remaining = data.len().saturating_sub(cursor.position() as usize);
                if len > remaining {
                    return Err(EnvelopeError::Io(std::io::ErrorKind::UnexpectedEof.into()));
                }
                let mut text = vec![0u8; len];
                cursor.read_exact(&mut text)?;
                Self::Chat {
                    text: String::from_utf8(text).map_err(|_| EnvelopeError::InvalidUtf8)?,
                }
            }
            Self::KIND_TYPING => Self::Typing,
            unknown => return Err(EnvelopeError::UnknownKind(unknown)),
        };

        let trailing = data.len().saturating_sub(cursor.position() as usize);
        if trailing != 0 {
            return Err(EnvelopeError::TrailingBytes(trailing));
        }
        Ok(envelope)
    }
}

fn write_str16(buf: &mut Vec<u8>, s: &str) -> Result<(), EnvelopeError> {
    let bytes = s.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(EnvelopeError::NameTooLong(bytes.len()));
    }
    buf.write_u16::<BigEndian>(bytes.len() as u16)?;
    buf.write_all(bytes)?;
    Ok(())
}

fn read_str16(cursor: &mut Cursor<&[u8]>) -> Result<String, EnvelopeError> {
    let len = cursor.read_u16::<BigEndian>()?;
    let mut bytes = vec![0u8; len as usize];
    cursor.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| EnvelopeError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn chunk_keeps_its_payload() {
        let env = TransferEnvelope::Chunk {
            file_name: "photo.jpg".into(),
            index: 3,
            total_chunks: 9,
            data: Bytes::from_static(b"\x00\x01\x02binary"),
        };
        let wire = env.serialize().unwrap();
        assert_eq!(wire[0], 2);
        assert_eq!(TransferEnvelope::deserialize(&wire).unwrap(), env);
    }

    #[test]
    fn typing_is_a_single_byte() {
        assert_eq!(TransferEnvelope::Typing.serialize().unwrap(), vec![5]);
    }

    #[test]
    fn oversized_chunk_is_refused_both_ways() {
        let env = TransferEnvelope::Chunk {
            file_name: "big".into(),
            index: 0,
            total_chunks: 1,
            data: Bytes::from(vec![0u8; MAX_CHUNK_SIZE + 1]),
        };
        assert!(matches!(env.serialize(), Err(EnvelopeError::ChunkTooLarge(_))));

        let mut wire = vec![2, 0, 1, b'x'];
        wire.extend_from_slice(&0u32.to_be_bytes());
        wire.extend_from_slice(&1u32.to_be_bytes());
        wire.extend_from_slice(&((MAX_CHUNK_SIZE as u32) + 1).to_be_bytes());
        assert!(matches!(
            TransferEnvelope::deserialize(&wire),
            Err(EnvelopeError::ChunkTooLarge(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            TransferEnvelope::deserialize(&[42]),
            Err(EnvelopeError::UnknownKind(42))
        ));
        assert!(matches!(
            TransferEnvelope::deserialize(&[]),
            Err(EnvelopeError::Io(_))
        ));
        assert!(matches!(
            TransferEnvelope::deserialize(&[5, 0]),
            Err(EnvelopeError::TrailingBytes(1))
        ));
        // chat claiming 4 GiB of text
        assert!(matches!(
            TransferEnvelope::deserialize(&[4, 0xff, 0xff, 0xff, 0xff]),
            Err(EnvelopeError::Io(_))
        ));
    }
}
