use super::{MsgType, ProtoError, RelayMsg, SignalEnvelope, SignalKind, SignalTarget};
use crate::relay::types::SessionId;
use std::str;

const TARGET_ROOM: u8 = 0;
const TARGET_PEER: u8 = 1;

// ---- Encode to body bytes -------------------------------------------------

pub fn encode_msg(msg: &RelayMsg) -> Result<(MsgType, Vec<u8>), ProtoError> {
    use RelayMsg::*;
    let mut body = Vec::new();

    let msg_type = match msg {
        Welcome { session_id } => {
            put_str16(&mut body, session_id.as_str())?;
            MsgType::Welcome
        }
        Join { room } => {
            put_str16(&mut body, room)?;
            MsgType::Join
        }
        Joined { room } => {
            put_str16(&mut body, room)?;
            MsgType::Joined
        }
        Membership { room, members } => {
            put_str16(&mut body, room)?;
            if members.len() > u16::MAX as usize {
                return Err(ProtoError::InvalidFormat("too many room members"));
            }
            put_u16(&mut body, members.len() as u16);
            for member in members {
                put_str16(&mut body, member.as_str())?;
            }
            MsgType::Membership
        }
        Signal(env) => {
            match &env.to {
                SignalTarget::Room => put_u8(&mut body, TARGET_ROOM),
                SignalTarget::Peer(id) => {
                    put_u8(&mut body, TARGET_PEER);
                    put_str16(&mut body, id.as_str())?;
                }
            }
            put_str16(&mut body, env.from.as_str())?;
            put_u8(&mut body, env.kind.as_u8());
            put_blob32(&mut body, &env.payload)?;
            MsgType::Signal
        }
        Ping { nonce } => {
            put_u64(&mut body, *nonce);
            MsgType::Ping
        }
        Pong { nonce } => {
            put_u64(&mut body, *nonce);
            MsgType::Pong
        }
    };

    Ok((msg_type, body))
}

// ---- Decode from body bytes ----------------------------------------------

pub fn decode_msg(msg_type: MsgType, body: &[u8]) -> Result<RelayMsg, ProtoError> {
    use RelayMsg::*;
    let mut cursor = Cursor::new(body);

    let msg = match msg_type {
        MsgType::Welcome => Welcome {
            session_id: SessionId::new(cursor.get_str16()?),
        },
        MsgType::Join => Join {
            room: cursor.get_str16()?.to_owned(),
        },
        MsgType::Joined => Joined {
            room: cursor.get_str16()?.to_owned(),
        },
        MsgType::Membership => {
            let room = cursor.get_str16()?.to_owned();
            let count = cursor.get_u16()? as usize;
            let mut members = Vec::with_capacity(count);
            for _ in 0..count {
                members.push(SessionId::new(cursor.get_str16()?));
            }
            Membership { room, members }
        }
        MsgType::Signal => {
            let to = match cursor.get_u8()? {
                TARGET_ROOM => SignalTarget::Room,
                TARGET_PEER => SignalTarget::Peer(SessionId::new(cursor.get_str16()?)),
                other => return Err(ProtoError::UnknownTarget(other)),
            };
            let from = SessionId::new(cursor.get_str16()?);
            let kind = SignalKind::from_u8(cursor.get_u8()?)?;
            let len = cursor.get_u32()? as usize;
            let payload = cursor.get_bytes(len)?.to_vec();
            Signal(SignalEnvelope {
                to,
                from,
                kind,
                payload,
            })
        }
        MsgType::Ping => Ping {
            nonce: cursor.get_u64()?,
        },
        MsgType::Pong => Pong {
            nonce: cursor.get_u64()?,
        },
    };

    cursor.finish()?;
    Ok(msg)
}

// ---- Primitive write helpers ---------------------------------------------

fn put_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// str16 = u16 length + UTF-8 bytes
fn put_str16(buf: &mut Vec<u8>, s: &str) -> Result<(), ProtoError> {
    let bytes = s.as_bytes();
    let len = bytes.len();

    if len > u16::MAX as usize {
        return Err(ProtoError::StringTooLong {
            max: u16::MAX as usize,
            actual: len,
        });
    }

    put_u16(buf, len as u16);
    buf.extend_from_slice(bytes);
    Ok(())
}

/// blob32 = u32 length + raw bytes
fn put_blob32(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), ProtoError> {
    if bytes.len() > u32::MAX as usize {
        return Err(ProtoError::TooLarge);
    }
    put_u32(buf, bytes.len() as u32);
    buf.extend_from_slice(bytes);
    Ok(())
}

// ---- Cursor for decoding --------------------------------------------------

#[derive(Debug)]
struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn get_u8(&mut self) -> Result<u8, ProtoError> {
        Ok(self.get_bytes(1)?[0])
    }

    fn get_u16(&mut self) -> Result<u16, ProtoError> {
        let b = self.get_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn get_u32(&mut self) -> Result<u32, ProtoError> {
        let b = self.get_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn get_u64(&mut self) -> Result<u64, ProtoError> {
        let b = self.get_bytes(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], ProtoError> {
        if self.buf.len() < len {
            return Err(ProtoError::Truncated);
        }
        let (head, rest) = self.buf.split_at(len);
        self.buf = rest;
        Ok(head)
    }

    fn get_str16(&mut self) -> Result<&'a str, ProtoError> {
        let len = self.get_u16()? as usize;
        let bytes = self.get_bytes(len)?;
        str::from_utf8(bytes).map_err(|_| ProtoError::InvalidUtf8)
    }

    /// Enforce that the whole body was consumed.
    fn finish(self) -> Result<(), ProtoError> {
        if !self.buf.is_empty() {
            Err(ProtoError::InvalidFormat("trailing bytes in message body"))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn signal_to_peer_survives_encoding() {
        let msg = RelayMsg::Signal(SignalEnvelope {
            to: SignalTarget::Peer(SessionId::from("bbbbbbbbbbbb")),
            from: SessionId::from("aaaaaaaaaaaa"),
            kind: SignalKind::Candidate,
            payload: b"candidate:1 1 udp 2122260223 10.0.0.2 50000 typ host".to_vec(),
        });
        let (ty, body) = encode_msg(&msg).unwrap();
        assert_eq!(ty, MsgType::Signal);
        assert_eq!(decode_msg(ty, &body).unwrap(), msg);
    }

    #[test]
    fn membership_keeps_member_order() {
        let msg = RelayMsg::Membership {
            room: "abc".into(),
            members: vec!["s1".into(), "s2".into()],
        };
        let (ty, body) = encode_msg(&msg).unwrap();
        match decode_msg(ty, &body).unwrap() {
            RelayMsg::Membership { room, members } => {
                assert_eq!(room, "abc");
                assert_eq!(members, vec![SessionId::from("s1"), SessionId::from("s2")]);
            }
            other => panic!("expected Membership, got {other:?}"),
        }
    }

    #[test]
    fn truncated_body_is_rejected() {
        let (ty, body) = encode_msg(&RelayMsg::Join { room: "abc".into() }).unwrap();
        let err = decode_msg(ty, &body[..body.len() - 1]).unwrap_err();
        assert!(matches!(err, ProtoError::Truncated));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let (ty, mut body) = encode_msg(&RelayMsg::Ping { nonce: 7 }).unwrap();
        body.push(0);
        assert!(matches!(
            decode_msg(ty, &body),
            Err(ProtoError::InvalidFormat(_))
        ));
    }

    #[test]
    fn unknown_signal_kind_is_rejected() {
        let msg = RelayMsg::Signal(SignalEnvelope {
            to: SignalTarget::Room,
            from: "a".into(),
            kind: SignalKind::Offer,
            payload: vec![],
        });
        let (ty, mut body) = encode_msg(&msg).unwrap();
        // [target=0][from len u16][from 'a'][kind]
        body[4] = 9;
        assert!(matches!(
            decode_msg(ty, &body),
            Err(ProtoError::UnknownSignalKind(9))
        ));
    }
}
