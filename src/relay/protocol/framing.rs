use super::{FrameError, MAX_BODY_LEN, MsgType, PROTO_VERSION, ProtoError, RelayMsg};
use super::{decode_msg, encode_msg};
use std::io::{self, Read, Write};

/// Write a single frame: [ver][type][reserved u16=0][len u32][body...]
pub fn write_frame<W: Write>(w: &mut W, msg_type: MsgType, body: &[u8]) -> io::Result<()> {
    if body.len() > MAX_BODY_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "body too large",
        ));
    }
    let len = body.len() as u32;
    let mut header = [0u8; 8];
    header[0] = PROTO_VERSION;
    header[1] = msg_type.as_u8();
    header[4..8].copy_from_slice(&len.to_be_bytes());
    w.write_all(&header)?;
    w.write_all(body)?;
    w.flush()?;
    Ok(())
}

/// Read a single frame, enforcing a max body length.
pub fn read_frame<R: Read>(r: &mut R, max_body: usize) -> Result<(MsgType, Vec<u8>), FrameError> {
    let mut header = [0u8; 8];
    r.read_exact(&mut header)?;

    if header[0] != PROTO_VERSION {
        return Err(ProtoError::InvalidFormat("bad proto version").into());
    }

    let msg_type = MsgType::from_u8(header[1])?;

    // flags ignored for now
    let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    if len > max_body {
        return Err(ProtoError::TooLarge.into());
    }

    let mut body = vec![0u8; len];
    r.read_exact(&mut body)?;

    Ok((msg_type, body))
}

pub fn write_msg<W: Write>(w: &mut W, msg: &RelayMsg) -> Result<(), FrameError> {
    let (msg_type, body) = encode_msg(msg)?;
    write_frame(w, msg_type, &body)?;
    Ok(())
}

pub fn read_msg<R: Read>(r: &mut R) -> Result<RelayMsg, FrameError> {
    let (msg_type, body) = read_frame(r, MAX_BODY_LEN)?;
    Ok(decode_msg(msg_type, &body)?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::io::Cursor;

    #[test]
    fn frames_stream_back_to_back() {
        let mut wire = Vec::new();
        write_msg(&mut wire, &RelayMsg::Join { room: "abc".into() }).unwrap();
        write_msg(&mut wire, &RelayMsg::Ping { nonce: 99 }).unwrap();

        let mut r = Cursor::new(wire);
        assert_eq!(read_msg(&mut r).unwrap(), RelayMsg::Join { room: "abc".into() });
        assert_eq!(read_msg(&mut r).unwrap(), RelayMsg::Ping { nonce: 99 });
        assert!(matches!(read_msg(&mut r), Err(FrameError::Io(_))));
    }

    #[test]
    fn oversized_length_is_rejected_before_allocating() {
        let mut header = vec![PROTO_VERSION, MsgType::Join.as_u8(), 0, 0];
        header.extend_from_slice(&(u32::MAX).to_be_bytes());
        let err = read_frame(&mut Cursor::new(header), MAX_BODY_LEN).unwrap_err();
        assert!(matches!(err, FrameError::Proto(ProtoError::TooLarge)));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let frame = vec![9, MsgType::Ping.as_u8(), 0, 0, 0, 0, 0, 0];
        let err = read_frame(&mut Cursor::new(frame), MAX_BODY_LEN).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Proto(ProtoError::InvalidFormat(_))
        ));
    }
}
