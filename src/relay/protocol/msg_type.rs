use crate::relay::protocol::ProtoError;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum MsgType {
    Welcome = 0x01,

    Join = 0x10,
    Joined = 0x11,
    Membership = 0x12,

    Signal = 0x20,

    Ping = 0x30,
    Pong = 0x31,
}

impl MsgType {
    pub fn from_u8(v: u8) -> Result<MsgType, ProtoError> {
        use MsgType::*;
        match v {
            0x01 => Ok(Welcome),
            0x10 => Ok(Join),
            0x11 => Ok(Joined),
            0x12 => Ok(Membership),
            0x20 => Ok(Signal),
            0x30 => Ok(Ping),
            0x31 => Ok(Pong),
            other => Err(ProtoError::UnknownType(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
