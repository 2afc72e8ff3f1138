//! CONNACK: the server's answer to CONNECT.
//!
//! ```text
//! [Acknowledge Flags(1)] [Return Code(1)]
//! ```

use crate::core::header::PacketType;
use crate::core::primitives::BodyReader;
use crate::error::{constants, CodecError, Result};
use crate::protocol::flags::mask;
use crate::protocol::packet::ControlPacket;
use bytes::{BufMut, BytesMut};

/// CONNACK return codes (MQTT 3.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ConnackCode {
    #[default]
    Accepted = 0,
    UnacceptableProtocolVersion = 1,
    IdentifierRejected = 2,
    ServerUnavailable = 3,
    BadUsernamePassword = 4,
    NotAuthorized = 5,
}

impl TryFrom<u8> for ConnackCode {
    type Error = CodecError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(ConnackCode::Accepted),
            1 => Ok(ConnackCode::UnacceptableProtocolVersion),
            2 => Ok(ConnackCode::IdentifierRejected),
            3 => Ok(ConnackCode::ServerUnavailable),
            4 => Ok(ConnackCode::BadUsernamePassword),
            5 => Ok(ConnackCode::NotAuthorized),
            _ => Err(CodecError::Malformed(format!(
                "{}: {value}",
                constants::ERR_CONNACK_CODE
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnackPacket {
    session_present: bool,
    return_code: ConnackCode,
}

impl ConnackPacket {
    pub fn new(session_present: bool, return_code: ConnackCode) -> Self {
        Self {
            session_present,
            return_code,
        }
    }

    pub fn session_present(&self) -> bool {
        self.session_present
    }

    pub fn set_session_present(&mut self, v: bool) {
        self.session_present = v;
    }

    pub fn return_code(&self) -> ConnackCode {
        self.return_code
    }

    pub fn set_return_code(&mut self, code: ConnackCode) {
        self.return_code = code;
    }
}

impl ControlPacket for ConnackPacket {
    const PACKET_TYPE: PacketType = PacketType::Connack;

    fn remaining_length(&self) -> Result<usize> {
        Ok(2)
    }

    fn decode_body(_flags: u8, body: &mut BodyReader) -> Result<Self> {
        let ack_flags = body.read_u8()?;
        if ack_flags & mask::CONNACK_RESERVED != 0 {
            return Err(CodecError::malformed(constants::ERR_CONNACK_RESERVED));
        }
        let return_code = ConnackCode::try_from(body.read_u8()?)?;

        Ok(Self {
            session_present: ack_flags & mask::CONNACK_SESSION_PRESENT != 0,
            return_code,
        })
    }

    fn encode_body(&self, dst: &mut BytesMut) -> Result<()> {
        let ack_flags = if self.session_present {
            mask::CONNACK_SESSION_PRESENT
        } else {
            0
        };
        dst.put_u8(ack_flags);
        dst.put_u8(self.return_code as u8);
        Ok(())
    }
}
