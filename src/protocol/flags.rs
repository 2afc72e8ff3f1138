//! Packed bit-flag fields.
//!
//! Every mask used by the codec lives in [`mask`]; the rest of the crate only
//! sees the structured [`ConnectFlags`] and [`PublishFlags`] values.
//!
//! ```text
//! CONNECT flags byte          PUBLISH header nibble
//!   7  username                 3    dup
//!   6  password                 2-1  qos
//!   5  will retain              0    retain
//!   4-3 will qos
//!   2  will flag
//!   1  clean session
//!   0  reserved (must be 0)
//! ```

use crate::error::{constants, CodecError, Result};
use std::fmt;

/// Bit-mask table for the packed flag fields.
pub mod mask {
    pub const CONNECT_RESERVED: u8 = 0b0000_0001;
    pub const CONNECT_CLEAN_SESSION: u8 = 0b0000_0010;
    pub const CONNECT_WILL: u8 = 0b0000_0100;
    pub const CONNECT_WILL_QOS: u8 = 0b0001_1000;
    pub const CONNECT_WILL_QOS_SHIFT: u8 = 3;
    pub const CONNECT_WILL_RETAIN: u8 = 0b0010_0000;
    pub const CONNECT_PASSWORD: u8 = 0b0100_0000;
    pub const CONNECT_USERNAME: u8 = 0b1000_0000;

    pub const PUBLISH_RETAIN: u8 = 0b0001;
    pub const PUBLISH_QOS: u8 = 0b0110;
    pub const PUBLISH_QOS_SHIFT: u8 = 1;
    pub const PUBLISH_DUP: u8 = 0b1000;

    pub const CONNACK_SESSION_PRESENT: u8 = 0b0000_0001;
    pub const CONNACK_RESERVED: u8 = 0b1111_1110;

    pub const SUBSCRIBE_QOS: u8 = 0b0000_0011;
    pub const SUBSCRIBE_RESERVED: u8 = 0b1111_1100;
}

/// Quality of Service levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
#[allow(clippy::enum_variant_names)]
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = CodecError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            _ => Err(CodecError::ProtocolViolation(format!(
                "{}: {value}",
                constants::ERR_INVALID_QOS
            ))),
        }
    }
}

impl fmt::Display for QoS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// CONNECT flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectFlags {
    pub username: bool,
    pub password: bool,
    pub will_retain: bool,
    pub will_qos: QoS,
    pub will: bool,
    pub clean_session: bool,
}

impl ConnectFlags {
    /// Unpack the flags byte. Rejects the reserved bit and a will QoS of 3.
    pub fn from_byte(byte: u8) -> Result<Self> {
        if byte & mask::CONNECT_RESERVED != 0 {
            return Err(CodecError::malformed(constants::ERR_CONNECT_RESERVED));
        }

        let will_qos =
            QoS::try_from((byte & mask::CONNECT_WILL_QOS) >> mask::CONNECT_WILL_QOS_SHIFT)?;

        Ok(Self {
            username: byte & mask::CONNECT_USERNAME != 0,
            password: byte & mask::CONNECT_PASSWORD != 0,
            will_retain: byte & mask::CONNECT_WILL_RETAIN != 0,
            will_qos,
            will: byte & mask::CONNECT_WILL != 0,
            clean_session: byte & mask::CONNECT_CLEAN_SESSION != 0,
        })
    }

    pub fn to_byte(self) -> u8 {
        let mut byte = (self.will_qos as u8) << mask::CONNECT_WILL_QOS_SHIFT;
        if self.username {
            byte |= mask::CONNECT_USERNAME;
        }
        if self.password {
            byte |= mask::CONNECT_PASSWORD;
        }
        if self.will_retain {
            byte |= mask::CONNECT_WILL_RETAIN;
        }
        if self.will {
            byte |= mask::CONNECT_WILL;
        }
        if self.clean_session {
            byte |= mask::CONNECT_CLEAN_SESSION;
        }
        byte
    }
}

/// PUBLISH fixed-header flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishFlags {
    pub dup: bool,
    pub qos: QoS,
    pub retain: bool,
}

impl PublishFlags {
    /// Unpack the low nibble of the first byte. QoS 3 is rejected.
    pub fn from_nibble(flags: u8) -> Result<Self> {
        Ok(Self {
            dup: flags & mask::PUBLISH_DUP != 0,
            qos: QoS::try_from((flags & mask::PUBLISH_QOS) >> mask::PUBLISH_QOS_SHIFT)?,
            retain: flags & mask::PUBLISH_RETAIN != 0,
        })
    }

    pub fn to_nibble(self) -> u8 {
        let mut flags = (self.qos as u8) << mask::PUBLISH_QOS_SHIFT;
        if self.dup {
            flags |= mask::PUBLISH_DUP;
        }
        if self.retain {
            flags |= mask::PUBLISH_RETAIN;
        }
        flags
    }
}
