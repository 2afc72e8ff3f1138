//! Packet type codes and the Fixed Header.
//!
//! ```text
//! [Type(4 bits) | Flags(4 bits)] [Remaining Length(1-4 bytes)]
//! ```

use crate::core::varint;
use crate::error::{constants, CodecError, Result};
use bytes::BufMut;
use std::fmt;

/// MQTT control packet types (high nibble of the first byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Connect = 1,
    Connack = 2,
    Publish = 3,
    Puback = 4,
    Pubrec = 5,
    Pubrel = 6,
    Pubcomp = 7,
    Subscribe = 8,
    Suback = 9,
    Unsubscribe = 10,
    Unsuback = 11,
    Pingreq = 12,
    Pingresp = 13,
    Disconnect = 14,
}

impl TryFrom<u8> for PacketType {
    type Error = CodecError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(PacketType::Connect),
            2 => Ok(PacketType::Connack),
            3 => Ok(PacketType::Publish),
            4 => Ok(PacketType::Puback),
            5 => Ok(PacketType::Pubrec),
            6 => Ok(PacketType::Pubrel),
            7 => Ok(PacketType::Pubcomp),
            8 => Ok(PacketType::Subscribe),
            9 => Ok(PacketType::Suback),
            10 => Ok(PacketType::Unsubscribe),
            11 => Ok(PacketType::Unsuback),
            12 => Ok(PacketType::Pingreq),
            13 => Ok(PacketType::Pingresp),
            14 => Ok(PacketType::Disconnect),
            _ => Err(CodecError::InvalidPacketType(value)),
        }
    }
}

impl PacketType {
    /// Wire name of the packet type
    pub fn name(self) -> &'static str {
        match self {
            PacketType::Connect => "CONNECT",
            PacketType::Connack => "CONNACK",
            PacketType::Publish => "PUBLISH",
            PacketType::Puback => "PUBACK",
            PacketType::Pubrec => "PUBREC",
            PacketType::Pubrel => "PUBREL",
            PacketType::Pubcomp => "PUBCOMP",
            PacketType::Subscribe => "SUBSCRIBE",
            PacketType::Suback => "SUBACK",
            PacketType::Unsubscribe => "UNSUBSCRIBE",
            PacketType::Unsuback => "UNSUBACK",
            PacketType::Pingreq => "PINGREQ",
            PacketType::Pingresp => "PINGRESP",
            PacketType::Disconnect => "DISCONNECT",
        }
    }

    /// Flag nibble this type must carry, or `None` when flags are free-form (PUBLISH).
    pub fn required_flags(self) -> Option<u8> {
        match self {
            PacketType::Publish => None,
            PacketType::Pubrel | PacketType::Subscribe | PacketType::Unsubscribe => Some(0b0010),
            _ => Some(0b0000),
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded Fixed Header of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeader {
    pub packet_type: PacketType,
    pub flags: u8,
    pub remaining_length: usize,
}

impl FixedHeader {
    pub fn new(packet_type: PacketType, flags: u8, remaining_length: usize) -> Self {
        Self {
            packet_type,
            flags: flags & 0x0F,
            remaining_length,
        }
    }

    /// Split the first byte into type and flags, validating the flag pattern.
    pub fn parse_first_byte(byte: u8) -> Result<(PacketType, u8)> {
        let packet_type = PacketType::try_from(byte >> 4)?;
        let flags = byte & 0x0F;

        if let Some(required) = packet_type.required_flags() {
            if flags != required {
                return Err(CodecError::Malformed(format!(
                    "{}: {packet_type} requires {required:#06b}, got {flags:#06b}",
                    constants::ERR_INVALID_FLAGS
                )));
            }
        }

        Ok((packet_type, flags))
    }

    /// Parse a Fixed Header from the front of `buf`.
    ///
    /// Returns `Ok(Some((header, header_len)))` once the whole header is present,
    /// `Ok(None)` if more bytes are needed.
    pub fn parse(buf: &[u8]) -> Result<Option<(Self, usize)>> {
        let Some(&first) = buf.first() else {
            return Ok(None);
        };
        let (packet_type, flags) = Self::parse_first_byte(first)?;

        let Some((remaining_length, len_bytes)) = varint::decode(&buf[1..])? else {
            return Ok(None);
        };

        Ok(Some((
            Self {
                packet_type,
                flags,
                remaining_length,
            },
            1 + len_bytes,
        )))
    }

    /// Size of the encoded header.
    pub fn encoded_len(&self) -> Result<usize> {
        varint::encoded_len(self.remaining_length)
            .map(|n| 1 + n)
            .ok_or(CodecError::OversizedPacket {
                size: self.remaining_length,
                limit: crate::config::MAX_REMAINING_LENGTH,
            })
    }

    /// Write the type/flags byte and the Remaining Length.
    pub fn encode<B: BufMut>(&self, dst: &mut B) -> Result<usize> {
        // Validate before writing anything
        self.encoded_len()?;
        dst.put_u8(((self.packet_type as u8) << 4) | (self.flags & 0x0F));
        Ok(1 + varint::encode(self.remaining_length, dst)?)
    }
}
