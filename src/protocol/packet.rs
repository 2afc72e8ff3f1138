//! The common packet capability set and the [`Packet`] sum type.
//!
//! Every variant implements [`ControlPacket`]. Encoding always recomputes the
//! Remaining Length from the current fields, so a packet can never emit a
//! header that disagrees with its body. Decoding consumes exactly the
//! announced body; leftover bytes are a framing error.

use crate::config::MAX_PACKET_SIZE;
use crate::core::header::{FixedHeader, PacketType};
use crate::core::primitives::BodyReader;
use crate::core::reader;
use crate::error::{CodecError, DecodeError, DecodeResult, Result};
use crate::protocol::ack::{PubackPacket, PubcompPacket, PubrecPacket, PubrelPacket, UnsubackPacket};
use crate::protocol::connack::ConnackPacket;
use crate::protocol::connect::ConnectPacket;
use crate::protocol::dispatcher;
use crate::protocol::empty::{DisconnectPacket, PingreqPacket, PingrespPacket};
use crate::protocol::publish::PublishPacket;
use crate::protocol::subscribe::{SubackPacket, SubscribePacket, UnsubscribePacket};
use bytes::{Bytes, BytesMut};
use std::fmt;
use std::io::Read;

/// Behaviour shared by all fourteen packet variants.
pub trait ControlPacket: Sized {
    const PACKET_TYPE: PacketType;

    fn packet_type(&self) -> PacketType {
        Self::PACKET_TYPE
    }

    /// Flag nibble written into the Fixed Header.
    fn header_flags(&self) -> u8 {
        Self::PACKET_TYPE.required_flags().unwrap_or(0)
    }

    /// Semantic checks run before anything is written.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Body size computed from the current field values.
    fn remaining_length(&self) -> Result<usize>;

    /// Decode the body. `flags` is the already-validated header nibble.
    ///
    /// Implementations read their fields in wire order and leave any surplus
    /// in `body`; [`ControlPacket::from_frame`] rejects it.
    fn decode_body(flags: u8, body: &mut BodyReader) -> Result<Self>;

    /// Append the body. Exactly `remaining_length()` bytes must be written.
    fn encode_body(&self, dst: &mut BytesMut) -> Result<()>;

    /// Encode the full frame into `dst`, returning the number of bytes produced.
    ///
    /// On failure `dst` is left as it was.
    fn encode_to(&self, dst: &mut BytesMut) -> Result<usize> {
        self.validate()?;
        let remaining_length = self.remaining_length()?;
        let header = FixedHeader::new(Self::PACKET_TYPE, self.header_flags(), remaining_length);
        let total = header.encoded_len()? + remaining_length;

        let start = dst.len();
        dst.reserve(total);
        let written = header
            .encode(dst)
            .and_then(|_| self.encode_body(dst))
            .map(|_| dst.len() - start);

        match written {
            Ok(n) if n == total => Ok(n),
            Ok(n) => {
                dst.truncate(start);
                Err(CodecError::Malformed(format!(
                    "{} body length mismatch: announced {total}, wrote {n}",
                    Self::PACKET_TYPE
                )))
            }
            Err(e) => {
                dst.truncate(start);
                Err(e)
            }
        }
    }

    /// Encode into a fresh buffer. Its length is the number of bytes produced.
    fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        self.encode_to(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Build the packet from a framed body of exactly `header.remaining_length` bytes.
    fn from_frame(header: &FixedHeader, body: Bytes) -> Result<Self> {
        if header.packet_type != Self::PACKET_TYPE {
            return Err(CodecError::UnexpectedPacket {
                expected: Self::PACKET_TYPE.to_string(),
                got: header.packet_type.to_string(),
            });
        }
        if body.len() != header.remaining_length {
            return Err(CodecError::Malformed(format!(
                "body is {} bytes, header announced {}",
                body.len(),
                header.remaining_length
            )));
        }

        let mut reader = BodyReader::new(body);
        let packet = Self::decode_body(header.flags, &mut reader)?;
        reader.finish()?;
        Ok(packet)
    }

    /// Read one frame of this type from a byte source.
    ///
    /// Returns the number of bytes consumed with the packet. On failure the
    /// count travels in the [`DecodeError`].
    fn decode_from<R: Read>(src: &mut R) -> DecodeResult<(usize, Self)> {
        let (consumed, header, body) = reader::read_frame(src, MAX_PACKET_SIZE)?;
        Self::from_frame(&header, body)
            .map(|packet| (consumed, packet))
            .map_err(|e| DecodeError::new(consumed, e))
    }

    /// Decode one frame of this type from the front of `buf`.
    fn decode_slice(buf: &[u8]) -> DecodeResult<(usize, Self)> {
        let mut src = buf;
        Self::decode_from(&mut src)
    }
}

/// Access to the 16-bit packet identifier.
pub trait PacketIdentifier {
    fn packet_id(&self) -> u16;
    fn set_packet_id(&mut self, id: u16);
}

/// Any MQTT control packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Connect(ConnectPacket),
    Connack(ConnackPacket),
    Publish(PublishPacket),
    Puback(PubackPacket),
    Pubrec(PubrecPacket),
    Pubrel(PubrelPacket),
    Pubcomp(PubcompPacket),
    Subscribe(SubscribePacket),
    Suback(SubackPacket),
    Unsubscribe(UnsubscribePacket),
    Unsuback(UnsubackPacket),
    Pingreq(PingreqPacket),
    Pingresp(PingrespPacket),
    Disconnect(DisconnectPacket),
}

macro_rules! with_variant {
    ($packet:expr, $p:ident => $body:expr) => {
        match $packet {
            Packet::Connect($p) => $body,
            Packet::Connack($p) => $body,
            Packet::Publish($p) => $body,
            Packet::Puback($p) => $body,
            Packet::Pubrec($p) => $body,
            Packet::Pubrel($p) => $body,
            Packet::Pubcomp($p) => $body,
            Packet::Subscribe($p) => $body,
            Packet::Suback($p) => $body,
            Packet::Unsubscribe($p) => $body,
            Packet::Unsuback($p) => $body,
            Packet::Pingreq($p) => $body,
            Packet::Pingresp($p) => $body,
            Packet::Disconnect($p) => $body,
        }
    };
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        with_variant!(self, p => p.packet_type())
    }

    /// Packet identifier, for the variants that carry one.
    pub fn packet_id(&self) -> Option<u16> {
        match self {
            Packet::Publish(p) if p.qos() > crate::protocol::flags::QoS::AtMostOnce => {
                Some(p.packet_id())
            }
            Packet::Puback(p) => Some(p.packet_id()),
            Packet::Pubrec(p) => Some(p.packet_id()),
            Packet::Pubrel(p) => Some(p.packet_id()),
            Packet::Pubcomp(p) => Some(p.packet_id()),
            Packet::Subscribe(p) => Some(p.packet_id()),
            Packet::Suback(p) => Some(p.packet_id()),
            Packet::Unsubscribe(p) => Some(p.packet_id()),
            Packet::Unsuback(p) => Some(p.packet_id()),
            _ => None,
        }
    }

    pub fn remaining_length(&self) -> Result<usize> {
        with_variant!(self, p => p.remaining_length())
    }

    pub fn encode_to(&self, dst: &mut BytesMut) -> Result<usize> {
        with_variant!(self, p => p.encode_to(dst))
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        with_variant!(self, p => p.to_bytes())
    }

    /// Read and dispatch one frame of any type.
    pub fn decode_from<R: Read>(src: &mut R) -> DecodeResult<(usize, Packet)> {
        reader::read_packet(src, MAX_PACKET_SIZE)
    }

    pub fn decode_slice(buf: &[u8]) -> DecodeResult<(usize, Packet)> {
        let mut src = buf;
        Self::decode_from(&mut src)
    }

    /// Dispatch an already framed body.
    pub fn from_frame(header: &FixedHeader, body: Bytes) -> Result<Packet> {
        dispatcher::dispatch(header, body)
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packet::Connect(p) => write!(
                f,
                "CONNECT(version={}, client_id={:?}, keep_alive={})",
                p.version(),
                String::from_utf8_lossy(p.client_id()),
                p.keep_alive()
            ),
            Packet::Connack(p) => write!(
                f,
                "CONNACK(session_present={}, code={:?})",
                p.session_present(),
                p.return_code()
            ),
            Packet::Publish(p) => write!(
                f,
                "PUBLISH(topic={:?}, qos={}, packet_id={}, payload={}B)",
                String::from_utf8_lossy(p.topic()),
                p.qos(),
                p.packet_id(),
                p.payload().len()
            ),
            other => match other.packet_id() {
                Some(id) => write!(f, "{}(packet_id={id})", other.packet_type()),
                None => write!(f, "{}", other.packet_type()),
            },
        }
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Packet {
                fn from(p: $ty) -> Self {
                    Packet::$variant(p)
                }
            }
        )*
    };
}

impl_from_variant!(
    Connect(ConnectPacket),
    Connack(ConnackPacket),
    Publish(PublishPacket),
    Puback(PubackPacket),
    Pubrec(PubrecPacket),
    Pubrel(PubrelPacket),
    Pubcomp(PubcompPacket),
    Subscribe(SubscribePacket),
    Suback(SubackPacket),
    Unsubscribe(UnsubscribePacket),
    Unsuback(UnsubackPacket),
    Pingreq(PingreqPacket),
    Pingresp(PingrespPacket),
    Disconnect(DisconnectPacket),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::protocol::flags::QoS;

    #[test]
    fn test_packet_type_and_id() {
        let p = Packet::from(PubrecPacket::new(7));
        assert_eq!(p.packet_type(), PacketType::Pubrec);
        assert_eq!(p.packet_id(), Some(7));

        let p = Packet::from(PingreqPacket);
        assert_eq!(p.packet_id(), None);
        assert_eq!(p.to_string(), "PINGREQ");
    }

    #[test]
    fn test_publish_qos0_has_no_packet_id() {
        let mut publish = PublishPacket::new();
        publish.set_topic("a/b").unwrap();
        publish.set_packet_id(9);
        assert_eq!(Packet::from(publish.clone()).packet_id(), None);

        publish.set_qos(1).unwrap();
        assert_eq!(publish.qos(), QoS::AtLeastOnce);
        assert_eq!(Packet::from(publish).packet_id(), Some(9));
    }

    #[test]
    fn test_typed_decode_rejects_other_type() {
        let bytes = PubackPacket::new(1).to_bytes().unwrap();
        let err = PubrecPacket::decode_slice(&bytes).unwrap_err();
        assert!(matches!(err.error(), CodecError::UnexpectedPacket { .. }));
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
        assert_eq!(err.consumed(), bytes.len());
    }

    #[test]
    fn test_failed_decode_reports_consumed_bytes() {
        // CONNECT rejected at the flags byte, followed by a PINGREQ
        let bytes = [
            0x10, 12, 0, 4, b'M', b'Q', b'T', b'T', 4, 0x01, 0, 10, 0, 0, 0xC0, 0,
        ];
        let mut src = &bytes[..];
        let err = Packet::decode_from(&mut src).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert_eq!(err.consumed(), 14);

        // The source is positioned at the next frame
        let (n, packet) = Packet::decode_from(&mut src).unwrap();
        assert_eq!(n, 2);
        assert_eq!(packet.packet_type(), PacketType::Pingreq);

        let err = ConnectPacket::decode_slice(&bytes[..9]).unwrap_err();
        assert_eq!(err.consumed(), 9);
    }

    #[test]
    fn test_encode_failure_leaves_buffer_untouched() {
        let mut buf = BytesMut::from(&b"prefix"[..]);
        let publish = PublishPacket::new(); // empty topic
        assert!(publish.encode_to(&mut buf).is_err());
        assert_eq!(&buf[..], b"prefix");
    }

    #[test]
    fn test_encode_appends() {
        let mut buf = BytesMut::new();
        let n1 = Packet::from(PingreqPacket).encode_to(&mut buf).unwrap();
        let n2 = Packet::from(PubackPacket::new(3)).encode_to(&mut buf).unwrap();
        assert_eq!(n1, 2);
        assert_eq!(n2, 4);
        assert_eq!(&buf[..], &[0xC0, 0x00, 0x40, 0x02, 0x00, 0x03]);
    }
}
