//! PUBLISH: application message transport.
//!
//! ```text
//! Fixed Header flags: [DUP(1)] [QoS(2)] [RETAIN(1)]
//! Body: [Topic Name(LP)] [Packet Id(2), only if QoS > 0] [Payload(rest of body)]
//! ```
//!
//! The payload has no length prefix of its own; it is whatever follows the
//! variable header, and may be empty.

use crate::core::header::PacketType;
use crate::core::primitives::{lp_len, write_lp_bytes, BodyReader};
use crate::error::{constants, CodecError, Result};
use crate::protocol::flags::{PublishFlags, QoS};
use crate::protocol::packet::{ControlPacket, PacketIdentifier};
use crate::protocol::topic::is_valid_topic_name;
use bytes::{BufMut, Bytes, BytesMut};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishPacket {
    flags: PublishFlags,
    topic: Bytes,
    packet_id: u16,
    payload: Bytes,
}

impl PublishPacket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dup(&self) -> bool {
        self.flags.dup
    }

    pub fn set_dup(&mut self, v: bool) {
        self.flags.dup = v;
    }

    pub fn retain(&self) -> bool {
        self.flags.retain
    }

    pub fn set_retain(&mut self, v: bool) {
        self.flags.retain = v;
    }

    pub fn qos(&self) -> QoS {
        self.flags.qos
    }

    /// Rejects values above 2.
    pub fn set_qos(&mut self, qos: u8) -> Result<()> {
        self.flags.qos = QoS::try_from(qos)?;
        Ok(())
    }

    pub fn flags(&self) -> PublishFlags {
        self.flags
    }

    pub fn topic(&self) -> &[u8] {
        &self.topic
    }

    /// Rejects empty topics and topics containing `#` or `+`.
    pub fn set_topic(&mut self, topic: impl Into<Bytes>) -> Result<()> {
        let topic = topic.into();
        if !is_valid_topic_name(&topic) {
            return Err(invalid_topic(&topic));
        }
        self.topic = topic;
        Ok(())
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: impl Into<Bytes>) {
        self.payload = payload.into();
    }

    fn has_packet_id(&self) -> bool {
        self.flags.qos > QoS::AtMostOnce
    }
}

fn invalid_topic(topic: &[u8]) -> CodecError {
    CodecError::ProtocolViolation(format!(
        "{}: {:?}",
        constants::ERR_INVALID_TOPIC,
        String::from_utf8_lossy(topic)
    ))
}

impl PacketIdentifier for PublishPacket {
    fn packet_id(&self) -> u16 {
        self.packet_id
    }

    fn set_packet_id(&mut self, id: u16) {
        self.packet_id = id;
    }
}

impl ControlPacket for PublishPacket {
    const PACKET_TYPE: PacketType = PacketType::Publish;

    fn header_flags(&self) -> u8 {
        self.flags.to_nibble()
    }

    fn validate(&self) -> Result<()> {
        if !is_valid_topic_name(&self.topic) {
            return Err(invalid_topic(&self.topic));
        }
        Ok(())
    }

    fn remaining_length(&self) -> Result<usize> {
        let id_len = if self.has_packet_id() { 2 } else { 0 };
        Ok(lp_len(&self.topic) + id_len + self.payload.len())
    }

    fn decode_body(flags: u8, body: &mut BodyReader) -> Result<Self> {
        let flags = PublishFlags::from_nibble(flags)?;

        let topic = body.read_lp_bytes()?;
        if !is_valid_topic_name(&topic) {
            return Err(invalid_topic(&topic));
        }

        let packet_id = if flags.qos > QoS::AtMostOnce {
            body.read_u16()?
        } else {
            0
        };

        Ok(Self {
            flags,
            topic,
            packet_id,
            payload: body.read_rest(),
        })
    }

    fn encode_body(&self, dst: &mut BytesMut) -> Result<()> {
        write_lp_bytes(dst, &self.topic)?;
        if self.has_packet_id() {
            dst.put_u16(self.packet_id);
        }
        dst.put_slice(&self.payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const QOS1_BYTES: [u8; 25] = [
        0x32, 23, // type + flags, remaining length
        0, 7, b's', b'u', b'r', b'g', b'e', b'm', b'q', // topic
        0, 7, // packet id
        b's', b'e', b'n', b'd', b' ', b'm', b'e', b' ', b'h', b'o', b'm', b'e',
    ];

    #[test]
    fn test_header_flag_fields() {
        let (_, mut msg) = PublishPacket::decode_slice(&[0x3B, 5, 0, 1, b'a', 0, 1]).unwrap();
        assert!(msg.dup());
        assert!(msg.retain());
        assert_eq!(msg.qos(), QoS::AtLeastOnce);

        msg.set_dup(false);
        assert!(!msg.dup());
        msg.set_retain(false);
        assert!(!msg.retain());

        assert!(msg.set_qos(2).is_ok());
        assert_eq!(msg.qos(), QoS::ExactlyOnce);
        assert!(msg.set_qos(3).is_err());
        assert_eq!(msg.qos(), QoS::ExactlyOnce);
        assert!(msg.set_qos(0).is_ok());
        assert_eq!(msg.qos(), QoS::AtMostOnce);
    }

    #[test]
    fn test_fields() {
        let mut msg = PublishPacket::new();
        msg.set_topic("coolstuff").unwrap();
        assert_eq!(msg.topic(), b"coolstuff");

        let err = msg.set_topic("coolstuff/#").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
        assert_eq!(msg.topic(), b"coolstuff");
        assert!(msg.set_topic("a/+/b").is_err());
        assert!(msg.set_topic("").is_err());

        msg.set_packet_id(100);
        assert_eq!(msg.packet_id(), 100);

        msg.set_payload("this is a payload to be sent");
        assert_eq!(&msg.payload()[..], b"this is a payload to be sent");
    }

    #[test]
    fn test_decode_qos1() {
        let (n, msg) = PublishPacket::decode_slice(&QOS1_BYTES).unwrap();
        assert_eq!(n, QOS1_BYTES.len());
        assert_eq!(msg.packet_id(), 7);
        assert_eq!(msg.topic(), b"surgemq");
        assert_eq!(&msg.payload()[..], b"send me home");
    }

    #[test]
    fn test_decode_declared_length_exceeds_available() {
        let mut bytes = QOS1_BYTES;
        bytes[1] = 26;
        let err = PublishPacket::decode_slice(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_decode_qos0_no_packet_id() {
        let mut bytes = vec![0x30, 21, 0, 7];
        bytes.extend_from_slice(b"surgemq");
        bytes.extend_from_slice(b"send me home");
        let (_, msg) = PublishPacket::decode_slice(&bytes).unwrap();
        assert_eq!(msg.qos(), QoS::AtMostOnce);
        assert_eq!(&msg.payload()[..], b"send me home");
    }

    #[test]
    fn test_decode_empty_payload() {
        let (_, msg) = PublishPacket::decode_slice(&[0x30, 3, 0, 1, b't']).unwrap();
        assert!(msg.payload().is_empty());
    }

    #[test]
    fn test_decode_wildcard_topic() {
        let err = PublishPacket::decode_slice(&[0x30, 3, 0, 1, b'#']).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
        let err = PublishPacket::decode_slice(&[0x30, 3, 0, 1, b'+']).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    }

    #[test]
    fn test_decode_qos3() {
        let err = PublishPacket::decode_slice(&[0x36, 5, 0, 1, b't', 0, 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    }

    #[test]
    fn test_decode_missing_packet_id() {
        // QoS 1 with only one byte after the topic
        let err = PublishPacket::decode_slice(&[0x32, 4, 0, 1, b't', 0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_encode_qos1() {
        let mut msg = PublishPacket::new();
        msg.set_topic("surgemq").unwrap();
        msg.set_qos(1).unwrap();
        msg.set_packet_id(7);
        msg.set_payload("send me home");

        let bytes = msg.to_bytes().unwrap();
        assert_eq!(bytes.len(), QOS1_BYTES.len());
        assert_eq!(&bytes[..], &QOS1_BYTES[..]);
    }

    #[test]
    fn test_encode_empty_topic() {
        let mut msg = PublishPacket::new();
        msg.set_packet_id(7);
        msg.set_payload("send me home");
        assert_eq!(
            msg.to_bytes().unwrap_err().kind(),
            ErrorKind::ProtocolViolation
        );
    }

    #[test]
    fn test_encode_qos0_omits_packet_id() {
        let mut msg = PublishPacket::new();
        msg.set_topic("surgemq").unwrap();
        msg.set_packet_id(7);
        msg.set_payload("send me home");

        let bytes = msg.to_bytes().unwrap();
        assert_eq!(bytes[0], 0x30);
        assert_eq!(bytes[1], 21);
        assert_eq!(bytes.len(), 23);
        assert_eq!(&bytes[11..], b"send me home");
    }

    #[test]
    fn test_large_payload_uses_multibyte_length() {
        let mut msg = PublishPacket::new();
        msg.set_topic("big").unwrap();
        msg.set_payload(vec![0xAB; 200]);

        let bytes = msg.to_bytes().unwrap();
        // 2 + 3 + 200 = 205 -> [0xCD, 0x01]
        assert_eq!(&bytes[..3], &[0x30, 0xCD, 0x01]);
        let (n, decoded) = PublishPacket::decode_slice(&bytes).unwrap();
        assert_eq!(n, bytes.len());
        assert_eq!(decoded, msg);
    }
}
