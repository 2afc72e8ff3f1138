//! CONNECT: the first packet a client sends on a new connection.
//!
//! ## Wire Format
//! ```text
//! [Protocol Name(LP)] [Level(1)] [Flags(1)] [Keep Alive(2)]
//! [Client Id(LP)] [Will Topic(LP) Will Message(LP)]? [Username(LP)]? [Password(LP)]?
//! ```
//!
//! Decode failures of kind `UnsupportedVersion` and `IdentifierRejected` must be
//! answered with the matching CONNACK before the server closes the connection;
//! see [`crate::error::CodecError::connack_code`].

use crate::config::{protocol_name, PROTOCOL_VERSION};
use crate::core::header::PacketType;
use crate::core::primitives::{lp_len, write_lp_bytes, BodyReader};
use crate::error::{constants, CodecError, Result};
use crate::protocol::flags::{ConnectFlags, QoS};
use crate::protocol::packet::ControlPacket;
use crate::protocol::topic::is_valid_client_id;
use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectPacket {
    version: u8,
    flags: ConnectFlags,
    keep_alive: u16,
    client_id: Bytes,
    will_topic: Bytes,
    will_message: Bytes,
    username: Bytes,
    password: Bytes,
}

impl Default for ConnectPacket {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectPacket {
    /// A CONNECT for protocol level 4 with every flag cleared.
    pub fn new() -> Self {
        Self {
            version: PROTOCOL_VERSION,
            flags: ConnectFlags::default(),
            keep_alive: 0,
            client_id: Bytes::new(),
            will_topic: Bytes::new(),
            will_message: Bytes::new(),
            username: Bytes::new(),
            password: Bytes::new(),
        }
    }

    /// Protocol level (3 = MQIsdp, 4 = MQTT)
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn set_version(&mut self, version: u8) -> Result<()> {
        if protocol_name(version).is_none() {
            return Err(CodecError::UnsupportedVersion(version));
        }
        self.version = version;
        Ok(())
    }

    /// Protocol name matching the configured level.
    pub fn protocol_name(&self) -> Option<&'static str> {
        protocol_name(self.version)
    }

    pub fn flags(&self) -> ConnectFlags {
        self.flags
    }

    pub fn clean_session(&self) -> bool {
        self.flags.clean_session
    }

    pub fn set_clean_session(&mut self, v: bool) {
        self.flags.clean_session = v;
    }

    pub fn will_flag(&self) -> bool {
        self.flags.will
    }

    pub fn set_will_flag(&mut self, v: bool) {
        self.flags.will = v;
    }

    pub fn will_qos(&self) -> QoS {
        self.flags.will_qos
    }

    /// Rejects values above 2.
    pub fn set_will_qos(&mut self, qos: u8) -> Result<()> {
        self.flags.will_qos = QoS::try_from(qos)?;
        Ok(())
    }

    pub fn will_retain(&self) -> bool {
        self.flags.will_retain
    }

    pub fn set_will_retain(&mut self, v: bool) {
        self.flags.will_retain = v;
    }

    pub fn username_flag(&self) -> bool {
        self.flags.username
    }

    pub fn set_username_flag(&mut self, v: bool) {
        self.flags.username = v;
    }

    pub fn password_flag(&self) -> bool {
        self.flags.password
    }

    pub fn set_password_flag(&mut self, v: bool) {
        self.flags.password = v;
    }

    /// Keep-alive interval in seconds
    pub fn keep_alive(&self) -> u16 {
        self.keep_alive
    }

    pub fn set_keep_alive(&mut self, secs: u16) {
        self.keep_alive = secs;
    }

    pub fn client_id(&self) -> &[u8] {
        &self.client_id
    }

    /// Rejects non-empty identifiers outside `[0-9a-zA-Z]`.
    pub fn set_client_id(&mut self, id: impl Into<Bytes>) -> Result<()> {
        let id = id.into();
        if !is_valid_client_id(&id) {
            return Err(CodecError::IdentifierRejected);
        }
        self.client_id = id;
        Ok(())
    }

    pub fn will_topic(&self) -> &[u8] {
        &self.will_topic
    }

    /// Sets the will flag when non-empty; clears it once topic and message are both empty.
    pub fn set_will_topic(&mut self, topic: impl Into<Bytes>) {
        self.will_topic = topic.into();
        if !self.will_topic.is_empty() {
            self.flags.will = true;
        } else if self.will_message.is_empty() {
            self.flags.will = false;
        }
    }

    pub fn will_message(&self) -> &[u8] {
        &self.will_message
    }

    /// Sets the will flag when non-empty; clears it once topic and message are both empty.
    pub fn set_will_message(&mut self, message: impl Into<Bytes>) {
        self.will_message = message.into();
        if !self.will_message.is_empty() {
            self.flags.will = true;
        } else if self.will_topic.is_empty() {
            self.flags.will = false;
        }
    }

    pub fn username(&self) -> &[u8] {
        &self.username
    }

    /// Sets or clears the username flag to match.
    pub fn set_username(&mut self, username: impl Into<Bytes>) {
        self.username = username.into();
        self.flags.username = !self.username.is_empty();
    }

    pub fn password(&self) -> &[u8] {
        &self.password
    }

    /// Sets or clears the password flag to match.
    pub fn set_password(&mut self, password: impl Into<Bytes>) {
        self.password = password.into();
        self.flags.password = !self.password.is_empty();
    }

    /// Rules shared by decode and encode, checked once the flags are known.
    fn check_flags(flags: &ConnectFlags) -> Result<()> {
        if !flags.will && (flags.will_qos != QoS::AtMostOnce || flags.will_retain) {
            return Err(CodecError::violation(constants::ERR_WILL_FLAGS));
        }
        if flags.username && !flags.password {
            return Err(CodecError::violation(
                constants::ERR_USERNAME_WITHOUT_PASSWORD,
            ));
        }
        Ok(())
    }

    fn check_client_id(client_id: &[u8], clean_session: bool) -> Result<()> {
        if client_id.is_empty() && !clean_session {
            return Err(CodecError::IdentifierRejected);
        }
        if !is_valid_client_id(client_id) {
            return Err(CodecError::IdentifierRejected);
        }
        Ok(())
    }

    fn writes_username(&self) -> bool {
        self.flags.username && !self.username.is_empty()
    }

    fn writes_password(&self) -> bool {
        self.flags.password && !self.password.is_empty()
    }
}

impl ControlPacket for ConnectPacket {
    const PACKET_TYPE: PacketType = PacketType::Connect;

    fn validate(&self) -> Result<()> {
        if self.protocol_name().is_none() {
            return Err(CodecError::UnsupportedVersion(self.version));
        }
        Self::check_flags(&self.flags)?;
        // An omitted username would let the password decode in its place
        if self.flags.username && self.username.is_empty() && self.writes_password() {
            return Err(CodecError::violation(
                constants::ERR_PASSWORD_WITHOUT_USERNAME,
            ));
        }
        Self::check_client_id(&self.client_id, self.flags.clean_session)
    }

    fn remaining_length(&self) -> Result<usize> {
        let name = self
            .protocol_name()
            .ok_or(CodecError::UnsupportedVersion(self.version))?;

        // name, level, flags, keep alive, client id
        let mut total = lp_len(name.as_bytes()) + 1 + 1 + 2 + lp_len(&self.client_id);

        if self.flags.will {
            total += lp_len(&self.will_topic) + lp_len(&self.will_message);
        }
        // A set flag with an empty value is legal in 3.1 and writes nothing
        if self.writes_username() {
            total += lp_len(&self.username);
        }
        if self.writes_password() {
            total += lp_len(&self.password);
        }

        Ok(total)
    }

    fn decode_body(_flags: u8, body: &mut BodyReader) -> Result<Self> {
        let name = body.read_lp_bytes()?;
        let version = body.read_u8()?;

        match protocol_name(version) {
            Some(expected) if expected.as_bytes() == &name[..] => {}
            _ => return Err(CodecError::UnsupportedVersion(version)),
        }

        let flags = ConnectFlags::from_byte(body.read_u8()?)?;
        Self::check_flags(&flags)?;

        let keep_alive = body.read_u16()?;

        let client_id = body.read_lp_bytes()?;
        Self::check_client_id(&client_id, flags.clean_session)?;

        let (will_topic, will_message) = if flags.will {
            (body.read_lp_bytes()?, body.read_lp_bytes()?)
        } else {
            (Bytes::new(), Bytes::new())
        };

        let username = if flags.username && body.has_remaining() {
            body.read_lp_bytes()?
        } else {
            Bytes::new()
        };

        let password = if flags.password && body.has_remaining() {
            body.read_lp_bytes()?
        } else {
            Bytes::new()
        };

        trace!(version, keep_alive, "decoded CONNECT body");

        Ok(Self {
            version,
            flags,
            keep_alive,
            client_id,
            will_topic,
            will_message,
            username,
            password,
        })
    }

    fn encode_body(&self, dst: &mut BytesMut) -> Result<()> {
        let name = self
            .protocol_name()
            .ok_or(CodecError::UnsupportedVersion(self.version))?;

        write_lp_bytes(dst, name.as_bytes())?;
        dst.put_u8(self.version);
        dst.put_u8(self.flags.to_byte());
        dst.put_u16(self.keep_alive);
        write_lp_bytes(dst, &self.client_id)?;

        if self.flags.will {
            write_lp_bytes(dst, &self.will_topic)?;
            write_lp_bytes(dst, &self.will_message)?;
        }
        if self.writes_username() {
            write_lp_bytes(dst, &self.username)?;
        }
        if self.writes_password() {
            write_lp_bytes(dst, &self.password)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::protocol::connack::ConnackCode;

    fn connect_bytes(flags: u8, client_id: &[u8], tail: &[u8]) -> Vec<u8> {
        let mut body = vec![0, 4, b'M', b'Q', b'T', b'T', 4, flags, 0, 10];
        body.extend_from_slice(&(client_id.len() as u16).to_be_bytes());
        body.extend_from_slice(client_id);
        body.extend_from_slice(tail);

        let mut msg = vec![0x10, body.len() as u8];
        msg.extend_from_slice(&body);
        msg
    }

    fn full_connect_bytes() -> Vec<u8> {
        let mut tail = Vec::new();
        for field in [&b"will"[..], b"send me home", b"surgemq", b"verysecret"] {
            tail.extend_from_slice(&(field.len() as u16).to_be_bytes());
            tail.extend_from_slice(field);
        }
        // username, password, will qos 1, will, clean session
        connect_bytes(0b1100_1110, b"surgemq", &tail)
    }

    #[test]
    fn test_connect_fields() {
        let mut msg = ConnectPacket::new();

        assert!(msg.set_version(0x3).is_ok());
        assert_eq!(msg.version(), 3);
        assert_eq!(msg.protocol_name(), Some("MQIsdp"));
        assert!(matches!(
            msg.set_version(0x5),
            Err(CodecError::UnsupportedVersion(5))
        ));
        assert_eq!(msg.version(), 3);

        msg.set_clean_session(true);
        assert!(msg.clean_session());

        msg.set_will_topic("topic");
        assert!(msg.will_flag());
        msg.set_will_topic("");
        assert!(!msg.will_flag());
        msg.set_will_message("message");
        assert!(msg.will_flag());

        assert!(msg.set_will_qos(2).is_ok());
        assert_eq!(msg.will_qos(), QoS::ExactlyOnce);
        assert_eq!(
            msg.set_will_qos(3).unwrap_err().kind(),
            ErrorKind::ProtocolViolation
        );

        msg.set_username("myname");
        assert!(msg.username_flag());
        msg.set_username("");
        assert!(!msg.username_flag());

        msg.set_password("myword");
        assert!(msg.password_flag());

        assert!(msg.set_client_id("j0j0jfajf02j0asdjf").is_ok());
        assert_eq!(msg.client_id(), b"j0j0jfajf02j0asdjf");
        assert!(matches!(
            msg.set_client_id("this is no good"),
            Err(CodecError::IdentifierRejected)
        ));
        assert_eq!(msg.client_id(), b"j0j0jfajf02j0asdjf");
    }

    #[test]
    fn test_decode_full() {
        let bytes = full_connect_bytes();
        let (n, msg) = ConnectPacket::decode_slice(&bytes).unwrap();

        assert_eq!(n, bytes.len());
        assert_eq!(msg.version(), 4);
        assert_eq!(msg.keep_alive(), 10);
        assert!(msg.clean_session());
        assert!(msg.will_flag());
        assert_eq!(msg.will_qos(), QoS::AtLeastOnce);
        assert!(!msg.will_retain());
        assert_eq!(msg.client_id(), b"surgemq");
        assert_eq!(msg.will_topic(), b"will");
        assert_eq!(msg.will_message(), b"send me home");
        assert_eq!(msg.username(), b"surgemq");
        assert_eq!(msg.password(), b"verysecret");
    }

    #[test]
    fn test_encode_matches_wire() {
        let bytes = full_connect_bytes();

        let mut msg = ConnectPacket::new();
        msg.set_clean_session(true);
        msg.set_keep_alive(10);
        msg.set_client_id("surgemq").unwrap();
        msg.set_will_topic("will");
        msg.set_will_message("send me home");
        msg.set_will_qos(1).unwrap();
        msg.set_username("surgemq");
        msg.set_password("verysecret");

        let encoded = msg.to_bytes().unwrap();
        assert_eq!(&encoded[..], &bytes[..]);
        assert_eq!(msg.remaining_length().unwrap(), bytes.len() - 2);
    }

    #[test]
    fn test_mqisdp_round_trip() {
        let mut msg = ConnectPacket::new();
        msg.set_version(3).unwrap();
        msg.set_client_id("legacy").unwrap();

        let encoded = msg.to_bytes().unwrap();
        assert_eq!(&encoded[2..10], &[0, 6, b'M', b'Q', b'I', b's', b'd', b'p']);

        let (_, decoded) = ConnectPacket::decode_slice(&encoded).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.to_bytes().unwrap(), encoded);
    }

    #[test]
    fn test_decode_unsupported_version() {
        let mut bytes = connect_bytes(0b0000_0010, b"a", &[]);
        bytes[8] = 5;
        let err = ConnectPacket::decode_slice(&bytes).unwrap_err();
        assert!(matches!(err.error(), CodecError::UnsupportedVersion(5)));
        assert_eq!(
            err.connack_code(),
            Some(ConnackCode::UnacceptableProtocolVersion)
        );
    }

    #[test]
    fn test_decode_name_level_mismatch() {
        // "MQTT" with level 3
        let mut bytes = connect_bytes(0b0000_0010, b"a", &[]);
        bytes[8] = 3;
        let err = ConnectPacket::decode_slice(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
    }

    #[test]
    fn test_decode_reserved_bit() {
        let bytes = connect_bytes(0b0000_0011, b"a", &[]);
        let err = ConnectPacket::decode_slice(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_decode_will_qos_without_will_flag() {
        let bytes = connect_bytes(0b0000_1010, b"a", &[]);
        let err = ConnectPacket::decode_slice(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    }

    #[test]
    fn test_decode_will_retain_without_will_flag() {
        let bytes = connect_bytes(0b0010_0010, b"a", &[]);
        let err = ConnectPacket::decode_slice(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    }

    #[test]
    fn test_decode_username_without_password() {
        let bytes = connect_bytes(0b1000_0010, b"a", &[0, 1, b'u']);
        let err = ConnectPacket::decode_slice(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    }

    #[test]
    fn test_decode_empty_client_id_requires_clean_session() {
        let bytes = connect_bytes(0b0000_0000, b"", &[]);
        let err = ConnectPacket::decode_slice(&bytes).unwrap_err();
        assert!(matches!(err.error(), CodecError::IdentifierRejected));
        assert_eq!(err.connack_code(), Some(ConnackCode::IdentifierRejected));

        let bytes = connect_bytes(0b0000_0010, b"", &[]);
        let (_, msg) = ConnectPacket::decode_slice(&bytes).unwrap();
        assert!(msg.client_id().is_empty());
    }

    #[test]
    fn test_decode_invalid_client_id_charset() {
        let bytes = connect_bytes(0b0000_0010, b"bad-id", &[]);
        let err = ConnectPacket::decode_slice(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IdentifierRejected);
    }

    #[test]
    fn test_decode_long_client_id_accepted() {
        let id = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let bytes = connect_bytes(0b0000_0010, id, &[]);
        let (_, msg) = ConnectPacket::decode_slice(&bytes).unwrap();
        assert_eq!(msg.client_id(), id);
    }

    #[test]
    fn test_decode_flags_set_but_fields_absent() {
        // username + password flags with neither field on the wire
        let bytes = connect_bytes(0b1100_0010, b"a", &[]);
        let (_, msg) = ConnectPacket::decode_slice(&bytes).unwrap();
        assert!(msg.username_flag());
        assert!(msg.password_flag());
        assert!(msg.username().is_empty());
        assert!(msg.password().is_empty());

        // re-encoding writes neither field
        assert_eq!(&msg.to_bytes().unwrap()[..], &bytes[..]);
    }

    #[test]
    fn test_encode_rejects_password_behind_empty_username() {
        let mut msg = ConnectPacket::new();
        msg.set_clean_session(true);
        msg.set_username_flag(true);
        msg.set_password("pw");
        assert_eq!(
            msg.to_bytes().unwrap_err().kind(),
            ErrorKind::ProtocolViolation
        );

        // With a username the password lands in its own field
        msg.set_username("me");
        let (_, decoded) = ConnectPacket::decode_slice(&msg.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.password(), b"pw");
    }

    #[test]
    fn test_decode_zero_length_username_before_password() {
        // username present as a zero-length string, then a password
        let bytes = connect_bytes(0b1100_0010, b"a", &[0, 0, 0, 2, b'p', b'w']);
        let (_, msg) = ConnectPacket::decode_slice(&bytes).unwrap();
        assert!(msg.username().is_empty());
        assert_eq!(msg.password(), b"pw");
        // the encoder cannot reproduce an empty username field
        assert_eq!(
            msg.to_bytes().unwrap_err().kind(),
            ErrorKind::ProtocolViolation
        );
    }

    #[test]
    fn test_will_setters_keep_explicit_flag() {
        let mut msg = ConnectPacket::new();
        msg.set_will_message("bye");
        msg.set_will_flag(false);

        // An empty topic leaves the flag alone while the message is set
        msg.set_will_topic("");
        assert!(!msg.will_flag());

        msg.set_will_flag(true);
        msg.set_will_topic("");
        assert!(msg.will_flag());

        msg.set_will_message("");
        assert!(!msg.will_flag());
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let bytes = connect_bytes(0b0000_0010, b"a", &[0xFF]);
        let err = ConnectPacket::decode_slice(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_decode_truncated_will() {
        // will flag set, will topic declares 9 bytes but only 2 follow
        let bytes = connect_bytes(0b0000_0110, b"a", &[0, 9, b'w', b'i']);
        let err = ConnectPacket::decode_slice(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_encode_rejects_username_without_password() {
        let mut msg = ConnectPacket::new();
        msg.set_clean_session(true);
        msg.set_username("user");
        assert_eq!(
            msg.to_bytes().unwrap_err().kind(),
            ErrorKind::ProtocolViolation
        );
    }

    #[test]
    fn test_encode_rejects_empty_id_without_clean_session() {
        let msg = ConnectPacket::new();
        assert!(matches!(
            msg.to_bytes(),
            Err(CodecError::IdentifierRejected)
        ));
    }
}
