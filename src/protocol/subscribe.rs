//! SUBSCRIBE, SUBACK and UNSUBSCRIBE.
//!
//! ```text
//! SUBSCRIBE    [Packet Id(2)] ([Topic Filter(LP)] [Requested QoS(1)])+
//! SUBACK       [Packet Id(2)] [Return Code(1)]+
//! UNSUBSCRIBE  [Packet Id(2)] [Topic Filter(LP)]+
//! ```
//!
//! Filters may contain wildcards; the codec never matches them.

use crate::core::header::PacketType;
use crate::core::primitives::{lp_len, write_lp_bytes, BodyReader};
use crate::error::{constants, CodecError, Result};
use crate::protocol::flags::{mask, QoS};
use crate::protocol::packet::{ControlPacket, PacketIdentifier};
use crate::protocol::topic::is_valid_topic_filter;
use bytes::{BufMut, Bytes, BytesMut};

fn check_filter(filter: &[u8]) -> Result<()> {
    if is_valid_topic_filter(filter) {
        Ok(())
    } else {
        Err(CodecError::violation(constants::ERR_EMPTY_TOPIC_FILTER))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubscribePacket {
    packet_id: u16,
    topics: Vec<(Bytes, QoS)>,
}

impl SubscribePacket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters in request order with their requested QoS.
    pub fn topics(&self) -> &[(Bytes, QoS)] {
        &self.topics
    }

    /// Add a filter, or update its QoS if it is already present.
    pub fn add_topic(&mut self, filter: impl Into<Bytes>, qos: u8) -> Result<()> {
        let filter = filter.into();
        check_filter(&filter)?;
        let qos = QoS::try_from(qos)?;

        match self.topics.iter_mut().find(|(f, _)| *f == filter) {
            Some(entry) => entry.1 = qos,
            None => self.topics.push((filter, qos)),
        }
        Ok(())
    }

    pub fn remove_topic(&mut self, filter: &[u8]) {
        self.topics.retain(|(f, _)| f.as_ref() != filter);
    }

    pub fn topic_exists(&self, filter: &[u8]) -> bool {
        self.topic_qos(filter).is_some()
    }

    pub fn topic_qos(&self, filter: &[u8]) -> Option<QoS> {
        self.topics
            .iter()
            .find(|(f, _)| f.as_ref() == filter)
            .map(|&(_, qos)| qos)
    }
}

impl PacketIdentifier for SubscribePacket {
    fn packet_id(&self) -> u16 {
        self.packet_id
    }

    fn set_packet_id(&mut self, id: u16) {
        self.packet_id = id;
    }
}

impl ControlPacket for SubscribePacket {
    const PACKET_TYPE: PacketType = PacketType::Subscribe;

    fn validate(&self) -> Result<()> {
        if self.topics.is_empty() {
            return Err(CodecError::violation(constants::ERR_EMPTY_TOPIC_LIST));
        }
        self.topics.iter().try_for_each(|(f, _)| check_filter(f))
    }

    fn remaining_length(&self) -> Result<usize> {
        Ok(2 + self
            .topics
            .iter()
            .map(|(f, _)| lp_len(f) + 1)
            .sum::<usize>())
    }

    fn decode_body(_flags: u8, body: &mut BodyReader) -> Result<Self> {
        let packet_id = body.read_u16()?;

        let mut topics = Vec::new();
        while body.has_remaining() {
            let filter = body.read_lp_bytes()?;
            check_filter(&filter)?;

            let options = body.read_u8()?;
            if options & mask::SUBSCRIBE_RESERVED != 0 {
                return Err(CodecError::malformed(constants::ERR_SUBSCRIBE_OPTIONS));
            }
            let qos = QoS::try_from(options & mask::SUBSCRIBE_QOS)
                .map_err(|_| CodecError::malformed(constants::ERR_INVALID_QOS))?;
            topics.push((filter, qos));
        }

        if topics.is_empty() {
            return Err(CodecError::violation(constants::ERR_EMPTY_TOPIC_LIST));
        }

        Ok(Self { packet_id, topics })
    }

    fn encode_body(&self, dst: &mut BytesMut) -> Result<()> {
        dst.put_u16(self.packet_id);
        for (filter, qos) in &self.topics {
            write_lp_bytes(dst, filter)?;
            dst.put_u8(*qos as u8);
        }
        Ok(())
    }
}

/// Per-filter result carried by SUBACK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubackCode {
    /// Granted at the given QoS
    Success(QoS),
    Failure,
}

impl SubackCode {
    pub const FAILURE: u8 = 0x80;

    pub fn to_byte(self) -> u8 {
        match self {
            SubackCode::Success(qos) => qos as u8,
            SubackCode::Failure => Self::FAILURE,
        }
    }
}

impl TryFrom<u8> for SubackCode {
    type Error = CodecError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(SubackCode::Success(QoS::AtMostOnce)),
            1 => Ok(SubackCode::Success(QoS::AtLeastOnce)),
            2 => Ok(SubackCode::Success(QoS::ExactlyOnce)),
            Self::FAILURE => Ok(SubackCode::Failure),
            _ => Err(CodecError::Malformed(format!(
                "{}: {value:#04x}",
                constants::ERR_SUBACK_CODE
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubackPacket {
    packet_id: u16,
    return_codes: Vec<SubackCode>,
}

impl SubackPacket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn return_codes(&self) -> &[SubackCode] {
        &self.return_codes
    }

    pub fn add_return_code(&mut self, code: SubackCode) {
        self.return_codes.push(code);
    }

    /// Add a raw return code byte, rejecting anything outside {0, 1, 2, 0x80}.
    pub fn add_return_byte(&mut self, code: u8) -> Result<()> {
        self.return_codes.push(SubackCode::try_from(code)?);
        Ok(())
    }
}

impl PacketIdentifier for SubackPacket {
    fn packet_id(&self) -> u16 {
        self.packet_id
    }

    fn set_packet_id(&mut self, id: u16) {
        self.packet_id = id;
    }
}

impl ControlPacket for SubackPacket {
    const PACKET_TYPE: PacketType = PacketType::Suback;

    fn validate(&self) -> Result<()> {
        if self.return_codes.is_empty() {
            return Err(CodecError::violation(constants::ERR_EMPTY_RETURN_CODES));
        }
        Ok(())
    }

    fn remaining_length(&self) -> Result<usize> {
        Ok(2 + self.return_codes.len())
    }

    fn decode_body(_flags: u8, body: &mut BodyReader) -> Result<Self> {
        let packet_id = body.read_u16()?;
        let rest = body.read_rest();
        if rest.is_empty() {
            return Err(CodecError::violation(constants::ERR_EMPTY_RETURN_CODES));
        }
        let return_codes = rest
            .iter()
            .map(|&b| SubackCode::try_from(b))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            packet_id,
            return_codes,
        })
    }

    fn encode_body(&self, dst: &mut BytesMut) -> Result<()> {
        dst.put_u16(self.packet_id);
        for code in &self.return_codes {
            dst.put_u8(code.to_byte());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnsubscribePacket {
    packet_id: u16,
    topics: Vec<Bytes>,
}

impl UnsubscribePacket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topics(&self) -> &[Bytes] {
        &self.topics
    }

    /// Add a filter; duplicates are ignored.
    pub fn add_topic(&mut self, filter: impl Into<Bytes>) -> Result<()> {
        let filter = filter.into();
        check_filter(&filter)?;
        if !self.topics.contains(&filter) {
            self.topics.push(filter);
        }
        Ok(())
    }

    pub fn remove_topic(&mut self, filter: &[u8]) {
        self.topics.retain(|f| f.as_ref() != filter);
    }

    pub fn topic_exists(&self, filter: &[u8]) -> bool {
        self.topics.iter().any(|f| f.as_ref() == filter)
    }
}

impl PacketIdentifier for UnsubscribePacket {
    fn packet_id(&self) -> u16 {
        self.packet_id
    }

    fn set_packet_id(&mut self, id: u16) {
        self.packet_id = id;
    }
}

impl ControlPacket for UnsubscribePacket {
    const PACKET_TYPE: PacketType = PacketType::Unsubscribe;

    fn validate(&self) -> Result<()> {
        if self.topics.is_empty() {
            return Err(CodecError::violation(constants::ERR_EMPTY_TOPIC_LIST));
        }
        self.topics.iter().try_for_each(|f| check_filter(f))
    }

    fn remaining_length(&self) -> Result<usize> {
        Ok(2 + self.topics.iter().map(|f| lp_len(f)).sum::<usize>())
    }

    fn decode_body(_flags: u8, body: &mut BodyReader) -> Result<Self> {
        let packet_id = body.read_u16()?;

        let mut topics = Vec::new();
        while body.has_remaining() {
            let filter = body.read_lp_bytes()?;
            check_filter(&filter)?;
            topics.push(filter);
        }

        if topics.is_empty() {
            return Err(CodecError::violation(constants::ERR_EMPTY_TOPIC_LIST));
        }

        Ok(Self { packet_id, topics })
    }

    fn encode_body(&self, dst: &mut BytesMut) -> Result<()> {
        dst.put_u16(self.packet_id);
        for filter in &self.topics {
            write_lp_bytes(dst, filter)?;
        }
        Ok(())
    }
}
