//! Routing of framed bodies to the variant decoders.
//!
//! The transport layer reads a Fixed Header and exactly Remaining-Length body
//! bytes, then calls [`dispatch`]. Unknown type nibbles never get this far:
//! [`PacketType`] only exists for codes 1..=14.

use crate::core::header::{FixedHeader, PacketType};
use crate::error::Result;
use crate::protocol::ack::{PubackPacket, PubcompPacket, PubrecPacket, PubrelPacket, UnsubackPacket};
use crate::protocol::connack::ConnackPacket;
use crate::protocol::connect::ConnectPacket;
use crate::protocol::empty::{DisconnectPacket, PingreqPacket, PingrespPacket};
use crate::protocol::packet::{ControlPacket, Packet};
use crate::protocol::publish::PublishPacket;
use crate::protocol::subscribe::{SubackPacket, SubscribePacket, UnsubscribePacket};
use bytes::Bytes;
use tracing::{debug, warn};

/// Decode a framed body into the packet variant named by `header`.
pub fn dispatch(header: &FixedHeader, body: Bytes) -> Result<Packet> {
    let result = match header.packet_type {
        PacketType::Connect => ConnectPacket::from_frame(header, body).map(Packet::Connect),
        PacketType::Connack => ConnackPacket::from_frame(header, body).map(Packet::Connack),
        PacketType::Publish => PublishPacket::from_frame(header, body).map(Packet::Publish),
        PacketType::Puback => PubackPacket::from_frame(header, body).map(Packet::Puback),
        PacketType::Pubrec => PubrecPacket::from_frame(header, body).map(Packet::Pubrec),
        PacketType::Pubrel => PubrelPacket::from_frame(header, body).map(Packet::Pubrel),
        PacketType::Pubcomp => PubcompPacket::from_frame(header, body).map(Packet::Pubcomp),
        PacketType::Subscribe => SubscribePacket::from_frame(header, body).map(Packet::Subscribe),
        PacketType::Suback => SubackPacket::from_frame(header, body).map(Packet::Suback),
        PacketType::Unsubscribe => {
            UnsubscribePacket::from_frame(header, body).map(Packet::Unsubscribe)
        }
        PacketType::Unsuback => UnsubackPacket::from_frame(header, body).map(Packet::Unsuback),
        PacketType::Pingreq => PingreqPacket::from_frame(header, body).map(Packet::Pingreq),
        PacketType::Pingresp => PingrespPacket::from_frame(header, body).map(Packet::Pingresp),
        PacketType::Disconnect => {
            DisconnectPacket::from_frame(header, body).map(Packet::Disconnect)
        }
    };

    match &result {
        Ok(packet) => debug!(
            packet_type = %header.packet_type,
            remaining_length = header.remaining_length,
            %packet,
            "Decoded packet"
        ),
        Err(e) => warn!(
            packet_type = %header.packet_type,
            remaining_length = header.remaining_length,
            kind = ?e.kind(),
            error = %e,
            "Rejected packet"
        ),
    }

    result
}
