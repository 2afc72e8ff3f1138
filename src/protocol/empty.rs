//! Packets with neither variable header nor payload.

use crate::core::header::PacketType;
use crate::core::primitives::BodyReader;
use crate::error::Result;
use crate::protocol::packet::ControlPacket;
use bytes::BytesMut;

macro_rules! empty_packet {
    ($(#[$doc:meta])* $name:ident, $ty:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name;

        impl ControlPacket for $name {
            const PACKET_TYPE: PacketType = $ty;

            fn remaining_length(&self) -> Result<usize> {
                Ok(0)
            }

            fn decode_body(_flags: u8, _body: &mut BodyReader) -> Result<Self> {
                Ok($name)
            }

            fn encode_body(&self, _dst: &mut BytesMut) -> Result<()> {
                Ok(())
            }
        }
    };
}

empty_packet!(
    /// Client keepalive probe.
    PingreqPacket,
    PacketType::Pingreq
);
empty_packet!(
    /// Server reply to a PINGREQ.
    PingrespPacket,
    PacketType::Pingresp
);
empty_packet!(
    /// Clean client disconnect.
    DisconnectPacket,
    PacketType::Disconnect
);
