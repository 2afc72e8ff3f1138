//! Acknowledgements whose whole body is a packet identifier.
//!
//! ```text
//! [Packet Id(2)]
//! ```
//!
//! PUBACK, PUBREC, PUBREL, PUBCOMP and UNSUBACK share this layout. PUBREL is
//! the only one with a non-zero flag nibble (`0010`), which the Fixed Header
//! layer enforces.

use crate::core::header::PacketType;
use crate::core::primitives::BodyReader;
use crate::error::Result;
use crate::protocol::packet::{ControlPacket, PacketIdentifier};
use bytes::{BufMut, BytesMut};

macro_rules! id_only_packet {
    ($(#[$doc:meta])* $name:ident, $ty:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name {
            packet_id: u16,
        }

        impl $name {
            pub fn new(packet_id: u16) -> Self {
                Self { packet_id }
            }
        }

        impl PacketIdentifier for $name {
            fn packet_id(&self) -> u16 {
                self.packet_id
            }

            fn set_packet_id(&mut self, id: u16) {
                self.packet_id = id;
            }
        }

        impl ControlPacket for $name {
            const PACKET_TYPE: PacketType = $ty;

            fn remaining_length(&self) -> Result<usize> {
                Ok(2)
            }

            fn decode_body(_flags: u8, body: &mut BodyReader) -> Result<Self> {
                Ok(Self {
                    packet_id: body.read_u16()?,
                })
            }

            fn encode_body(&self, dst: &mut BytesMut) -> Result<()> {
                dst.put_u16(self.packet_id);
                Ok(())
            }
        }
    };
}

id_only_packet!(
    /// QoS 1 publish acknowledgement.
    PubackPacket,
    PacketType::Puback
);
id_only_packet!(
    /// QoS 2 publish received (part 1).
    PubrecPacket,
    PacketType::Pubrec
);
id_only_packet!(
    /// QoS 2 publish release (part 2).
    PubrelPacket,
    PacketType::Pubrel
);
id_only_packet!(
    /// QoS 2 publish complete (part 3).
    PubcompPacket,
    PacketType::Pubcomp
);
id_only_packet!(
    /// Acknowledges an UNSUBSCRIBE.
    UnsubackPacket,
    PacketType::Unsuback
);
