//! # mqtt-codec
//!
//! Encoder/decoder for MQTT 3.1 and 3.1.1 control packets.
//!
//! The crate turns raw bytes into typed packets and back, enforcing the
//! framing and per-packet validity rules of the protocol. Connection state,
//! sessions, retransmission and routing belong to the caller.
//!
//! ## Layers
//! - [`core`](crate::core): Remaining Length varint, length-prefixed strings, Fixed Header,
//!   frame readers and the `tokio_util` stream codec
//! - [`protocol`]: the fourteen packet variants, their flag values and the dispatcher
//! - [`error`]: [`CodecError`] and its [`ErrorKind`] classification
//! - [`config`]: wire constants and [`CodecConfig`]
//! - [`utils`]: logging setup and codec metrics
//!
//! ## Example
//! ```rust
//! use mqtt_codec::protocol::packet::{ControlPacket, Packet, PacketIdentifier};
//! use mqtt_codec::protocol::publish::PublishPacket;
//!
//! let mut publish = PublishPacket::new();
//! publish.set_topic("surgemq").unwrap();
//! publish.set_qos(1).unwrap();
//! publish.set_packet_id(7);
//! publish.set_payload("send me home");
//!
//! let bytes = publish.to_bytes().unwrap();
//! assert_eq!(&bytes[..2], &[0x32, 23]);
//!
//! let (consumed, packet) = Packet::decode_slice(&bytes).unwrap();
//! assert_eq!(consumed, bytes.len());
//! assert_eq!(packet.packet_id(), Some(7));
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use crate::config::CodecConfig;
pub use crate::core::codec::MqttCodec;
pub use crate::core::header::{FixedHeader, PacketType};
pub use crate::error::{CodecError, DecodeError, DecodeResult, ErrorKind, Result};
pub use crate::protocol::flags::QoS;
pub use crate::protocol::packet::{ControlPacket, Packet, PacketIdentifier};
