//! # MQTT Control Packets
//!
//! Typed bodies for the fourteen MQTT 3.1/3.1.1 control packets.
//!
//! ## Components
//! - **Packet**: the [`ControlPacket`](packet::ControlPacket) capability set and the [`Packet`](packet::Packet) sum type
//! - **Dispatcher**: routes a framed body to the right variant decoder
//! - **Flags**: bit-mask table, QoS and the packed CONNECT/PUBLISH flag values
//! - **Topic**: topic name, topic filter and client identifier checks
//!
//! ## Variants
//! - `connect`, `connack`: session establishment
//! - `publish`, `ack`: message delivery and its acknowledgements
//! - `subscribe`: SUBSCRIBE, SUBACK, UNSUBSCRIBE (UNSUBACK lives in `ack`)
//! - `empty`: PINGREQ, PINGRESP, DISCONNECT

pub mod ack;
pub mod connack;
pub mod connect;
pub mod dispatcher;
pub mod empty;
pub mod flags;
pub mod packet;
pub mod publish;
pub mod subscribe;
pub mod topic;
