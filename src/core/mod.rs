//! # Core Wire Components
//!
//! Framing primitives shared by every packet type.
//!
//! ## Components
//! - **Varint**: Remaining Length encode/decode
//! - **Primitives**: big-endian integers and length-prefixed byte strings
//! - **Header**: packet type codes and the Fixed Header
//! - **Reader**: read-until-length loops over `std::io::Read` and `tokio::io::AsyncRead`
//! - **Codec**: `tokio_util` codec for framed byte streams
//!
//! ## Wire Format
//! ```text
//! [Type(4 bits) | Flags(4 bits)] [Remaining Length(1-4)] [Body(Remaining Length)]
//! ```
//!
//! ## Limits
//! - Remaining Length at most 268,435,455 bytes
//! - Decoders reject frames above the configured `max_packet_size` before buffering the body

pub mod codec;
pub mod header;
pub mod primitives;
pub mod reader;
pub mod varint;
