//! # Error Types
//!
//! Error handling for the MQTT packet codec.
//!
//! Every fallible operation in the crate returns [`CodecError`]. A malformed or
//! forbidden packet is a protocol error that ends the connection, so the codec
//! stops at the first failure and never hands back a partial packet.
//!
//! ## Error Kinds
//! - **Malformed**: framing violations (bad varint, short body, leftover bytes, reserved bits)
//! - **ProtocolViolation**: well-formed bytes carrying a forbidden combination
//! - **IdentifierRejected**: CONNECT client identifier refused
//! - **UnsupportedVersion**: CONNECT protocol name/level not supported
//! - **Io**: the caller-supplied byte source failed
//!
//! Reading from a byte source fails with [`DecodeError`], which wraps the
//! [`CodecError`] with the number of bytes the source had already handed over.
//!
//! Callers branch on [`CodecError::kind`] instead of matching message text. For
//! CONNECT, [`CodecError::connack_code`] tells a broker whether it must answer
//! with a CONNACK before closing.
//!
//! ## Example Usage
//! ```rust
//! use mqtt_codec::error::ErrorKind;
//! use mqtt_codec::protocol::packet::Packet;
//! use tracing::{info, warn};
//!
//! // PINGREQ with a stray body byte
//! match Packet::decode_slice(&[0xC0, 0x01, 0x00]) {
//!     Ok((n, packet)) => info!(bytes = n, %packet, "decoded"),
//!     Err(e) => {
//!         assert_eq!(e.kind(), ErrorKind::Malformed);
//!         assert_eq!(e.consumed(), 3);
//!         warn!(error = %e, "dropping connection");
//!     }
//! }
//! ```

use crate::protocol::connack::ConnackCode;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Framing errors
    pub const ERR_SHORT_BODY: &str = "Declared length exceeds available bytes";
    pub const ERR_TRAILING_BYTES: &str = "Unexpected bytes after packet body";
    pub const ERR_INVALID_FLAGS: &str = "Invalid fixed header flags";
    pub const ERR_STRING_TOO_LONG: &str = "Byte string exceeds 65535 bytes";

    /// CONNECT errors
    pub const ERR_CONNECT_RESERVED: &str = "Connect flags reserved bit is not 0";
    pub const ERR_WILL_FLAGS: &str =
        "Will QoS and Will Retain must be 0 when the Will flag is not set";
    pub const ERR_USERNAME_WITHOUT_PASSWORD: &str =
        "Username flag is set but Password flag is not set";
    pub const ERR_PASSWORD_WITHOUT_USERNAME: &str =
        "Password cannot be written after an empty username";

    /// PUBLISH errors
    pub const ERR_INVALID_QOS: &str = "Invalid QoS level";
    pub const ERR_INVALID_TOPIC: &str = "Topic name must not be empty or contain wildcards";

    /// SUBSCRIBE/UNSUBSCRIBE/SUBACK errors
    pub const ERR_EMPTY_TOPIC_LIST: &str = "Topic filter list must not be empty";
    pub const ERR_EMPTY_TOPIC_FILTER: &str = "Topic filter must not be empty";
    pub const ERR_SUBSCRIBE_OPTIONS: &str = "Requested QoS byte has reserved bits set";
    pub const ERR_SUBACK_CODE: &str = "Invalid SUBACK return code";
    pub const ERR_EMPTY_RETURN_CODES: &str = "SUBACK return code list must not be empty";

    /// CONNACK errors
    pub const ERR_CONNACK_RESERVED: &str = "Connack acknowledge flags reserved bits are not 0";
    pub const ERR_CONNACK_CODE: &str = "Invalid CONNACK return code";
}

/// Classification carried by every [`CodecError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Structural or framing violation
    Malformed,
    /// Well-formed bytes that the protocol forbids
    ProtocolViolation,
    /// CONNECT client identifier refused
    IdentifierRejected,
    /// CONNECT protocol version not supported
    UnsupportedVersion,
    /// Failure of the underlying byte source
    Io,
}

// CodecError is the primary error type for all codec operations
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unexpected end of stream: {needed} more bytes required")]
    UnexpectedEof { needed: usize },

    #[error("Invalid packet type: {0}")]
    InvalidPacketType(u8),

    #[error("Invalid remaining length encoding")]
    InvalidRemainingLength,

    #[error("Packet too large: {size} bytes (limit {limit})")]
    OversizedPacket { size: usize, limit: usize },

    #[error("Malformed packet: {0}")]
    Malformed(String),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Identifier rejected")]
    IdentifierRejected,

    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    #[error("Unexpected packet: expected {expected}, got {got}")]
    UnexpectedPacket { expected: String, got: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CodecError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        CodecError::Malformed(msg.into())
    }

    pub(crate) fn violation(msg: impl Into<String>) -> Self {
        CodecError::ProtocolViolation(msg.into())
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::Io(_) => ErrorKind::Io,
            CodecError::UnexpectedEof { .. }
            | CodecError::InvalidPacketType(_)
            | CodecError::InvalidRemainingLength
            | CodecError::OversizedPacket { .. }
            | CodecError::Malformed(_) => ErrorKind::Malformed,
            CodecError::ProtocolViolation(_)
            | CodecError::UnexpectedPacket { .. }
            | CodecError::ConfigError(_) => ErrorKind::ProtocolViolation,
            CodecError::IdentifierRejected => ErrorKind::IdentifierRejected,
            CodecError::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
        }
    }

    /// CONNACK return code a server must send before closing, if any.
    ///
    /// `None` means the connection is closed without a response.
    pub fn connack_code(&self) -> Option<ConnackCode> {
        match self.kind() {
            ErrorKind::UnsupportedVersion => Some(ConnackCode::UnacceptableProtocolVersion),
            ErrorKind::IdentifierRejected => Some(ConnackCode::IdentifierRejected),
            _ => None,
        }
    }
}

/// Type alias for Results using CodecError
pub type Result<T> = std::result::Result<T, CodecError>;

/// A decode failure together with the bytes already taken from the source.
///
/// Readers pull header and body bytes before a packet can be judged, so a
/// caller reading from a stream learns here how far the source advanced.
#[derive(Error, Debug)]
#[error("{error} (after {consumed} bytes)")]
pub struct DecodeError {
    consumed: usize,
    #[source]
    error: CodecError,
}

impl DecodeError {
    pub(crate) fn new(consumed: usize, error: CodecError) -> Self {
        Self { consumed, error }
    }

    /// Bytes read from the source before the failure was detected.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn error(&self) -> &CodecError {
        &self.error
    }

    pub fn into_error(self) -> CodecError {
        self.error
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn connack_code(&self) -> Option<ConnackCode> {
        self.error.connack_code()
    }
}

impl From<DecodeError> for CodecError {
    fn from(e: DecodeError) -> Self {
        e.error
    }
}

/// Result of reading a packet from a byte source.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
