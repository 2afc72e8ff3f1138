//! Remaining Length encoding.
//!
//! The Remaining Length is a base-128 integer: each byte carries 7 value bits,
//! and the high bit is set on every byte except the last. This allows:
//! - 0-127: 1 byte
//! - 128-16383: 2 bytes
//! - 16384-2097151: 3 bytes
//! - 2097152-268435455: 4 bytes
//!
//! Encoding always produces the minimal form. A fifth continuation byte is a
//! framing error.

use crate::config::{MAX_REMAINING_LENGTH, MAX_VARINT_BYTES};
use crate::error::{CodecError, Result};
use bytes::BufMut;

/// Decode a Remaining Length from the front of `buf`.
///
/// Returns `Ok(Some((value, bytes_consumed)))` if successful,
/// `Ok(None)` if more data is needed, or `Err` if the encoding is invalid.
///
/// # Example
/// ```
/// use mqtt_codec::core::varint::decode;
/// let (value, consumed) = decode(&[0x80, 0x01]).unwrap().unwrap();
/// assert_eq!(value, 128);
/// assert_eq!(consumed, 2);
/// ```
pub fn decode(buf: &[u8]) -> Result<Option<(usize, usize)>> {
    let mut value = 0usize;

    for (i, &byte) in buf.iter().enumerate() {
        if i == MAX_VARINT_BYTES {
            return Err(CodecError::InvalidRemainingLength);
        }

        value |= ((byte & 0x7F) as usize) << (7 * i);

        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
    }

    // A fifth byte is already known to be invalid, no need to wait for it
    if buf.len() >= MAX_VARINT_BYTES {
        return Err(CodecError::InvalidRemainingLength);
    }

    Ok(None)
}

/// Incremental decoder fed one byte at a time, for byte sources that cannot peek.
#[derive(Debug, Default, Clone, Copy)]
pub struct VarintDecoder {
    value: usize,
    count: usize,
}

impl VarintDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next byte. Returns the value once the terminating byte is seen.
    pub fn push(&mut self, byte: u8) -> Result<Option<usize>> {
        if self.count == MAX_VARINT_BYTES {
            return Err(CodecError::InvalidRemainingLength);
        }

        self.value |= ((byte & 0x7F) as usize) << (7 * self.count);
        self.count += 1;

        if byte & 0x80 == 0 {
            Ok(Some(self.value))
        } else {
            Ok(None)
        }
    }

    /// Bytes consumed so far.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Encode `value` into `dst`, returning the number of bytes written.
///
/// Fails if `value` exceeds 268,435,455.
///
/// # Example
/// ```
/// use bytes::BytesMut;
/// use mqtt_codec::core::varint::encode;
/// let mut buf = BytesMut::new();
/// assert_eq!(encode(300, &mut buf).unwrap(), 2);
/// assert_eq!(&buf[..], &[0xAC, 0x02]);
/// ```
pub fn encode<B: BufMut>(mut value: usize, dst: &mut B) -> Result<usize> {
    if value > MAX_REMAINING_LENGTH {
        return Err(CodecError::OversizedPacket {
            size: value,
            limit: MAX_REMAINING_LENGTH,
        });
    }

    let mut written = 0;
    loop {
        let mut byte = (value % 128) as u8;
        value /= 128;
        if value > 0 {
            byte |= 0x80;
        }
        dst.put_u8(byte);
        written += 1;
        if value == 0 {
            break;
        }
    }
    Ok(written)
}

/// Number of bytes needed to encode `value`, or `None` if it is unencodable.
///
/// # Example
/// ```
/// use mqtt_codec::core::varint::encoded_len;
/// assert_eq!(encoded_len(127), Some(1));
/// assert_eq!(encoded_len(128), Some(2));
/// assert_eq!(encoded_len(268_435_456), None);
/// ```
pub fn encoded_len(value: usize) -> Option<usize> {
    match value {
        0..=127 => Some(1),
        128..=16_383 => Some(2),
        16_384..=2_097_151 => Some(3),
        2_097_152..=MAX_REMAINING_LENGTH => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_decode_single_byte() {
        assert_eq!(decode(&[0]).unwrap(), Some((0, 1)));
        assert_eq!(decode(&[0x7F]).unwrap(), Some((127, 1)));
    }

    #[test]
    fn test_decode_multi_byte() {
        assert_eq!(decode(&[0x80, 0x01]).unwrap(), Some((128, 2)));
        assert_eq!(decode(&[0xFF, 0x7F]).unwrap(), Some((16383, 2)));
        assert_eq!(decode(&[0x80, 0x80, 0x01]).unwrap(), Some((16384, 3)));
        assert_eq!(decode(&[0xFF, 0xFF, 0x7F]).unwrap(), Some((2097151, 3)));
        assert_eq!(
            decode(&[0x80, 0x80, 0x80, 0x01]).unwrap(),
            Some((2097152, 4))
        );
        assert_eq!(
            decode(&[0xFF, 0xFF, 0xFF, 0x7F]).unwrap(),
            Some((268435455, 4))
        );
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        assert_eq!(decode(&[0x05, 0xFF, 0xFF]).unwrap(), Some((5, 1)));
    }

    #[test]
    fn test_decode_incomplete() {
        assert_eq!(decode(&[]).unwrap(), None);
        assert_eq!(decode(&[0x80]).unwrap(), None);
        assert_eq!(decode(&[0x80, 0x80, 0x80]).unwrap(), None);
    }

    #[test]
    fn test_decode_fifth_byte_rejected() {
        assert!(matches!(
            decode(&[0x80, 0x80, 0x80, 0x80, 0x01]),
            Err(CodecError::InvalidRemainingLength)
        ));
        // Known bad after four continuation bytes, even without a fifth byte
        assert!(decode(&[0xFF, 0xFF, 0xFF, 0xFF]).is_err());
    }

    #[test]
    fn test_incremental_decoder() {
        let mut dec = VarintDecoder::new();
        assert!(dec.is_empty());
        assert_eq!(dec.push(0xC1).unwrap(), None);
        assert_eq!(dec.push(0x02).unwrap(), Some(321));
        assert_eq!(dec.len(), 2);

        let mut dec = VarintDecoder::new();
        for _ in 0..4 {
            assert_eq!(dec.push(0x80).unwrap(), None);
        }
        assert!(dec.push(0x01).is_err());
    }

    #[test]
    fn test_encode_byte_counts() {
        let table = [
            (0usize, 1usize),
            (127, 1),
            (128, 2),
            (16383, 2),
            (16384, 3),
            (2097151, 3),
            (2097152, 4),
            (268435455, 4),
        ];
        for (value, expected) in table {
            let mut buf = BytesMut::new();
            assert_eq!(encode(value, &mut buf).unwrap(), expected, "value {value}");
            assert_eq!(buf.len(), expected);
            assert_eq!(encoded_len(value), Some(expected));
            assert_eq!(decode(&buf).unwrap(), Some((value, expected)));
        }
    }

    #[test]
    fn test_encode_out_of_range() {
        let mut buf = BytesMut::new();
        assert!(encode(268_435_456, &mut buf).is_err());
        assert!(buf.is_empty());
        assert_eq!(encoded_len(268_435_456), None);
    }
}
