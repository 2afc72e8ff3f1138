//! Fixed-width integers and length-prefixed byte strings.
//!
//! Every packet body is read through a [`BodyReader`] holding exactly the
//! Remaining-Length bytes of one frame. Reads never run past that window, and
//! [`BodyReader::finish`] rejects anything left over.

use crate::error::{constants, CodecError, Result};
use bytes::{Buf, BufMut, Bytes};

/// Largest byte string a 2-byte length prefix can describe
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Cursor over the body of a single frame.
///
/// Byte strings are handed out as zero-copy slices of the frame buffer.
#[derive(Debug, Clone)]
pub struct BodyReader {
    buf: Bytes,
}

impl BodyReader {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    /// Bytes not yet consumed.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn has_remaining(&self) -> bool {
        !self.buf.is_empty()
    }

    fn require(&self, n: usize) -> Result<()> {
        if self.buf.len() < n {
            return Err(CodecError::Malformed(format!(
                "{}: need {n}, have {}",
                constants::ERR_SHORT_BODY,
                self.buf.len()
            )));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.require(1)?;
        Ok(self.buf.get_u8())
    }

    /// Big-endian 16-bit integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.require(2)?;
        Ok(self.buf.get_u16())
    }

    /// 2-byte length prefix followed by that many raw bytes.
    pub fn read_lp_bytes(&mut self) -> Result<Bytes> {
        let len = self.read_u16()? as usize;
        self.require(len)?;
        Ok(self.buf.split_to(len))
    }

    /// Everything left in the body, leaving the reader empty.
    pub fn read_rest(&mut self) -> Bytes {
        std::mem::take(&mut self.buf)
    }

    /// Succeeds only if the whole body was consumed.
    pub fn finish(self) -> Result<()> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(CodecError::Malformed(format!(
                "{}: {} bytes left",
                constants::ERR_TRAILING_BYTES,
                self.buf.len()
            )))
        }
    }
}

/// Encoded size of a length-prefixed byte string.
#[inline]
pub fn lp_len(data: &[u8]) -> usize {
    2 + data.len()
}

/// Write a 2-byte length prefix followed by `data`, returning the bytes written.
pub fn write_lp_bytes<B: BufMut>(dst: &mut B, data: &[u8]) -> Result<usize> {
    if data.len() > MAX_STRING_LEN {
        return Err(CodecError::Malformed(format!(
            "{}: {} bytes",
            constants::ERR_STRING_TOO_LONG,
            data.len()
        )));
    }
    dst.put_u16(data.len() as u16);
    dst.put_slice(data);
    Ok(lp_len(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use bytes::BytesMut;

    #[test]
    fn test_read_u16_big_endian() {
        let mut r = BodyReader::new(Bytes::from_static(&[0x12, 0x34]));
        assert_eq!(r.read_u16().unwrap(), 0x1234);
        assert!(r.finish().is_ok());
    }

    #[test]
    fn test_read_lp_bytes() {
        let mut r = BodyReader::new(Bytes::from_static(&[0, 5, b'h', b'e', b'l', b'l', b'o', 9]));
        assert_eq!(&r.read_lp_bytes().unwrap()[..], b"hello");
        assert_eq!(r.remaining(), 1);
        assert_eq!(r.read_u8().unwrap(), 9);
        assert!(!r.has_remaining());
    }

    #[test]
    fn test_declared_length_exceeds_body() {
        let mut r = BodyReader::new(Bytes::from_static(&[0, 10, b'a', b'b']));
        let err = r.read_lp_bytes().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_short_reads_fail() {
        let mut r = BodyReader::new(Bytes::from_static(&[7]));
        assert!(r.read_u16().is_err());
        let mut r = BodyReader::new(Bytes::new());
        assert!(r.read_u8().is_err());
    }

    #[test]
    fn test_finish_rejects_leftover() {
        let mut r = BodyReader::new(Bytes::from_static(&[0, 7, 1]));
        r.read_u16().unwrap();
        assert_eq!(r.finish().unwrap_err().kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_read_rest_takes_everything() {
        let mut r = BodyReader::new(Bytes::from_static(b"payload"));
        assert_eq!(&r.read_rest()[..], b"payload");
        assert!(r.finish().is_ok());
    }

    #[test]
    fn test_write_lp_bytes() {
        let mut buf = BytesMut::new();
        assert_eq!(write_lp_bytes(&mut buf, b"MQTT").unwrap(), 6);
        assert_eq!(&buf[..], &[0, 4, b'M', b'Q', b'T', b'T']);

        let mut buf = BytesMut::new();
        assert_eq!(write_lp_bytes(&mut buf, b"").unwrap(), 2);
        assert_eq!(&buf[..], &[0, 0]);
    }

    #[test]
    fn test_write_lp_bytes_too_long() {
        let big = vec![0u8; MAX_STRING_LEN + 1];
        let mut buf = BytesMut::new();
        assert!(write_lp_bytes(&mut buf, &big).is_err());
        assert!(buf.is_empty());
    }
}
