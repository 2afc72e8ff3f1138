//! Frame reading over caller-supplied byte sources.
//!
//! A source may hand back fewer bytes than asked for. The readers keep
//! accumulating until the frame announced by the Fixed Header is complete and
//! only fail once the source reports end-of-stream first. Interrupted reads
//! are retried.
//!
//! Every reader reports how many bytes it took from the source, on success
//! and inside [`DecodeError`] on failure.

use crate::core::header::FixedHeader;
use crate::core::varint::VarintDecoder;
use crate::error::{CodecError, DecodeError, DecodeResult, Result};
use crate::protocol::dispatcher;
use crate::protocol::packet::Packet;
use bytes::Bytes;
use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tracing::trace;

/// Byte source wrapper that tallies every byte handed out.
struct Counted<R> {
    inner: R,
    count: usize,
}

impl<R> Counted<R> {
    fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }

    fn fail(&self, error: CodecError) -> DecodeError {
        DecodeError::new(self.count, error)
    }
}

impl<R: Read> Read for Counted<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n;
        Ok(n)
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for Counted<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = poll {
            self.count += buf.filled().len() - before;
        }
        poll
    }
}

/// Fill `buf` completely from `src`.
fn read_full<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(CodecError::UnexpectedEof {
                    needed: buf.len() - filled,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn read_full_async<R: AsyncRead + Unpin>(src: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]).await {
            Ok(0) => {
                return Err(CodecError::UnexpectedEof {
                    needed: buf.len() - filled,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn check_frame_size(header_len: usize, remaining_length: usize, limit: usize) -> Result<()> {
    let size = header_len + remaining_length;
    if size > limit {
        return Err(CodecError::OversizedPacket { size, limit });
    }
    Ok(())
}

fn body_complete(body: Vec<u8>, expected: usize) -> Result<Bytes> {
    if body.len() < expected {
        return Err(CodecError::UnexpectedEof {
            needed: expected - body.len(),
        });
    }
    Ok(Bytes::from(body))
}

fn frame_from<R: Read>(src: &mut R, max_packet_size: usize) -> Result<(FixedHeader, Bytes)> {
    let mut byte = [0u8; 1];
    read_full(src, &mut byte)?;
    let (packet_type, flags) = FixedHeader::parse_first_byte(byte[0])?;

    let mut varint = VarintDecoder::new();
    let remaining_length = loop {
        read_full(src, &mut byte)?;
        if let Some(value) = varint.push(byte[0])? {
            break value;
        }
    };
    check_frame_size(1 + varint.len(), remaining_length, max_packet_size)?;

    let header = FixedHeader::new(packet_type, flags, remaining_length);
    trace!(%packet_type, remaining_length, "Read fixed header");

    // Grows with the data actually received rather than the announced length
    let mut body = Vec::new();
    loop {
        let wanted = (remaining_length - body.len()) as u64;
        match src.by_ref().take(wanted).read_to_end(&mut body) {
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok((header, body_complete(body, remaining_length)?))
}

async fn frame_from_async<R: AsyncRead + Unpin>(
    src: &mut R,
    max_packet_size: usize,
) -> Result<(FixedHeader, Bytes)> {
    let mut byte = [0u8; 1];
    read_full_async(src, &mut byte).await?;
    let (packet_type, flags) = FixedHeader::parse_first_byte(byte[0])?;

    let mut varint = VarintDecoder::new();
    let remaining_length = loop {
        read_full_async(src, &mut byte).await?;
        if let Some(value) = varint.push(byte[0])? {
            break value;
        }
    };
    check_frame_size(1 + varint.len(), remaining_length, max_packet_size)?;

    let header = FixedHeader::new(packet_type, flags, remaining_length);
    trace!(%packet_type, remaining_length, "Read fixed header");

    let mut body = Vec::new();
    loop {
        let wanted = (remaining_length - body.len()) as u64;
        match (&mut *src).take(wanted).read_to_end(&mut body).await {
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok((header, body_complete(body, remaining_length)?))
}

/// Read one frame: the Fixed Header and exactly Remaining-Length body bytes.
///
/// Returns the total bytes consumed, the header and the body. Frames larger
/// than `max_packet_size` fail before any body byte is read.
pub fn read_frame<R: Read>(
    src: &mut R,
    max_packet_size: usize,
) -> DecodeResult<(usize, FixedHeader, Bytes)> {
    let mut src = Counted::new(src);
    match frame_from(&mut src, max_packet_size) {
        Ok((header, body)) => Ok((src.count, header, body)),
        Err(e) => Err(src.fail(e)),
    }
}

/// Read one frame and dispatch it to its variant decoder.
///
/// A rejected body still counts the whole frame as consumed.
pub fn read_packet<R: Read>(
    src: &mut R,
    max_packet_size: usize,
) -> DecodeResult<(usize, Packet)> {
    let (consumed, header, body) = read_frame(src, max_packet_size)?;
    dispatcher::dispatch(&header, body)
        .map(|packet| (consumed, packet))
        .map_err(|e| DecodeError::new(consumed, e))
}

/// Async counterpart of [`read_frame`].
pub async fn read_frame_async<R: AsyncRead + Unpin>(
    src: &mut R,
    max_packet_size: usize,
) -> DecodeResult<(usize, FixedHeader, Bytes)> {
    let mut src = Counted::new(src);
    match frame_from_async(&mut src, max_packet_size).await {
        Ok((header, body)) => Ok((src.count, header, body)),
        Err(e) => Err(src.fail(e)),
    }
}

/// Async counterpart of [`read_packet`].
pub async fn read_packet_async<R: AsyncRead + Unpin>(
    src: &mut R,
    max_packet_size: usize,
) -> DecodeResult<(usize, Packet)> {
    let (consumed, header, body) = read_frame_async(src, max_packet_size).await?;
    dispatcher::dispatch(&header, body)
        .map(|packet| (consumed, packet))
        .map_err(|e| DecodeError::new(consumed, e))
}
