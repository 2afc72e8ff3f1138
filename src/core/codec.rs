//! Framed-stream codec.
//!
//! [`MqttCodec`] plugs the packet layer into `tokio_util::codec::Framed`. The
//! decoder waits until a whole frame is buffered, then splits it off the read
//! buffer without copying and dispatches it.

use crate::config::{CodecConfig, MAX_PACKET_SIZE};
use crate::core::header::FixedHeader;
use crate::error::{CodecError, Result};
use crate::protocol::dispatcher;
use crate::protocol::packet::Packet;
use crate::utils::metrics::CodecMetrics;
use bytes::BytesMut;
use std::sync::Arc;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct MqttCodec {
    max_packet_size: usize,
    metrics: Option<Arc<CodecMetrics>>,
}

impl Default for MqttCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MqttCodec {
    pub fn new() -> Self {
        Self {
            max_packet_size: MAX_PACKET_SIZE,
            metrics: None,
        }
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self {
            max_packet_size: config.max_packet_size,
            metrics: None,
        }
    }

    /// Feed decode/encode counters into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<CodecMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    fn observe<T>(&self, result: Result<T>, on_ok: impl FnOnce(&CodecMetrics, &T)) -> Result<T> {
        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(value) => on_ok(metrics, value),
                Err(e) => metrics.record_error(e),
            }
        }
        result
    }

    fn decode_frame(&self, src: &mut BytesMut) -> Result<Option<(usize, Packet)>> {
        let Some((header, header_len)) = FixedHeader::parse(src)? else {
            return Ok(None);
        };

        let frame_len = header_len + header.remaining_length;
        if frame_len > self.max_packet_size {
            return Err(CodecError::OversizedPacket {
                size: frame_len,
                limit: self.max_packet_size,
            });
        }

        if src.len() < frame_len {
            return Ok(None);
        }

        trace!(packet_type = %header.packet_type, frame_len, "Frame complete");
        let mut frame = src.split_to(frame_len);
        let body = frame.split_off(header_len).freeze();
        let packet = dispatcher::dispatch(&header, body)?;
        Ok(Some((frame_len, packet)))
    }

    fn encode_packet(&self, item: &Packet, dst: &mut BytesMut) -> Result<usize> {
        let start = dst.len();
        let written = item.encode_to(dst)?;
        if written > self.max_packet_size {
            dst.truncate(start);
            return Err(CodecError::OversizedPacket {
                size: written,
                limit: self.max_packet_size,
            });
        }
        Ok(written)
    }
}

impl Decoder for MqttCodec {
    type Item = Packet;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        let result = self.decode_frame(src);
        let result = self.observe(result, |m, decoded| {
            if let Some((len, _)) = decoded {
                m.record_decoded(*len);
            }
        });
        Ok(result?.map(|(_, packet)| packet))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Packet>> {
        match self.decode(buf)? {
            Some(packet) => Ok(Some(packet)),
            None if buf.is_empty() => Ok(None),
            None => {
                let needed = match FixedHeader::parse(buf)? {
                    Some((header, header_len)) => header_len + header.remaining_length - buf.len(),
                    None => 1,
                };
                let err = CodecError::UnexpectedEof { needed };
                if let Some(metrics) = &self.metrics {
                    metrics.record_error(&err);
                }
                Err(err)
            }
        }
    }
}

impl Encoder<&Packet> for MqttCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &Packet, dst: &mut BytesMut) -> Result<()> {
        let result = self.encode_packet(item, dst);
        self.observe(result, |m, n| m.record_encoded(*n))?;
        Ok(())
    }
}

impl Encoder<Packet> for MqttCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        Encoder::<&Packet>::encode(self, &item, dst)
    }
}
