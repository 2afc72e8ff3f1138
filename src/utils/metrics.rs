//! Codec Metrics
//!
//! Counters for packets and bytes moving through the codec, plus failures
//! broken down by [`ErrorKind`].
//!
//! Uses atomic counters so one collector can be shared between connections.

use crate::error::{CodecError, ErrorKind};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Metrics collector for codec operations
#[derive(Debug)]
pub struct CodecMetrics {
    /// Packets successfully decoded
    pub packets_decoded: AtomicU64,
    /// Bytes consumed by successful decodes
    pub bytes_decoded: AtomicU64,
    /// Packets successfully encoded
    pub packets_encoded: AtomicU64,
    /// Bytes produced by successful encodes
    pub bytes_encoded: AtomicU64,
    pub malformed: AtomicU64,
    pub protocol_violations: AtomicU64,
    pub identifier_rejected: AtomicU64,
    pub unsupported_version: AtomicU64,
    pub io_errors: AtomicU64,
    start_time: Instant,
}

impl CodecMetrics {
    pub fn new() -> Self {
        Self {
            packets_decoded: AtomicU64::new(0),
            bytes_decoded: AtomicU64::new(0),
            packets_encoded: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            protocol_violations: AtomicU64::new(0),
            identifier_rejected: AtomicU64::new(0),
            unsupported_version: AtomicU64::new(0),
            io_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a decoded packet of `byte_count` wire bytes
    pub fn record_decoded(&self, byte_count: usize) {
        self.packets_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_decoded
            .fetch_add(byte_count as u64, Ordering::Relaxed);
    }

    /// Record an encoded packet of `byte_count` wire bytes
    pub fn record_encoded(&self, byte_count: usize) {
        self.packets_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded
            .fetch_add(byte_count as u64, Ordering::Relaxed);
    }

    /// Record a failure under its kind
    pub fn record_error(&self, error: &CodecError) {
        let counter = match error.kind() {
            ErrorKind::Malformed => &self.malformed,
            ErrorKind::ProtocolViolation => &self.protocol_violations,
            ErrorKind::IdentifierRejected => &self.identifier_rejected,
            ErrorKind::UnsupportedVersion => &self.unsupported_version,
            ErrorKind::Io => &self.io_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_decoded: self.packets_decoded.load(Ordering::Relaxed),
            bytes_decoded: self.bytes_decoded.load(Ordering::Relaxed),
            packets_encoded: self.packets_encoded.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            protocol_violations: self.protocol_violations.load(Ordering::Relaxed),
            identifier_rejected: self.identifier_rejected.load(Ordering::Relaxed),
            unsupported_version: self.unsupported_version.load(Ordering::Relaxed),
            io_errors: self.io_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_summary(&self) {
        let s = self.snapshot();
        info!(
            packets_decoded = s.packets_decoded,
            bytes_decoded = s.bytes_decoded,
            packets_encoded = s.packets_encoded,
            bytes_encoded = s.bytes_encoded,
            errors = s.total_errors(),
            malformed = s.malformed,
            protocol_violations = s.protocol_violations,
            uptime_seconds = s.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub packets_decoded: u64,
    pub bytes_decoded: u64,
    pub packets_encoded: u64,
    pub bytes_encoded: u64,
    pub malformed: u64,
    pub protocol_violations: u64,
    pub identifier_rejected: u64,
    pub unsupported_version: u64,
    pub io_errors: u64,
    pub uptime_seconds: u64,
}

impl MetricsSnapshot {
    pub fn total_errors(&self) -> u64 {
        self.malformed
            + self.protocol_violations
            + self.identifier_rejected
            + self.unsupported_version
            + self.io_errors
    }
}
