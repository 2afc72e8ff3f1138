//! # Utility Modules
//!
//! Supporting utilities around the codec.
//!
//! ## Components
//! - **Logging**: tracing subscriber setup from [`LoggingConfig`](crate::config::LoggingConfig)
//! - **Metrics**: thread-safe counters for decoded/encoded packets and failures

pub mod logging;
pub mod metrics;

pub use metrics::{CodecMetrics, MetricsSnapshot};
