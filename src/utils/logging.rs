//! Structured logging setup.
//!
//! The codec itself only emits `tracing` events; applications that have no
//! subscriber of their own can install a console one from [`LoggingConfig`].

use crate::config::LoggingConfig;
use crate::error::{CodecError, Result};
use tracing::info;

/// Install a global fmt subscriber configured from `config`.
///
/// Does nothing when console logging is disabled. Fails with
/// [`CodecError::ConfigError`] if a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(CodecError::ConfigError(errors.join("; ")));
    }

    if !config.log_to_console {
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(config.show_target)
        .compact()
        .try_init()
        .map_err(|e| CodecError::ConfigError(format!("Failed to install subscriber: {e}")))?;

    info!(app = %config.app_name, level = %config.log_level, "Logging initialized");
    Ok(())
}
