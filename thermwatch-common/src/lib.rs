//! thermwatch common library
//!
//! Shared utilities for the thermwatch temperature monitor:
//!
//! - [`config`] - Diagnostic logging configuration
//! - [`error`] - Error types

pub mod config;
pub mod error;

// Re-export commonly used types at the crate root
pub use config::{LogFormat, LoggingConfig};
pub use error::{Error, Result};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.level`. Events are written to stderr in the
/// configured [`LogFormat`]; stdout carries only the temperature readout.
///
/// Fails if a global subscriber is already set.
///
/// ```ignore
/// let logging = LoggingConfig::default().with_level(Some("debug".into()));
/// thermwatch_common::init_tracing(&logging)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let output = match config.format {
        LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .map_err(|e| Error::config(format!("Failed to initialize tracing: {e}")))
}
