use thiserror::Error;

/// Common error type for thermwatch components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using thermwatch's Error.
pub type Result<T> = std::result::Result<T, Error>;
