//! Error types for Sonance

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SonanceError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Index {index} out of bounds (len {len})")]
    OutOfBounds { index: usize, len: usize },

    #[error("Channel mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SonanceError {
    /// Shorthand for [`SonanceError::InvalidParam`]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParam(msg.into())
    }
}

/// Result type alias
pub type SonanceResult<T> = Result<T, SonanceError>;
