//! Error types for fast start operations
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Error types for fast start operations
#[derive(Debug, Error)]
pub enum FastStartError {
    /// A box claims a size inconsistent with the remaining data
    #[error("Malformed file: {0}")]
    MalformedFile(String),

    /// A recognized structure this crate does not handle (e.g. compressed moov)
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FastStartError {
    /// Create a malformed file error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedFile(msg.into())
    }

    /// Create an unsupported file error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedFile(msg.into())
    }
}

/// Result type alias for fast start operations
pub type FastStartResult<T> = Result<T, FastStartError>;
