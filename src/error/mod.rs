//! Error handling module for SnipFix

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for SnipFix operations
#[derive(Error, Debug)]
pub enum SnipFixError {
    /// Input file not found or inaccessible
    #[error("Input file not found: {path}")]
    InputFileNotFound { path: String },

    /// Frame range validation error
    #[error("Invalid frame range: start ({start}) must be less than end ({end})")]
    InvalidFrameRange { start: u64, end: u64 },

    /// Media duration could not be determined
    #[error("Media duration unknown for {path}; pass --duration")]
    MissingDuration { path: String },

    /// Output file write error
    #[error("Failed to write output file: {message}")]
    OutputError { message: String },

    /// Session or pipeline error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SnipFixError {
    /// The domain error underneath, if any
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            SnipFixError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for SnipFix operations
pub type SnipFixResult<T> = std::result::Result<T, SnipFixError>;
