//! Configuration Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A config source exists but could not be read or parsed
    #[display("invalid configuration: {_0}")]
    Invalid(figment::Error),
}

impl ErrorKind {
    /// Configuration problems always need operator intervention.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
