//! Merge Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A merge error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for merge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The request named no sources at all; a usage error, not a server one
    #[display("merge request contained no sources")]
    NoSources,
    /// A source archive could not be fetched
    #[display("source unreachable: {_0}")]
    Upstream(#[error(not(source))] String),
    /// A source was fetched but is not a readable zip archive
    #[display("unreadable archive: {_0}")]
    InvalidArchive(#[error(not(source))] String),
    /// An item model needed for override merging is not valid JSON
    #[display("unparseable item model: {_0}")]
    InvalidModel(#[error(not(source))] String),
    /// Workspace or packaging I/O failure
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Disk cache failure around the merged result
    #[display("cache error")]
    Cache,
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::Io(_) | Self::Cache)
    }
}
