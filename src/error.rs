//! Error types for chunked CSV loading

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a CSV source
///
/// Only resource-level failures are errors. Malformed row content is absorbed
/// by the line parser and never surfaces here.
#[derive(Error, Debug)]
pub enum CsvError {
    /// The source could not be opened
    #[error("Failed to load file {}: {source}", .path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A chunk read failed after the source was opened
    #[error("Failed to read chunk at byte {position}: {source}")]
    SourceUnreadable {
        position: u64,
        #[source]
        source: std::io::Error,
    },

    /// A complete line was not valid UTF-8
    #[error("Invalid UTF-8 in line {line} (byte {position})")]
    Decode { line: u64, position: u64 },

    /// A page worker stopped without publishing its page
    #[error("Page worker stopped unexpectedly")]
    WorkerLost,

    /// No load session is active
    #[error("No file loaded")]
    NoSession,
}

/// Result type alias for loading operations
pub type Result<T> = std::result::Result<T, CsvError>;

impl CsvError {
    /// Whether the session can continue after this error
    ///
    /// A failed read leaves the stream where it was, so paging may be retried.
    /// A decode error halts the session.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CsvError::SourceUnreadable { .. })
    }
}
