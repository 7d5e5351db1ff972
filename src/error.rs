//! Error types for segmentlog
//!
//! Provides a unified error type for all log operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias using LogError
pub type Result<T> = std::result::Result<T, LogError>;

/// Unified error type for segmentlog operations
#[derive(Debug, Error)]
pub enum LogError {
    // -------------------------------------------------------------------------
    // Addressing Errors
    // -------------------------------------------------------------------------
    /// No segment holds this offset (below the lowest, or not yet written)
    #[error("offset out of range: {offset}")]
    OffsetOutOfRange { offset: u64 },

    /// Read or write past the valid region of a store or index
    #[error("end of data")]
    EndOfData,

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Recovery Errors
    // -------------------------------------------------------------------------
    /// Index length is not a whole number of entries
    #[error("corrupt index {}: length {len} is not a multiple of the entry width", path.display())]
    CorruptIndex { path: PathBuf, len: u64 },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    /// Operation on a store, index or log that has already been closed
    #[error("closed")]
    Closed,
}

impl LogError {
    /// True for [`LogError::OffsetOutOfRange`]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, LogError::OffsetOutOfRange { .. })
    }

    /// True for [`LogError::EndOfData`]
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, LogError::EndOfData)
    }
}

/// Attaches the failing operation and file to an `io::Error`
pub(crate) trait IoContext<T> {
    fn context(self, op: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn context(self, op: &'static str, path: &Path) -> Result<T> {
        self.map_err(|source| LogError::Io {
            op,
            path: path.to_path_buf(),
            source,
        })
    }
}
