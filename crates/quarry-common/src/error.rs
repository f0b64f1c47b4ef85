//! Error types for the Quarry index.

use std::path::PathBuf;
use thiserror::Error;

use crate::page::PageId;

/// Result type alias using QuarryError.
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Errors that can occur in Quarry index operations.
#[derive(Debug, Error)]
pub enum QuarryError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open index file {}: {source}", .path.display())]
    IoOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read page {page_id} at offset {offset}: {source}")]
    IoRead {
        page_id: PageId,
        offset: u64,
        source: std::io::Error,
    },

    #[error("failed to write page {page_id} at offset {offset}: {source}")]
    IoWrite {
        page_id: PageId,
        offset: u64,
        source: std::io::Error,
    },

    #[error("read past end of file: page {page_id} at offset {offset}, file size {file_size}")]
    ReadPastEnd {
        page_id: PageId,
        offset: u64,
        file_size: u64,
    },

    // B+ tree errors
    #[error("duplicate key: {key}")]
    DuplicateKey { key: i64 },

    #[error("degree {degree} is below the minimum of {min}")]
    DegreeTooSmall { degree: usize, min: usize },

    #[error("degree {degree} exceeds the page-capacity maximum of {max}")]
    DegreeTooLarge { degree: usize, max: usize },

    #[error("degree mismatch: index file was created with degree {stored}, requested {requested}")]
    DegreeMismatch { stored: usize, requested: usize },

    #[error("index file corrupted: {0}")]
    Corrupted(String),
}
