//! Storage layer error types.

use crate::storage::page::PageId;
use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("invalid page id: {0}")]
    InvalidPageId(PageId),

    #[error("invalid slot {slot}: page holds {slots} slots")]
    InvalidSlot { slot: u16, slots: u16 },

    #[error("page cannot hold record: requires {required} bytes but only {available} available")]
    OutOfSpace { required: usize, available: usize },

    #[error("illegal pin state: {0}")]
    IllegalPinState(String),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
