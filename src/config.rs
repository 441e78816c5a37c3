//! Engine knobs and their defaults.

use crate::access::codec::DEFAULT_PAD_CHAR;
use std::path::PathBuf;

/// How many backing files the page store spreads pages over.
pub const DEFAULT_FILE_COUNT: u32 = 4;

/// How many frames the buffer pool may hold resident at once.
pub const DEFAULT_FRAME_COUNT: usize = 8;

/// Everything a [`Database`](crate::database::Database) needs to come up:
/// where the data lives, how wide the page store fans out, how much the
/// buffer pool caches, and which character pads fixed-width text.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub base_dir: PathBuf,
    pub file_count: u32,
    pub frame_count: usize,
    pub pad_char: char,
}

impl StorageConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_file_count(mut self, file_count: u32) -> Self {
        self.file_count = file_count;
        self
    }

    pub fn with_frame_count(mut self, frame_count: usize) -> Self {
        self.frame_count = frame_count;
        self
    }

    pub fn with_pad_char(mut self, pad_char: char) -> Self {
        self.pad_char = pad_char;
        self
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("data"),
            file_count: DEFAULT_FILE_COUNT,
            frame_count: DEFAULT_FRAME_COUNT,
            pad_char: DEFAULT_PAD_CHAR,
        }
    }
}
