//! Storage policy
//!
//! Limits and visibility rules shared by every storage operation.

use crate::storage::validation::HiddenFilter;

/// Default upload ceiling (1 GiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1024 * 1024 * 1024;
pub const DEFAULT_MAX_FILENAME_LENGTH: usize = 255;
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Immutable per-process storage rules
#[derive(Debug, Clone)]
pub struct StoragePolicy {
    pub hidden: HiddenFilter,
    pub max_upload_bytes: u64,
    pub max_filename_length: usize,
    pub buffer_size: usize,
}

impl Default for StoragePolicy {
    fn default() -> Self {
        Self {
            hidden: HiddenFilter::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_filename_length: DEFAULT_MAX_FILENAME_LENGTH,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}
