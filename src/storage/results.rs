//! Storage result types
//!
//! Defines result structures returned by storage operations.

use tokio::fs::File;

use crate::error::UploadError;

/// Kind tag of a listed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// A single visible child of a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Visible children of a directory, each list sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

/// Result of a browse operation
#[derive(Debug, Clone)]
pub struct BrowseResult {
    /// Normalized requested path, `""` for the root
    pub path: String,
    pub dirs: Vec<String>,
    pub files: Vec<String>,
    /// Path of the parent directory, `None` at the root
    pub parent: Option<String>,
    /// Shown to the user when the listing could not be produced
    pub advisory: Option<String>,
}

/// A file written by an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub bytes: u64,
}

/// Result of an upload operation
#[derive(Debug)]
pub enum UploadOutcome {
    Stored(StoredFile),
    Rejected(UploadError),
    /// Target directory does not exist or is outside the root
    NotFound,
}

/// An accepted download, ready to be streamed
#[derive(Debug)]
pub struct DownloadFile {
    pub file: File,
    pub name: String,
    pub len: u64,
}

/// Result of a download operation
#[derive(Debug)]
pub enum DownloadOutcome {
    Ready(DownloadFile),
    NotFound,
    /// The file exists but could not be opened
    Failed,
}
