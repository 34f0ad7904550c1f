//! File system storage management
//!
//! Path containment, directory listing and the upload/download gates.

pub mod download;
pub mod listing;
pub mod operations;
pub mod policy;
pub mod resolver;
pub mod results;
pub mod root;
pub mod upload;
pub mod validation;

// Re-export commonly used types and functions
pub use operations::{NotFound, browse, download, upload};
pub use policy::StoragePolicy;
pub use resolver::{ResolvedPath, resolve};
pub use results::{
    BrowseResult, DirEntry, DownloadFile, DownloadOutcome, EntryKind, Listing, StoredFile,
    UploadOutcome,
};
pub use root::RootHandle;
pub use validation::{HiddenFilter, sanitize_filename};
