//! Error types
//!
//! Defines domain-specific error types for each stage of the upload server:
//! configuration, path resolution, listing, upload and download.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Startup configuration errors
#[derive(Debug)]
pub enum ConfigError {
    Load(config::ConfigError),
    Invalid(String),
    RootNotFound(PathBuf),
    RootNotADirectory(PathBuf),
    RootUnreadable(PathBuf, io::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Load(e) => write!(f, "Failed to load configuration: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::RootNotFound(p) => write!(f, "Directory not found: {}", p.display()),
            ConfigError::RootNotADirectory(p) => write!(f, "Not a directory: {}", p.display()),
            ConfigError::RootUnreadable(p, e) => {
                write!(f, "Cannot resolve root {}: {}", p.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(error: config::ConfigError) -> Self {
        ConfigError::Load(error)
    }
}

/// Path resolution errors
///
/// Every variant is reported to clients as "not found".
#[derive(Debug)]
pub enum ResolveError {
    Escape(String),
    DanglingLink(String),
    InvalidInput(String),
    IoError(io::Error),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Escape(p) => write!(f, "Escape attempt: {}", p),
            ResolveError::DanglingLink(p) => write!(f, "Dangling symbolic link: {}", p),
            ResolveError::InvalidInput(p) => write!(f, "Invalid path: {:?}", p),
            ResolveError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<io::Error> for ResolveError {
    fn from(error: io::Error) -> Self {
        ResolveError::IoError(error)
    }
}

/// Directory enumeration errors
#[derive(Debug)]
pub enum ListError {
    IoError(io::Error),
}

impl fmt::Display for ListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListError::IoError(e) => write!(f, "Could not list directory: {}", e),
        }
    }
}

impl std::error::Error for ListError {}

impl From<io::Error> for ListError {
    fn from(error: io::Error) -> Self {
        ListError::IoError(error)
    }
}

/// Upload rejection reasons
#[derive(Debug)]
pub enum UploadError {
    InvalidName,
    HiddenName(String),
    AlreadyExists(String),
    TooLarge(u64),
    IoError(io::Error),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::InvalidName => write!(f, "Invalid filename"),
            UploadError::HiddenName(n) => write!(f, "Hidden filename rejected: {}", n),
            UploadError::AlreadyExists(n) => write!(f, "File already exists: {}", n),
            UploadError::TooLarge(limit) => write!(f, "Upload exceeds {} bytes", limit),
            UploadError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for UploadError {}

impl From<io::Error> for UploadError {
    fn from(error: io::Error) -> Self {
        UploadError::IoError(error)
    }
}

/// Download rejection reasons
#[derive(Debug)]
pub enum DownloadError {
    NotFound,
    IoError(io::Error),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::NotFound => write!(f, "File not found"),
            DownloadError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for DownloadError {}

impl From<io::Error> for DownloadError {
    fn from(error: io::Error) -> Self {
        DownloadError::IoError(error)
    }
}

/// Server lifecycle errors
#[derive(Debug)]
pub enum ServerError {
    Config(ConfigError),
    Bind(String, io::Error),
    Serve(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::Bind(addr, e) => write!(f, "Failed to bind to {}: {}", addr, e),
            ServerError::Serve(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<ConfigError> for ServerError {
    fn from(error: ConfigError) -> Self {
        ServerError::Config(error)
    }
}
