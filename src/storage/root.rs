//! Served root directory
//!
//! The root is canonicalized once at startup and never changes afterwards.

use log::info;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ConfigError;

/// Handle to the canonicalized root every request is confined to.
#[derive(Debug, Clone)]
pub struct RootHandle {
    canonical: Arc<PathBuf>,
}

impl RootHandle {
    /// Validates and canonicalizes `root_dir`.
    ///
    /// Fails if the path is empty, does not exist, or is not a directory.
    pub fn configure(root_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let root_dir = root_dir.as_ref();
        if root_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("server_root cannot be empty".into()));
        }

        let canonical = fs::canonicalize(root_dir).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::RootNotFound(root_dir.to_path_buf()),
            _ => ConfigError::RootUnreadable(root_dir.to_path_buf(), e),
        })?;

        if !canonical.is_dir() {
            return Err(ConfigError::RootNotADirectory(root_dir.to_path_buf()));
        }

        info!("Server root directory: {}", canonical.display());

        Ok(Self {
            canonical: Arc::new(canonical),
        })
    }

    /// Absolute canonical path of the root
    pub fn path(&self) -> &Path {
        &self.canonical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_configure_canonicalizes() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a");
        fs::create_dir(&nested).unwrap();

        let root = RootHandle::configure(nested.join("..").join("a")).unwrap();
        assert_eq!(root.path(), fs::canonicalize(&nested).unwrap());
    }

    #[test]
    fn test_configure_rejects_missing_and_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, b"x").unwrap();

        assert!(matches!(
            RootHandle::configure(dir.path().join("missing")),
            Err(ConfigError::RootNotFound(_))
        ));
        assert!(matches!(
            RootHandle::configure(&file),
            Err(ConfigError::RootNotADirectory(_))
        ));
        assert!(matches!(RootHandle::configure(""), Err(ConfigError::Invalid(_))));
    }
}
