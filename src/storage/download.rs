//! Download gate
//!
//! Serves only regular files whose path contains no hidden segment.

use log::{debug, info};
use tokio::fs::{self, File};

use crate::error::DownloadError;
use crate::storage::resolver::ResolvedPath;
use crate::storage::results::DownloadFile;
use crate::storage::validation::HiddenFilter;

/// Opens a resolved file for attachment-style transfer.
pub async fn open_download(
    target: &ResolvedPath,
    hidden: &HiddenFilter,
) -> Result<DownloadFile, DownloadError> {
    if target.touches_hidden(hidden) {
        debug!("Refusing hidden path /{}", target.display_path());
        return Err(DownloadError::NotFound);
    }

    let metadata = match fs::metadata(target.real_path()).await {
        Ok(metadata) => metadata,
        Err(_) => return Err(DownloadError::NotFound),
    };

    if !metadata.is_file() {
        return Err(DownloadError::NotFound);
    }

    let name = target
        .real_path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or(DownloadError::NotFound)?;

    let file = File::open(target.real_path()).await?;

    info!(
        "Prepared download of /{} ({} bytes)",
        target.display_path(),
        metadata.len()
    );

    Ok(DownloadFile {
        file,
        name,
        len: metadata.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::resolver::resolve;
    use crate::storage::root::RootHandle;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    fn setup() -> (TempDir, RootHandle) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::create_dir_all(dir.path().join(".config")).unwrap();
        std::fs::write(dir.path().join("sub/data.bin"), [1u8, 2, 3]).unwrap();
        std::fs::write(dir.path().join(".env"), b"TOKEN=1").unwrap();
        std::fs::write(dir.path().join(".config/app.toml"), b"x").unwrap();
        let root = RootHandle::configure(dir.path()).unwrap();
        (dir, root)
    }

    #[tokio::test]
    async fn test_open_regular_file() {
        let (_dir, root) = setup();
        let target = resolve(&root, "sub/data.bin").unwrap();

        let mut download = open_download(&target, &HiddenFilter::default()).await.unwrap();
        assert_eq!(download.name, "data.bin");
        assert_eq!(download.len, 3);

        let mut content = Vec::new();
        download.file.read_to_end(&mut content).await.unwrap();
        assert_eq!(content, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_directories_and_missing_files_are_not_found() {
        let (_dir, root) = setup();
        let hidden = HiddenFilter::default();

        for path in ["", "sub", "sub/missing.bin"] {
            let target = resolve(&root, path).unwrap();
            assert!(matches!(
                open_download(&target, &hidden).await,
                Err(DownloadError::NotFound)
            ));
        }
    }

    #[tokio::test]
    async fn test_hidden_paths_are_not_found() {
        let (_dir, root) = setup();
        let hidden = HiddenFilter::default();

        for path in [".env", ".config/app.toml"] {
            let target = resolve(&root, path).unwrap();
            assert!(matches!(
                open_download(&target, &hidden).await,
                Err(DownloadError::NotFound)
            ));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_visible_link_to_hidden_file_is_not_found() {
        use std::os::unix::fs::symlink;

        let (dir, root) = setup();
        symlink(dir.path().join(".env"), dir.path().join("env.txt")).unwrap();
        let target = resolve(&root, "env.txt").unwrap();

        assert!(matches!(
            open_download(&target, &HiddenFilter::default()).await,
            Err(DownloadError::NotFound)
        ));
    }
}
