//! Upload gate
//!
//! Decides whether an upload may be written into a resolved directory and
//! streams it to disk. The destination is created with `create_new`, so two
//! uploads racing for the same name cannot both succeed, and an existing file
//! is never overwritten.

use log::{info, warn};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::error::UploadError;
use crate::storage::policy::StoragePolicy;
use crate::storage::resolver::ResolvedPath;
use crate::storage::results::StoredFile;
use crate::storage::validation::sanitize_filename;

/// Removes the destination on drop unless disarmed.
///
/// Covers every early return as well as a request future being dropped
/// when the client disconnects mid-upload.
struct PartialUpload {
    path: PathBuf,
    armed: bool,
}

impl PartialUpload {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialUpload {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!("Removed partial upload {}", self.path.display()),
            Err(e) => warn!(
                "Failed to remove partial upload {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Writes `content` as a new file named after `raw_filename` inside `dir`.
///
/// Checks run in order: sanitized name must be non-empty, must not be hidden,
/// and must not already exist. The content is capped at
/// `policy.max_upload_bytes`.
pub async fn store_upload<R>(
    dir: &ResolvedPath,
    raw_filename: &str,
    mut content: R,
    policy: &StoragePolicy,
) -> Result<StoredFile, UploadError>
where
    R: AsyncRead + Unpin,
{
    let name = sanitize_filename(raw_filename, policy.max_filename_length)
        .ok_or(UploadError::InvalidName)?;

    if policy.hidden.is_hidden(&name) {
        return Err(UploadError::HiddenName(name));
    }

    let dest = dir.real_path().join(&name);

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&dest)
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => UploadError::AlreadyExists(name.clone()),
            _ => UploadError::IoError(e),
        })?;

    let partial = PartialUpload::new(dest);
    // Rebound after the guard so the handle is closed before the guard unlinks
    let mut file = file;
    let mut buffer = vec![0u8; policy.buffer_size.max(1)];
    let mut total_bytes_received = 0u64;

    loop {
        let n = content.read(&mut buffer).await?;
        if n == 0 {
            break;
        }

        total_bytes_received += n as u64;
        if total_bytes_received > policy.max_upload_bytes {
            warn!(
                "Upload {} exceeded the limit of {} bytes",
                name, policy.max_upload_bytes
            );
            return Err(UploadError::TooLarge(policy.max_upload_bytes));
        }

        file.write_all(&buffer[..n]).await?;
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    partial.disarm();

    info!(
        "Uploaded {} to /{} ({} bytes)",
        name,
        dir.display_path(),
        total_bytes_received
    );

    Ok(StoredFile {
        name,
        bytes: total_bytes_received,
    })
}
