//! Storage operations
//!
//! Entry points used by the HTTP layer. Every operation resolves the raw
//! request path first and hands only the resolved path to the listing,
//! upload and download gates. Outside-root and missing targets produce the
//! same `NotFound` outcome.

use log::{error, warn};
use tokio::io::AsyncRead;
use tokio::task;

use crate::error::{DownloadError, ListError, ResolveError};
use crate::storage::download::open_download;
use crate::storage::listing::list_directory;
use crate::storage::policy::StoragePolicy;
use crate::storage::resolver::{ResolvedPath, resolve};
use crate::storage::results::{BrowseResult, DownloadOutcome, Listing, UploadOutcome};
use crate::storage::root::RootHandle;
use crate::storage::upload::store_upload;
use crate::storage::validation::HiddenFilter;

/// Marker for a target that cannot be shown to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotFound;

const LIST_ADVISORY: &str = "Could not list directory.";

/// Lists a directory under the root.
///
/// Enumeration failures degrade to an empty listing with an advisory.
pub async fn browse(
    root: &RootHandle,
    policy: &StoragePolicy,
    relative_path: &str,
) -> Result<BrowseResult, NotFound> {
    browse_with(root, policy, relative_path, list_directory).await
}

async fn browse_with<L>(
    root: &RootHandle,
    policy: &StoragePolicy,
    relative_path: &str,
    lister: L,
) -> Result<BrowseResult, NotFound>
where
    L: FnOnce(&ResolvedPath, &HiddenFilter) -> Result<Listing, ListError> + Send + 'static,
{
    let root = root.clone();
    let hidden = policy.hidden.clone();
    let relative_path = relative_path.to_string();

    let joined = task::spawn_blocking(move || -> Result<_, NotFound> {
        let dir = resolve_directory(&root, &hidden, &relative_path)?;
        let listing = lister(&dir, &hidden);
        Ok((dir, listing))
    })
    .await;

    let (dir, listing) = match joined {
        Ok(result) => result?,
        Err(e) => {
            error!("Browse task failed: {}", e);
            return Err(NotFound);
        }
    };

    let (listing, advisory) = match listing {
        Ok(listing) => (listing, None),
        Err(e) => {
            error!("Could not list directory {}: {}", dir.real_path().display(), e);
            (Listing::default(), Some(LIST_ADVISORY.to_string()))
        }
    };

    Ok(BrowseResult {
        path: dir.display_path().to_string(),
        dirs: listing.dirs,
        files: listing.files,
        parent: dir.parent_display_path(),
        advisory,
    })
}

/// Stores `content` as a new file in the directory at `relative_path`.
pub async fn upload<R>(
    root: &RootHandle,
    policy: &StoragePolicy,
    relative_path: &str,
    filename: &str,
    content: R,
) -> UploadOutcome
where
    R: AsyncRead + Unpin,
{
    let dir = {
        let root = root.clone();
        let hidden = policy.hidden.clone();
        let relative_path = relative_path.to_string();
        task::spawn_blocking(move || resolve_directory(&root, &hidden, &relative_path)).await
    };

    let dir = match dir {
        Ok(Ok(dir)) => dir,
        Ok(Err(NotFound)) => return UploadOutcome::NotFound,
        Err(e) => {
            error!("Upload target task failed: {}", e);
            return UploadOutcome::NotFound;
        }
    };

    match store_upload(&dir, filename, content, policy).await {
        Ok(stored) => UploadOutcome::Stored(stored),
        Err(e) => UploadOutcome::Rejected(e),
    }
}

/// Opens the file at `relative_path` for download.
pub async fn download(
    root: &RootHandle,
    policy: &StoragePolicy,
    relative_path: &str,
) -> DownloadOutcome {
    let target = {
        let root = root.clone();
        let relative_path = relative_path.to_string();
        task::spawn_blocking(move || resolve_logged(&root, &relative_path)).await
    };

    let target = match target {
        Ok(Ok(target)) => target,
        Ok(Err(NotFound)) => return DownloadOutcome::NotFound,
        Err(e) => {
            error!("Download task failed: {}", e);
            return DownloadOutcome::NotFound;
        }
    };

    match open_download(&target, &policy.hidden).await {
        Ok(file) => DownloadOutcome::Ready(file),
        Err(DownloadError::NotFound) => DownloadOutcome::NotFound,
        Err(DownloadError::IoError(e)) => {
            error!("Failed to open {}: {}", target.real_path().display(), e);
            DownloadOutcome::Failed
        }
    }
}

/// Resolves a path that must be an existing, visible directory.
fn resolve_directory(
    root: &RootHandle,
    hidden: &HiddenFilter,
    relative_path: &str,
) -> Result<ResolvedPath, NotFound> {
    let dir = resolve_logged(root, relative_path)?;
    if !dir.real_path().is_dir() || dir.touches_hidden(hidden) {
        return Err(NotFound);
    }
    Ok(dir)
}

fn resolve_logged(root: &RootHandle, relative_path: &str) -> Result<ResolvedPath, NotFound> {
    resolve(root, relative_path).map_err(|e| {
        match &e {
            ResolveError::Escape(_) | ResolveError::DanglingLink(_) => {
                warn!("Blocked path outside root: {:?}", relative_path)
            }
            _ => warn!("Could not resolve {:?}: {}", relative_path, e),
        }
        NotFound
    })
}
