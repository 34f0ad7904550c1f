//! Directory listing
//!
//! Enumerates the immediate children of a resolved directory, hiding
//! dot-entries and anything that is neither a directory nor a regular file.

use log::info;
use std::fs;

use crate::error::ListError;
use crate::storage::resolver::ResolvedPath;
use crate::storage::results::{DirEntry, EntryKind, Listing};
use crate::storage::validation::HiddenFilter;

/// Lists the visible contents of a directory.
///
/// Symbolic links are classified by what they point to; dangling links,
/// devices, sockets and names that are not valid UTF-8 are skipped.
pub fn list_directory(dir: &ResolvedPath, hidden: &HiddenFilter) -> Result<Listing, ListError> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in fs::read_dir(dir.real_path())?.flatten() {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if hidden.is_hidden(&name) {
            continue;
        }

        match classify(&entry) {
            Some(EntryKind::Directory) => dirs.push(name),
            Some(EntryKind::File) => files.push(name),
            None => {}
        }
    }

    dirs.sort();
    files.sort();

    info!(
        "Listed directory /{} - {} dirs, {} files",
        dir.display_path(),
        dirs.len(),
        files.len()
    );

    Ok(Listing { dirs, files })
}

fn classify(entry: &fs::DirEntry) -> Option<EntryKind> {
    let metadata = fs::metadata(entry.path()).ok()?;
    if metadata.is_dir() {
        Some(EntryKind::Directory)
    } else if metadata.is_file() {
        Some(EntryKind::File)
    } else {
        None
    }
}

impl Listing {
    /// Entries in display order: directories first, then files
    pub fn entries(&self) -> impl Iterator<Item = DirEntry> + '_ {
        let dirs = self.dirs.iter().map(|name| DirEntry {
            name: name.clone(),
            kind: EntryKind::Directory,
        });
        let files = self.files.iter().map(|name| DirEntry {
            name: name.clone(),
            kind: EntryKind::File,
        });
        dirs.chain(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::resolver::resolve;
    use crate::storage::root::RootHandle;
    use tempfile::TempDir;

    #[test]
    fn test_hidden_entries_are_excluded() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".secret"), b"s").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();

        let root = RootHandle::configure(dir.path()).unwrap();
        let listing = list_directory(&resolve(&root, "").unwrap(), &HiddenFilter::default()).unwrap();

        assert_eq!(listing.dirs, vec!["sub".to_string()]);
        assert_eq!(listing.files, vec!["a.txt".to_string()]);
    }

    #[test]
    fn test_entries_are_sorted_and_not_recursive() {
        let dir = TempDir::new().unwrap();
        for name in ["c.txt", "a.txt", "b.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir_all(dir.path().join("zeta/inner")).unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();

        let root = RootHandle::configure(dir.path()).unwrap();
        let listing = list_directory(&resolve(&root, "").unwrap(), &HiddenFilter::default()).unwrap();

        assert_eq!(listing.dirs, vec!["alpha", "zeta"]);
        assert_eq!(listing.files, vec!["a.txt", "b.txt", "c.txt"]);

        let kinds: Vec<_> = listing.entries().map(|e| e.kind).collect();
        assert_eq!(kinds[..2], [EntryKind::Directory, EntryKind::Directory]);
        assert_eq!(kinds[2..], [EntryKind::File, EntryKind::File, EntryKind::File]);
    }

    #[test]
    fn test_removed_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("gone")).unwrap();
        let root = RootHandle::configure(dir.path()).unwrap();
        let resolved = resolve(&root, "gone").unwrap();
        fs::remove_dir(dir.path().join("gone")).unwrap();

        assert!(matches!(
            list_directory(&resolved, &HiddenFilter::default()),
            Err(ListError::IoError(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_links_and_sockets_are_skipped() {
        use std::os::unix::fs::symlink;
        use std::os::unix::net::UnixListener;

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("real.txt"), b"r").unwrap();
        symlink(dir.path().join("missing"), dir.path().join("dangling")).unwrap();
        let _listener = UnixListener::bind(dir.path().join("sock")).unwrap();

        let root = RootHandle::configure(dir.path()).unwrap();
        let listing = list_directory(&resolve(&root, "").unwrap(), &HiddenFilter::default()).unwrap();

        assert!(listing.dirs.is_empty());
        assert_eq!(listing.files, vec!["real.txt"]);
    }
}
