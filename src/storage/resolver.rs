//! Path resolution
//!
//! Turns a client-supplied relative path into a canonical path that is
//! guaranteed to be the served root or a descendant of it. Symbolic links
//! are resolved before the containment check, so a link inside the root that
//! points elsewhere is rejected.

use log::debug;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::ResolveError;
use crate::storage::root::RootHandle;
use crate::storage::validation::HiddenFilter;

/// A path verified to lie inside the root on the real filesystem.
///
/// Only [`resolve`] constructs this type.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    real: PathBuf,
    relative: PathBuf,
    display: String,
    requested_segments: Vec<String>,
}

impl ResolvedPath {
    /// Canonical absolute path
    pub fn real_path(&self) -> &Path {
        &self.real
    }

    /// Canonical path relative to the root
    pub fn relative_path(&self) -> &Path {
        &self.relative
    }

    /// Canonical path relative to the root with `/` separators, `""` for the root
    pub fn display_path(&self) -> &str {
        &self.display
    }

    pub fn is_root(&self) -> bool {
        self.relative.as_os_str().is_empty()
    }

    /// Parent of the requested path for "up" navigation, `None` at the root
    pub fn parent_display_path(&self) -> Option<String> {
        if self.display.is_empty() {
            return None;
        }
        Some(match self.display.rsplit_once('/') {
            Some((parent, _)) => parent.to_string(),
            None => String::new(),
        })
    }

    /// True if any requested or canonical segment is a hidden entry
    pub fn touches_hidden(&self, hidden: &HiddenFilter) -> bool {
        self.requested_segments.iter().any(|s| hidden.is_hidden(s))
            || self
                .relative
                .components()
                .any(|c| hidden.is_hidden(&c.as_os_str().to_string_lossy()))
    }
}

/// Resolves `relative_path` against `root`.
///
/// `.` segments and leading `/` are ignored; `..` segments are resolved on the
/// real filesystem together with symbolic links. Trailing components that do
/// not exist yet are appended to the deepest existing ancestor.
pub fn resolve(root: &RootHandle, relative_path: &str) -> Result<ResolvedPath, ResolveError> {
    if relative_path.contains('\0') {
        return Err(ResolveError::InvalidInput(relative_path.to_string()));
    }

    let canonical_root = root.path();
    let components = relevant_components(relative_path);

    let mut joined = canonical_root.to_path_buf();
    for component in &components {
        joined.push(component.as_os_str());
    }

    let real = match fs::canonicalize(&joined) {
        Ok(path) => path,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            resolve_stepwise(canonical_root, &components, relative_path)?
        }
        Err(e) => return Err(ResolveError::IoError(e)),
    };

    // Path::starts_with compares whole components, so "/srv-evil" is not under "/srv"
    if !real.starts_with(canonical_root) {
        debug!(
            "Rejected {:?}: resolves to {} outside {}",
            relative_path,
            real.display(),
            canonical_root.display()
        );
        return Err(ResolveError::Escape(relative_path.to_string()));
    }

    let relative = real
        .strip_prefix(canonical_root)
        .map(Path::to_path_buf)
        .map_err(|_| ResolveError::Escape(relative_path.to_string()))?;

    Ok(ResolvedPath {
        display: relative_display(&relative),
        real,
        relative,
        requested_segments: components
            .iter()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect(),
    })
}

/// Splits the request into `Normal` and `ParentDir` components.
///
/// Root, prefix and `.` components are dropped so an absolute-looking input
/// can never replace the root when joined.
fn relevant_components(relative_path: &str) -> Vec<Component<'_>> {
    Path::new(relative_path)
        .components()
        .filter(|c| matches!(c, Component::Normal(_) | Component::ParentDir))
        .collect()
}

/// Canonicalizes one component at a time, the way `realpath` does in
/// non-strict mode. Once a component is missing, the remainder is applied
/// lexically.
fn resolve_stepwise(
    canonical_root: &Path,
    components: &[Component<'_>],
    original: &str,
) -> Result<PathBuf, ResolveError> {
    let mut current = canonical_root.to_path_buf();
    let mut missing: Vec<OsString> = Vec::new();

    for component in components {
        match component {
            Component::ParentDir => {
                if missing.pop().is_none() {
                    // current is canonical, so its lexical parent is its real parent
                    current.pop();
                }
            }
            Component::Normal(name) => {
                if !missing.is_empty() {
                    missing.push(name.to_os_string());
                    continue;
                }

                let next = current.join(name);
                match fs::canonicalize(&next) {
                    Ok(canonical) => current = canonical,
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        if fs::symlink_metadata(&next).is_ok() {
                            return Err(ResolveError::DanglingLink(original.to_string()));
                        }
                        missing.push(name.to_os_string());
                    }
                    Err(e) => return Err(ResolveError::IoError(e)),
                }
            }
            _ => {}
        }
    }

    for name in missing {
        current.push(name);
    }

    Ok(current)
}

/// Canonical root-relative path with `/` separators, used for display and
/// navigation links, so they point at the directory that was listed.
fn relative_display(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, RootHandle) {
        let dir = TempDir::new().unwrap();
        let root_path = dir.path().join("root");
        fs::create_dir_all(root_path.join("sub/deeper")).unwrap();
        fs::write(root_path.join("a.txt"), b"a").unwrap();
        fs::write(root_path.join("sub/b.txt"), b"b").unwrap();
        let root = RootHandle::configure(&root_path).unwrap();
        (dir, root)
    }

    #[test]
    fn test_empty_path_is_root() {
        let (_dir, root) = setup();
        let resolved = resolve(&root, "").unwrap();
        assert_eq!(resolved.real_path(), root.path());
        assert!(resolved.is_root());
        assert_eq!(resolved.parent_display_path(), None);
    }

    #[test]
    fn test_resolves_nested_file() {
        let (_dir, root) = setup();
        let resolved = resolve(&root, "sub/./b.txt").unwrap();
        assert_eq!(resolved.real_path(), root.path().join("sub/b.txt"));
        assert_eq!(resolved.display_path(), "sub/b.txt");
        assert_eq!(resolved.parent_display_path().as_deref(), Some("sub"));
    }

    #[test]
    fn test_parent_segments_cannot_escape() {
        let (_dir, root) = setup();
        for path in [
            "..",
            "../",
            "../../etc/passwd",
            "sub/../../a.txt",
            "sub/deeper/../../../root",
            "missing/../../..",
            "missing/deeper/../../../x",
        ] {
            match resolve(&root, path) {
                Ok(resolved) => assert!(
                    resolved.real_path().starts_with(root.path()),
                    "{} escaped to {}",
                    path,
                    resolved.real_path().display()
                ),
                Err(e) => assert!(matches!(e, ResolveError::Escape(_)), "{}: {}", path, e),
            }
        }
        assert!(matches!(resolve(&root, "../root/a.txt"), Ok(_)));
        assert!(matches!(resolve(&root, ".."), Err(ResolveError::Escape(_))));
    }

    #[test]
    fn test_parent_segments_inside_root_are_allowed() {
        let (_dir, root) = setup();
        let resolved = resolve(&root, "sub/deeper/../b.txt").unwrap();
        assert_eq!(resolved.real_path(), root.path().join("sub/b.txt"));
        assert_eq!(resolved.display_path(), "sub/b.txt");
    }

    #[test]
    fn test_absolute_input_is_relative_to_root() {
        let (_dir, root) = setup();
        let resolved = resolve(&root, "/sub/b.txt").unwrap();
        assert_eq!(resolved.real_path(), root.path().join("sub/b.txt"));
        let resolved = resolve(&root, "/etc/passwd").unwrap();
        assert_eq!(resolved.real_path(), root.path().join("etc/passwd"));
    }

    #[test]
    fn test_missing_leaf_resolves_under_existing_parent() {
        let (_dir, root) = setup();
        let resolved = resolve(&root, "sub/new-file.txt").unwrap();
        assert_eq!(resolved.real_path(), root.path().join("sub/new-file.txt"));

        let resolved = resolve(&root, "nope/../sub").unwrap();
        assert_eq!(resolved.real_path(), root.path().join("sub"));
    }

    #[test]
    fn test_sibling_with_common_prefix_is_rejected() {
        let (dir, root) = setup();
        fs::create_dir(dir.path().join("root-evil")).unwrap();
        fs::write(dir.path().join("root-evil/x.txt"), b"x").unwrap();
        assert!(matches!(
            resolve(&root, "../root-evil/x.txt"),
            Err(ResolveError::Escape(_))
        ));
    }

    #[test]
    fn test_nul_byte_is_invalid() {
        let (_dir, root) = setup();
        assert!(matches!(
            resolve(&root, "a\0.txt"),
            Err(ResolveError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_hidden_segments_are_detected() {
        let (_dir, root) = setup();
        let hidden = HiddenFilter::default();
        assert!(resolve(&root, ".git/config").unwrap().touches_hidden(&hidden));
        assert!(resolve(&root, ".hidden/../a.txt").unwrap().touches_hidden(&hidden));
        assert!(!resolve(&root, "sub/b.txt").unwrap().touches_hidden(&hidden));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_is_rejected() {
        use std::os::unix::fs::symlink;

        let (dir, root) = setup();
        let outside = dir.path().join("outside");
        fs::create_dir(&outside).unwrap();
        fs::write(outside.join("secret.txt"), b"secret").unwrap();
        symlink(&outside, root.path().join("innocent")).unwrap();

        assert!(matches!(resolve(&root, "innocent"), Err(ResolveError::Escape(_))));
        assert!(matches!(
            resolve(&root, "innocent/secret.txt"),
            Err(ResolveError::Escape(_))
        ));
        assert!(matches!(
            resolve(&root, "innocent/not-yet.txt"),
            Err(ResolveError::Escape(_))
        ));
        assert!(matches!(
            resolve(&root, "missing/../innocent/new.txt"),
            Err(ResolveError::Escape(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_root_is_followed() {
        use std::os::unix::fs::symlink;

        let (_dir, root) = setup();
        symlink(root.path().join("sub"), root.path().join("alias")).unwrap();

        let resolved = resolve(&root, "alias/b.txt").unwrap();
        assert_eq!(resolved.real_path(), root.path().join("sub/b.txt"));
        assert_eq!(resolved.display_path(), "sub/b.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_parent_of_symlinked_dir_displays_real_location() {
        use std::os::unix::fs::symlink;

        let (_dir, root) = setup();
        symlink(root.path().join("sub/deeper"), root.path().join("link")).unwrap();

        let resolved = resolve(&root, "link/..").unwrap();
        assert_eq!(resolved.real_path(), root.path().join("sub"));
        assert_eq!(resolved.display_path(), "sub");
        assert_eq!(resolved.parent_display_path().as_deref(), Some(""));

        let resolved = resolve(&root, "link/../new.txt").unwrap();
        assert_eq!(resolved.display_path(), "sub/new.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_rejected() {
        use std::os::unix::fs::symlink;

        let (dir, root) = setup();
        symlink(dir.path().join("nowhere"), root.path().join("dangling")).unwrap();
        assert!(matches!(
            resolve(&root, "dangling"),
            Err(ResolveError::DanglingLink(_))
        ));
    }
}
