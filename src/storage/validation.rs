//! Name validation
//!
//! Hidden-entry predicate and the filename sanitization rules applied to
//! client-supplied upload names.

use std::sync::Arc;

/// Extensions longer than this are not preserved when truncating a name
const MAX_PRESERVED_EXTENSION: usize = 16;

/// Windows device names that cannot be used as file names on NTFS/FAT
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Decides which entry names are hidden from listings and blocked from transfer.
#[derive(Debug, Clone)]
pub struct HiddenFilter {
    prefixes: Arc<[String]>,
}

impl HiddenFilter {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if the entry name should be hidden
    pub fn is_hidden(&self, name: &str) -> bool {
        self.prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }
}

impl Default for HiddenFilter {
    fn default() -> Self {
        Self::new(["."])
    }
}

/// Reduces a client-supplied filename to a bare, portable file name.
///
/// Directory components are discarded, whitespace becomes `_`, anything other
/// than alphanumerics, `-`, `_` and `.` is dropped, trailing dots are removed,
/// and Windows device names are prefixed with `_`. Leading dots are kept so the
/// hidden-name check still sees them. Returns `None` if nothing usable remains.
pub fn sanitize_filename(raw: &str, max_len: usize) -> Option<String> {
    let base = raw.rsplit(&['/', '\\'][..]).next().unwrap_or("").trim();

    let mut name: String = base
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    let trimmed_len = name.trim_end_matches('.').len();
    name.truncate(trimmed_len);

    if name.is_empty() {
        return None;
    }

    let stem = name.split('.').next().unwrap_or("");
    if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(stem)) {
        name.insert(0, '_');
    }

    // Truncation can expose a dot at the new end
    let name = truncate_name(name, max_len);
    let name = name.trim_end_matches('.');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Truncates to `max_len` bytes on a char boundary, keeping a short extension.
fn truncate_name(name: String, max_len: usize) -> String {
    if name.len() <= max_len {
        return name;
    }

    let extension = match name.rfind('.') {
        Some(idx) if idx > 0 && name.len() - idx <= MAX_PRESERVED_EXTENSION => &name[idx..],
        _ => "",
    };

    if extension.len() >= max_len {
        return floor_boundary(&name, max_len).to_string();
    }

    let stem_budget = max_len - extension.len();
    let stem = floor_boundary(&name[..name.len() - extension.len()], stem_budget);
    format!("{}{}", stem, extension)
}

fn floor_boundary(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
