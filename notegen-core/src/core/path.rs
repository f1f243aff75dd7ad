//! Helpers for workspace-relative, `/`-separated paths.
//!
//! Tree nodes, remote providers and persisted settings all address entries by
//! a relative path such as `journal/2024/01.md`; the empty string is the
//! workspace root.

use crate::{NoteGenError, Result};

/// Joins a parent path and a child name, treating `""` as the root.
#[must_use]
pub fn join(parent: &str, name: &str) -> String {
    let parent = parent.trim_matches('/');
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Returns the parent folder of `path` (`""` for root-level entries).
#[must_use]
pub fn parent(path: &str) -> &str {
    let path = path.trim_matches('/');
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Returns the last component of `path`.
#[must_use]
pub fn file_name(path: &str) -> &str {
    let path = path.trim_matches('/');
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Splits `path` into its non-empty components.
pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

/// Returns `true` for markdown files.
#[must_use]
pub fn is_markdown(name: &str) -> bool {
    name.ends_with(".md")
}

/// Trims `name` and replaces spaces with underscores.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.trim().replace(' ', "_")
}

/// Sanitizes a user-typed entry name with [`sanitize_name`].
///
/// # Errors
///
/// Returns [`NoteGenError::InvalidPath`] if the name contains a path
/// separator or is `.` or `..`.
pub fn entry_name(name: &str) -> Result<String> {
    let name = sanitize_name(name);
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(NoteGenError::InvalidPath(name));
    }
    Ok(name)
}
