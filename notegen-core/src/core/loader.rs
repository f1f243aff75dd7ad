//! Builds a [`FileTree`] from the workspace directory on disk.

use crate::core::path;
use crate::core::tree::{DirectoryEntry, FileTree, NodeId, Parent, TreeNode};
use crate::{Result, Workspace};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

fn image_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\.(jpg|jpeg|png|gif|bmp|webp|svg)$").expect("static regex is valid")
    })
}

/// Returns `true` for entries the file tree shows: folders, markdown and images.
///
/// Hidden entries (including `.DS_Store`) are always excluded.
#[must_use]
pub fn is_supported_entry(entry: &DirectoryEntry) -> bool {
    if entry.name.starts_with('.') {
        return false;
    }
    entry.is_directory || path::is_markdown(&entry.name) || image_pattern().is_match(&entry.name)
}

/// Lists the supported entries of one directory.
pub fn read_entries(dir: &Path) -> Result<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();
    for item in fs::read_dir(dir)? {
        let item = item?;
        let file_type = item.file_type()?;
        let is_symlink = file_type.is_symlink();
        let (is_file, is_directory) = if is_symlink {
            match fs::metadata(item.path()) {
                Ok(meta) => (meta.is_file(), meta.is_dir()),
                Err(_) => (false, false),
            }
        } else {
            (file_type.is_file(), file_type.is_dir())
        };
        let entry = DirectoryEntry {
            name: item.file_name().to_string_lossy().into_owned(),
            is_file,
            is_directory,
            is_symlink,
        };
        if is_supported_entry(&entry) {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Loads the whole workspace into a fresh tree.
///
/// The workspace root is created if missing. Every directory is visited once.
/// File nodes then receive created/modified timestamps; directories do not.
/// A stat failure on one file is logged and leaves that node without stats.
///
/// # Errors
///
/// Returns [`crate::NoteGenError::Io`] if the root or any directory cannot be listed.
pub fn load_tree(workspace: &Workspace) -> Result<FileTree> {
    workspace.ensure_root()?;

    let mut tree = FileTree::new();
    let mut pending: Vec<(Parent, std::path::PathBuf)> =
        vec![(Parent::Root, workspace.path().to_path_buf())];

    while let Some((parent, dir)) = pending.pop() {
        for entry in read_entries(&dir)? {
            let child_dir = entry.is_directory.then(|| dir.join(&entry.name));
            let id = tree.append(parent, TreeNode::from_entry(entry))?;
            if let Some(child_dir) = child_dir {
                pending.push((Parent::Node(id), child_dir));
            }
        }
    }

    attach_file_stats(workspace, &mut tree);
    log::debug!(
        "loaded {} entries from {}",
        tree.len(),
        workspace.path().display()
    );
    Ok(tree)
}

/// Sets `created_at` / `modified_at` on every file node from filesystem metadata.
pub fn attach_file_stats(workspace: &Workspace, tree: &mut FileTree) {
    let files: Vec<NodeId> = tree
        .preorder()
        .into_iter()
        .filter(|id| tree.get(*id).is_some_and(|n| n.is_file))
        .collect();

    for id in files {
        let rel = tree.path_of(id);
        let stats = workspace
            .abs_path(&rel)
            .and_then(|abs| Ok(fs::metadata(abs)?));
        match stats {
            Ok(meta) => {
                if let Some(node) = tree.get_mut(id) {
                    node.created_at = meta.created().ok().map(DateTime::<Utc>::from);
                    node.modified_at = meta.modified().ok().map(DateTime::<Utc>::from);
                }
            }
            Err(e) => log::warn!("failed to read stats for {rel}: {e}"),
        }
    }
}
