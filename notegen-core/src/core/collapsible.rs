//! The persisted set of expanded folders.

use crate::core::path;
use crate::core::tree::FileTree;
use crate::settings::keys;
use crate::{Result, Storage};

/// Ordered, duplicate-free list of expanded folder paths.
///
/// Every mutation is written back to the settings store as a whole list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collapsible {
    paths: Vec<String>,
}

impl Collapsible {
    /// Loads the persisted list, dropping duplicates and file paths.
    ///
    /// When `tree` is given, paths that resolve to a file node are dropped too.
    pub fn load(store: &Storage, tree: Option<&FileTree>) -> Result<Self> {
        let stored: Vec<String> = store.get(keys::COLLAPSIBLE_LIST)?.unwrap_or_default();
        let mut list = Self::default();
        for p in stored {
            if is_file_path(&p, tree) {
                continue;
            }
            list.insert(p);
        }
        Ok(list)
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn contains(&self, folder_path: &str) -> bool {
        self.paths.iter().any(|p| p == folder_path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Adds `folder_path`. Returns `false` if it was already present or names a file.
    pub fn insert(&mut self, folder_path: String) -> bool {
        if path::is_markdown(&folder_path) || self.contains(&folder_path) {
            return false;
        }
        self.paths.push(folder_path);
        true
    }

    /// Removes `folder_path`. Returns `false` if it was not present.
    pub fn remove(&mut self, folder_path: &str) -> bool {
        let before = self.paths.len();
        self.paths.retain(|p| p != folder_path);
        self.paths.len() != before
    }

    /// Replaces the whole list, dropping duplicates.
    pub fn replace_all<I: IntoIterator<Item = String>>(&mut self, paths: I) {
        self.paths.clear();
        for p in paths {
            self.insert(p);
        }
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Writes the list to the settings store.
    pub fn persist(&self, store: &Storage) -> Result<()> {
        store.set(keys::COLLAPSIBLE_LIST, &self.paths)
    }

    /// Updates every entry under `old_path` after a folder rename.
    pub fn rename_prefix(&mut self, old_path: &str, new_path: &str) {
        let prefix = format!("{old_path}/");
        let renamed: Vec<String> = self
            .paths
            .drain(..)
            .map(|p| {
                if p == old_path {
                    new_path.to_string()
                } else if let Some(rest) = p.strip_prefix(&prefix) {
                    path::join(new_path, rest)
                } else {
                    p
                }
            })
            .collect();
        self.replace_all(renamed);
    }

    /// Drops `folder_path` and everything below it.
    pub fn remove_prefix(&mut self, folder_path: &str) {
        let prefix = format!("{folder_path}/");
        self.paths
            .retain(|p| p != folder_path && !p.starts_with(&prefix));
    }
}

fn is_file_path(p: &str, tree: Option<&FileTree>) -> bool {
    if path::is_markdown(p) {
        return true;
    }
    tree.and_then(|t| t.find(p).and_then(|id| t.get(id)))
        .is_some_and(|n| n.is_file)
}
