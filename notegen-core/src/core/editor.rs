//! Local create, rename and delete operations on the tree and the disk.
//!
//! Creating an entry is two-step: a nameless placeholder is inserted at the
//! top of its folder while the user types, then it is either committed
//! (written to disk and named) or cancelled (removed from the tree).

use crate::core::path;
use crate::core::tree::{FileTree, NodeId, Parent, TreeNode};
use crate::{NoteGenError, Result, Workspace};
use chrono::Utc;
use std::fs;
use std::io::ErrorKind;

fn folder_or_err(tree: &FileTree, folder_path: &str) -> Result<Parent> {
    tree.folder(folder_path)
        .ok_or_else(|| NoteGenError::NodeNotFound(folder_path.to_string()))
}

fn find_placeholder(tree: &FileTree, parent: Parent, is_directory: bool) -> Option<NodeId> {
    tree.children(parent).iter().copied().find(|id| {
        tree.get(*id)
            .is_some_and(|n| n.is_pending_create() && n.is_directory == is_directory)
    })
}

/// Inserts a placeholder at the top of `folder_path`.
///
/// Returns `None` without changing the tree when that folder already holds a
/// placeholder of the same kind.
pub fn new_placeholder(
    tree: &mut FileTree,
    folder_path: &str,
    is_directory: bool,
) -> Result<Option<NodeId>> {
    let parent = folder_or_err(tree, folder_path)?;
    if find_placeholder(tree, parent, is_directory).is_some() {
        return Ok(None);
    }
    tree.prepend(parent, TreeNode::placeholder(is_directory))
        .map(Some)
}

/// Removes the placeholder(s) of `folder_path`. Returns `true` if one was removed.
pub fn cancel_create(tree: &mut FileTree, folder_path: &str) -> bool {
    let Some(parent) = tree.folder(folder_path) else {
        return false;
    };
    let pending: Vec<NodeId> = tree
        .children(parent)
        .iter()
        .copied()
        .filter(|id| tree.get(*id).is_some_and(TreeNode::is_pending_create))
        .collect();
    for id in &pending {
        tree.remove(*id);
    }
    !pending.is_empty()
}

/// Names the placeholder in `folder_path` and creates the entry on disk.
///
/// Spaces in `name` become underscores and files get a `.md` extension when
/// they have none. An empty name cancels the create and returns `Ok(None)`.
///
/// # Errors
///
/// Returns [`NoteGenError::NameConflict`] if the name is taken on disk or by a
/// sibling, or [`NoteGenError::InvalidPath`] if it contains a path separator.
/// The tree is not modified in either case.
pub fn commit_create(
    workspace: &Workspace,
    tree: &mut FileTree,
    folder_path: &str,
    name: &str,
    is_directory: bool,
) -> Result<Option<String>> {
    let mut name = path::entry_name(name)?;
    if name.is_empty() {
        cancel_create(tree, folder_path);
        return Ok(None);
    }
    if !is_directory && !name.contains('.') {
        name.push_str(".md");
    }

    let parent = folder_or_err(tree, folder_path)?;
    let rel = path::join(folder_path, &name);
    let abs = workspace.abs_path(&rel)?;
    if tree.find_child(parent, &name).is_some() || abs.exists() {
        return Err(NoteGenError::NameConflict(rel));
    }

    if is_directory {
        fs::create_dir_all(&abs)?;
    } else {
        if let Some(dir) = abs.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&abs, "")?;
    }

    let id = match find_placeholder(tree, parent, is_directory) {
        Some(id) => id,
        None => tree.prepend(parent, TreeNode::placeholder(is_directory))?,
    };
    if let Some(node) = tree.get_mut(id) {
        node.name = name;
        node.is_editing = false;
        node.on_disk = true;
        if !is_directory {
            let now = Utc::now();
            node.created_at = Some(now);
            node.modified_at = Some(now);
        }
    }
    log::info!("created {rel}");
    Ok(Some(rel))
}

/// Writes an empty, timestamp-named markdown file into `folder_path` and
/// inserts it at the top of that folder. Returns the new file's path.
pub fn create_file_in_folder(
    workspace: &Workspace,
    tree: &mut FileTree,
    folder_path: &str,
) -> Result<String> {
    let parent = folder_or_err(tree, folder_path)?;
    let now = Utc::now();
    let name = format!("新建文件-{}.md", now.timestamp_millis());
    let rel = path::join(folder_path, &name);
    fs::write(workspace.abs_path(&rel)?, "")?;

    let mut node = TreeNode::placeholder(false);
    node.name = name;
    node.is_editing = false;
    node.on_disk = true;
    node.created_at = Some(now);
    node.modified_at = Some(now);
    tree.prepend(parent, node)?;
    Ok(rel)
}

/// Renames the entry at `rel_path` on disk and in the tree. Returns the new path.
///
/// # Errors
///
/// Returns [`NoteGenError::NodeNotFound`] if no node exists at `rel_path`, or
/// [`NoteGenError::NameConflict`] if a sibling already uses `new_name`.
pub fn rename(
    workspace: &Workspace,
    tree: &mut FileTree,
    rel_path: &str,
    new_name: &str,
) -> Result<String> {
    let id = tree
        .find(rel_path)
        .ok_or_else(|| NoteGenError::NodeNotFound(rel_path.to_string()))?;
    let new_name = path::entry_name(new_name)?;
    if new_name.is_empty() {
        return Err(NoteGenError::InvalidPath(rel_path.to_string()));
    }
    let folder_path = path::parent(rel_path);
    let new_rel = path::join(folder_path, &new_name);
    if new_name == path::file_name(rel_path) {
        return Ok(new_rel);
    }

    let parent = folder_or_err(tree, folder_path)?;
    let new_abs = workspace.abs_path(&new_rel)?;
    if tree.find_child(parent, &new_name).is_some() || new_abs.exists() {
        return Err(NoteGenError::NameConflict(new_rel));
    }

    let old_abs = workspace.abs_path(rel_path)?;
    if fs::symlink_metadata(&old_abs).is_ok() {
        fs::rename(&old_abs, &new_abs)?;
    }
    if let Some(node) = tree.get_mut(id) {
        node.name = new_name;
        node.is_editing = false;
    }
    log::info!("renamed {rel_path} -> {new_rel}");
    Ok(new_rel)
}

/// Deletes the entry at `rel_path` from disk and from the tree.
///
/// Returns the number of tree nodes removed.
pub fn delete(workspace: &Workspace, tree: &mut FileTree, rel_path: &str) -> Result<usize> {
    let id = tree
        .find(rel_path)
        .ok_or_else(|| NoteGenError::NodeNotFound(rel_path.to_string()))?;
    let (on_disk, is_directory) = tree
        .get(id)
        .map(|n| (n.on_disk, n.is_directory))
        .unwrap_or_default();

    let abs = workspace.abs_path(rel_path)?;
    let removed = if is_directory {
        fs::remove_dir_all(&abs)
    } else {
        fs::remove_file(&abs)
    };
    match removed {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if on_disk {
                log::warn!("{rel_path} was already gone from disk");
            }
        }
        Err(e) => return Err(e.into()),
    }
    Ok(tree.remove(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loader::load_tree;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Workspace, FileTree) {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::custom(tmp.path().join("notes"));
        ws.ensure_root().unwrap();
        fs::create_dir_all(ws.abs_path("journal").unwrap()).unwrap();
        fs::write(ws.abs_path("journal/day.md").unwrap(), "day").unwrap();
        fs::write(ws.abs_path("a.md").unwrap(), "a").unwrap();
        let tree = load_tree(&ws).unwrap();
        (tmp, ws, tree)
    }

    #[test]
    fn test_new_placeholder_is_first_and_unique() {
        let (_tmp, _ws, mut tree) = setup();
        let id = new_placeholder(&mut tree, "", true).unwrap().unwrap();
        assert_eq!(tree.roots()[0], id);
        assert!(new_placeholder(&mut tree, "", true).unwrap().is_none());
        // A file placeholder may coexist with a folder placeholder.
        assert!(new_placeholder(&mut tree, "", false).unwrap().is_some());
    }

    #[test]
    fn test_new_placeholder_in_missing_folder() {
        let (_tmp, _ws, mut tree) = setup();
        let result = new_placeholder(&mut tree, "nope", true);
        assert!(matches!(result, Err(NoteGenError::NodeNotFound(_))));
    }

    #[test]
    fn test_cancel_removes_placeholder() {
        let (_tmp, _ws, mut tree) = setup();
        let before = tree.len();
        new_placeholder(&mut tree, "journal", true).unwrap();
        assert_eq!(tree.len(), before + 1);
        assert!(cancel_create(&mut tree, "journal"));
        assert_eq!(tree.len(), before);
        assert!(!cancel_create(&mut tree, "journal"));
    }

    #[test]
    fn test_commit_folder_creates_directory() {
        let (_tmp, ws, mut tree) = setup();
        new_placeholder(&mut tree, "journal", true).unwrap();
        let rel = commit_create(&ws, &mut tree, "journal", "my ideas", true)
            .unwrap()
            .unwrap();
        assert_eq!(rel, "journal/my_ideas");
        assert!(ws.abs_path(&rel).unwrap().is_dir());
        let node = tree.get(tree.find(&rel).unwrap()).unwrap();
        assert!(!node.is_editing);
        assert!(node.on_disk);
    }

    #[test]
    fn test_commit_duplicate_folder_is_rejected() {
        let (_tmp, ws, mut tree) = setup();
        new_placeholder(&mut tree, "", true).unwrap();
        let before = tree.to_view();

        let result = commit_create(&ws, &mut tree, "", "journal", true);
        assert!(matches!(result, Err(NoteGenError::NameConflict(_))));
        assert_eq!(tree.to_view(), before);
    }

    #[test]
    fn test_commit_name_with_separator_is_rejected() {
        let (_tmp, ws, mut tree) = setup();
        new_placeholder(&mut tree, "", true).unwrap();
        let before = tree.to_view();

        let result = commit_create(&ws, &mut tree, "", "x/y", true);
        assert!(matches!(result, Err(NoteGenError::InvalidPath(_))));
        assert_eq!(tree.to_view(), before);
        assert!(!ws.abs_path("x").unwrap().exists());
    }

    #[test]
    fn test_rename_with_separator_is_rejected() {
        let (_tmp, ws, mut tree) = setup();
        let result = rename(&ws, &mut tree, "a.md", "journal/a.md");
        assert!(matches!(result, Err(NoteGenError::InvalidPath(_))));
        assert!(tree.find("a.md").is_some());
        assert!(ws.abs_path("a.md").unwrap().exists());
    }

    #[test]
    fn test_commit_empty_name_cancels() {
        let (_tmp, ws, mut tree) = setup();
        let before = tree.len();
        new_placeholder(&mut tree, "", false).unwrap();
        assert!(commit_create(&ws, &mut tree, "", "  ", false).unwrap().is_none());
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn test_commit_file_adds_extension() {
        let (_tmp, ws, mut tree) = setup();
        new_placeholder(&mut tree, "", false).unwrap();
        let rel = commit_create(&ws, &mut tree, "", "todo", false).unwrap().unwrap();
        assert_eq!(rel, "todo.md");
        assert!(ws.abs_path("todo.md").unwrap().is_file());
    }

    #[test]
    fn test_create_file_in_folder() {
        let (_tmp, ws, mut tree) = setup();
        let rel = create_file_in_folder(&ws, &mut tree, "journal").unwrap();
        assert!(rel.starts_with("journal/新建文件-"));
        assert!(ws.abs_path(&rel).unwrap().is_file());
        let journal = tree.find("journal").unwrap();
        let first = tree.children(Parent::Node(journal))[0];
        assert_eq!(tree.path_of(first), rel);
    }

    #[test]
    fn test_rename_file() {
        let (_tmp, ws, mut tree) = setup();
        let rel = rename(&ws, &mut tree, "journal/day.md", "night.md").unwrap();
        assert_eq!(rel, "journal/night.md");
        assert!(ws.abs_path("journal/night.md").unwrap().exists());
        assert!(!ws.abs_path("journal/day.md").unwrap().exists());
        assert!(tree.find("journal/night.md").is_some());
    }

    #[test]
    fn test_rename_conflict() {
        let (_tmp, ws, mut tree) = setup();
        fs::write(ws.abs_path("b.md").unwrap(), "b").unwrap();
        let result = rename(&ws, &mut tree, "a.md", "b.md");
        assert!(matches!(result, Err(NoteGenError::NameConflict(_))));
        assert!(tree.find("a.md").is_some());
    }

    #[test]
    fn test_delete_folder() {
        let (_tmp, ws, mut tree) = setup();
        assert_eq!(delete(&ws, &mut tree, "journal").unwrap(), 2);
        assert!(!ws.abs_path("journal").unwrap().exists());
        assert!(tree.find("journal").is_none());
    }

    #[test]
    fn test_delete_last_entry_leaves_empty_root() {
        let (_tmp, ws, mut tree) = setup();
        delete(&ws, &mut tree, "journal").unwrap();
        delete(&ws, &mut tree, "a.md").unwrap();
        assert!(tree.roots().is_empty());
        assert!(new_placeholder(&mut tree, "", false).unwrap().is_some());
    }

    #[test]
    fn test_delete_remote_only_node_skips_disk() {
        let (_tmp, ws, mut tree) = setup();
        tree.append(
            Parent::Root,
            TreeNode::remote_only("remote.md".to_string(), false, "r1".to_string()),
        )
        .unwrap();
        assert_eq!(delete(&ws, &mut tree, "remote.md").unwrap(), 1);
    }
}
