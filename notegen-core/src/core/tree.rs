//! In-memory file tree of a workspace.
//!
//! Nodes live in a flat [`SlotMap`] arena. A node's `parent` is an arena key,
//! never an owning pointer, so the tree has no reference cycles and a
//! `clone()` yields a fully independent snapshot that keeps every [`NodeId`]
//! valid.

use crate::core::path;
use crate::{NoteGenError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

new_key_type! { pub struct NodeId; }

/// A primitive filesystem descriptor as produced by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
}

/// One file or folder in a [`FileTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
    /// Child keys in display order; `None` for files.
    pub children: Option<Vec<NodeId>>,
    /// `None` for root-level entries.
    pub parent: Option<NodeId>,
    /// Content hash reported by the remote provider (git blob SHA).
    pub remote_revision: Option<String>,
    /// The node is being named in the UI; with an empty name it is an unsaved create.
    pub is_editing: bool,
    /// Not yet confirmed present on the remote.
    pub is_local_only: bool,
    /// Exists in the local workspace directory.
    pub on_disk: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl TreeNode {
    /// Builds a node for an entry read from the local workspace.
    #[must_use]
    pub fn from_entry(entry: DirectoryEntry) -> Self {
        Self {
            children: entry.is_directory.then(Vec::new),
            name: entry.name,
            is_file: entry.is_file,
            is_directory: entry.is_directory,
            is_symlink: entry.is_symlink,
            parent: None,
            remote_revision: None,
            is_editing: false,
            is_local_only: true,
            on_disk: true,
            created_at: None,
            modified_at: None,
        }
    }

    /// Builds an unnamed node that is being created in the UI.
    #[must_use]
    pub fn placeholder(is_directory: bool) -> Self {
        let mut node = Self::from_entry(DirectoryEntry {
            name: String::new(),
            is_file: !is_directory,
            is_directory,
            is_symlink: false,
        });
        node.is_editing = true;
        node.on_disk = false;
        node
    }

    /// Builds a node for an entry that exists only on the remote.
    #[must_use]
    pub fn remote_only(name: String, is_directory: bool, revision: String) -> Self {
        let mut node = Self::from_entry(DirectoryEntry {
            name,
            is_file: !is_directory,
            is_directory,
            is_symlink: false,
        });
        node.remote_revision = Some(revision);
        node.is_local_only = false;
        node.on_disk = false;
        node
    }

    /// Returns `true` for an unnamed node awaiting a name.
    #[must_use]
    pub fn is_pending_create(&self) -> bool {
        self.is_editing && self.name.is_empty()
    }
}

/// The folder a child list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    Root,
    Node(NodeId),
}

impl From<Option<NodeId>> for Parent {
    fn from(id: Option<NodeId>) -> Self {
        id.map_or(Parent::Root, Parent::Node)
    }
}

impl Parent {
    fn as_option(self) -> Option<NodeId> {
        match self {
            Parent::Root => None,
            Parent::Node(id) => Some(id),
        }
    }
}

/// A nested, serializable rendering of a [`FileTree`] for consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeView {
    pub name: String,
    pub path: String,
    pub is_file: bool,
    pub is_directory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    pub is_editing: bool,
    pub is_local_only: bool,
    pub on_disk: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeView>>,
}

/// The whole workspace tree: an arena plus the ordered root-level entries.
#[derive(Debug, Clone, Default)]
pub struct FileTree {
    arena: SlotMap<NodeId, TreeNode>,
    roots: Vec<NodeId>,
}

impl FileTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.arena.get_mut(id)
    }

    /// Root-level entries in display order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Total number of nodes at every depth.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Returns the child list of `parent`; files and unknown ids have none.
    pub fn children(&self, parent: Parent) -> &[NodeId] {
        match parent {
            Parent::Root => &self.roots,
            Parent::Node(id) => self
                .arena
                .get(id)
                .and_then(|n| n.children.as_deref())
                .unwrap_or(&[]),
        }
    }

    pub(crate) fn children_mut(&mut self, parent: Parent) -> Option<&mut Vec<NodeId>> {
        match parent {
            Parent::Root => Some(&mut self.roots),
            Parent::Node(id) => self.arena.get_mut(id)?.children.as_mut(),
        }
    }

    /// Appends `node` to the end of `parent`'s children.
    ///
    /// # Errors
    ///
    /// Returns [`NoteGenError::InvalidPath`] if `parent` is not a directory.
    pub fn append(&mut self, parent: Parent, node: TreeNode) -> Result<NodeId> {
        self.insert_at(parent, node, false)
    }

    /// Inserts `node` as the first of `parent`'s children.
    ///
    /// # Errors
    ///
    /// Returns [`NoteGenError::InvalidPath`] if `parent` is not a directory.
    pub fn prepend(&mut self, parent: Parent, node: TreeNode) -> Result<NodeId> {
        self.insert_at(parent, node, true)
    }

    fn insert_at(&mut self, parent: Parent, mut node: TreeNode, front: bool) -> Result<NodeId> {
        if self.children_mut(parent).is_none() {
            return Err(NoteGenError::InvalidPath(
                "parent is not a directory".to_string(),
            ));
        }
        node.parent = parent.as_option();
        let id = self.arena.insert(node);
        if let Some(list) = self.children_mut(parent) {
            if front {
                list.insert(0, id);
            } else {
                list.push(id);
            }
        }
        Ok(id)
    }

    /// Removes `id` and its whole subtree. Returns the number of nodes removed.
    pub fn remove(&mut self, id: NodeId) -> usize {
        let Some(node) = self.arena.get(id) else {
            return 0;
        };
        let parent = Parent::from(node.parent);
        if let Some(list) = self.children_mut(parent) {
            list.retain(|c| *c != id);
        }

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.arena.remove(next) {
                removed += 1;
                stack.extend(node.children.unwrap_or_default());
            }
        }
        removed
    }

    /// Marks `id` and every ancestor folder as present in the workspace directory.
    pub fn mark_on_disk(&mut self, id: NodeId) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.arena.get_mut(current) {
                Some(node) => {
                    node.on_disk = true;
                    cursor = node.parent;
                }
                None => break,
            }
        }
    }

    /// Returns the first child of `parent` named exactly `name`.
    pub fn find_child(&self, parent: Parent, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.arena.get(*c).is_some_and(|n| n.name == name))
    }

    /// Looks up the node at a workspace-relative path.
    pub fn find(&self, rel_path: &str) -> Option<NodeId> {
        let mut parent = Parent::Root;
        let mut found = None;
        for name in path::components(rel_path) {
            let id = self.find_child(parent, name)?;
            found = Some(id);
            parent = Parent::Node(id);
        }
        found
    }

    /// Resolves a folder path; `""` is the root. Returns `None` for files or missing paths.
    pub fn folder(&self, rel_path: &str) -> Option<Parent> {
        if path::components(rel_path).next().is_none() {
            return Some(Parent::Root);
        }
        let id = self.find(rel_path)?;
        self.arena
            .get(id)
            .filter(|n| n.is_directory)
            .map(|_| Parent::Node(id))
    }

    /// Returns the workspace-relative path of `id`.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.arena.get(current) {
                Some(node) => {
                    names.push(node.name.as_str());
                    cursor = node.parent;
                }
                None => break,
            }
        }
        names.reverse();
        names.join("/")
    }

    /// All node ids in depth-first display order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.arena.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(children) = self.arena.get(id).and_then(|n| n.children.as_ref()) {
                stack.extend(children.iter().rev().copied());
            }
        }
        out
    }

    /// Paths of every directory in the tree, parents before children.
    pub fn folder_paths(&self) -> Vec<String> {
        self.preorder()
            .into_iter()
            .filter(|id| self.arena.get(*id).is_some_and(|n| !n.is_file && !n.name.is_empty()))
            .map(|id| self.path_of(id))
            .collect()
    }

    /// Renders the tree as nested [`TreeView`] values.
    pub fn to_view(&self) -> Vec<TreeView> {
        self.view_list(&self.roots, "")
    }

    fn view_list(&self, ids: &[NodeId], parent_path: &str) -> Vec<TreeView> {
        ids.iter()
            .filter_map(|id| self.arena.get(*id))
            .map(|node| {
                let node_path = path::join(parent_path, &node.name);
                TreeView {
                    children: node
                        .children
                        .as_ref()
                        .map(|c| self.view_list(c, &node_path)),
                    name: node.name.clone(),
                    path: node_path,
                    is_file: node.is_file,
                    is_directory: node.is_directory,
                    sha: node.remote_revision.clone(),
                    is_editing: node.is_editing,
                    is_local_only: node.is_local_only,
                    on_disk: node.on_disk,
                    created_at: node.created_at,
                    modified_at: node.modified_at,
                }
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn file(name: &str) -> TreeNode {
        TreeNode::from_entry(DirectoryEntry {
            name: name.to_string(),
            is_file: true,
            is_directory: false,
            is_symlink: false,
        })
    }

    pub(crate) fn dir(name: &str) -> TreeNode {
        TreeNode::from_entry(DirectoryEntry {
            name: name.to_string(),
            is_file: false,
            is_directory: true,
            is_symlink: false,
        })
    }

    fn sample() -> (FileTree, NodeId) {
        let mut tree = FileTree::new();
        let notes = tree.append(Parent::Root, dir("notes")).unwrap();
        tree.append(Parent::Node(notes), file("a.md")).unwrap();
        let daily = tree.append(Parent::Node(notes), dir("daily")).unwrap();
        tree.append(Parent::Node(daily), file("today.md")).unwrap();
        tree.append(Parent::Root, file("readme.md")).unwrap();
        (tree, notes)
    }

    #[test]
    fn test_find_by_path() {
        let (tree, notes) = sample();
        assert_eq!(tree.find("notes"), Some(notes));
        let today = tree.find("notes/daily/today.md").unwrap();
        assert_eq!(tree.path_of(today), "notes/daily/today.md");
        assert!(tree.find("notes/missing.md").is_none());
        assert!(tree.find("").is_none());
    }

    #[test]
    fn test_folder_resolution() {
        let (tree, notes) = sample();
        assert_eq!(tree.folder(""), Some(Parent::Root));
        assert_eq!(tree.folder("notes"), Some(Parent::Node(notes)));
        assert_eq!(tree.folder("readme.md"), None);
        assert_eq!(tree.folder("nope"), None);
    }

    #[test]
    fn test_parent_link_is_key() {
        let (tree, notes) = sample();
        let a = tree.find("notes/a.md").unwrap();
        assert_eq!(tree.get(a).unwrap().parent, Some(notes));
        let readme = tree.find("readme.md").unwrap();
        assert_eq!(tree.get(readme).unwrap().parent, None);
    }

    #[test]
    fn test_cannot_insert_under_file() {
        let (mut tree, _) = sample();
        let readme = tree.find("readme.md").unwrap();
        let result = tree.append(Parent::Node(readme), file("x.md"));
        assert!(matches!(result, Err(NoteGenError::InvalidPath(_))));
    }

    #[test]
    fn test_prepend_puts_node_first() {
        let (mut tree, _) = sample();
        let id = tree.prepend(Parent::Root, TreeNode::placeholder(true)).unwrap();
        assert_eq!(tree.roots()[0], id);
        assert!(tree.get(id).unwrap().is_pending_create());
    }

    #[test]
    fn test_remove_subtree() {
        let (mut tree, notes) = sample();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.remove(notes), 4);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.roots().len(), 1);
        assert!(tree.find("notes/a.md").is_none());
    }

    #[test]
    fn test_remove_last_root_entry_leaves_empty_root() {
        let mut tree = FileTree::new();
        let only = tree.append(Parent::Root, file("only.md")).unwrap();
        tree.remove(only);
        assert!(tree.roots().is_empty());
        assert!(tree.is_empty());
        tree.append(Parent::Root, file("new.md")).unwrap();
        assert_eq!(tree.roots().len(), 1);
    }

    #[test]
    fn test_folder_paths() {
        let (tree, _) = sample();
        assert_eq!(tree.folder_paths(), vec!["notes", "notes/daily"]);
    }

    #[test]
    fn test_clone_is_independent() {
        let (tree, notes) = sample();
        let mut copy = tree.clone();
        copy.get_mut(notes).unwrap().remote_revision = Some("abc".to_string());
        assert!(tree.get(notes).unwrap().remote_revision.is_none());
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let (tree, _) = sample();
        let view = tree.to_view();
        assert_eq!(view[0].path, "notes");
        assert_eq!(view[0].children.as_ref().unwrap()[1].path, "notes/daily");
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"isDirectory\":true"));
        assert!(json.contains("\"isLocalOnly\":true"));
    }
}
