//! Core library for NoteGen, a local-first markdown note-taking application
//! whose notes are mirrored to a git hosting provider.
//!
//! The primary entry point is [`Notebook`], which ties the resolved
//! [`Workspace`] directory to its in-memory [`FileTree`], the persisted view
//! state and the optional [`RemoteProvider`] used for sync.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

pub use core::settings;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    article::{Article, MarkdownFile},
    collapsible::Collapsible,
    error::{NoteGenError, Result},
    loader::load_tree,
    notebook::Notebook,
    reconcile::{merge_listing, MergeStats, ReconcileReport, Reconciler},
    remote::{provider_from_settings, RemoteEntry, RemoteEntryKind, RemoteFile, RemoteProvider},
    settings::{BackupMethod, GitlabInstanceType, SortDirection, SortKey, SyncSettings},
    sort::sort_tree,
    storage::Storage,
    store::TreeStore,
    tree::{DirectoryEntry, FileTree, NodeId, Parent, TreeNode, TreeView},
    workspace::Workspace,
};
