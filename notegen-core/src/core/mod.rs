//! Internal domain modules for the NoteGen core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod article;
pub mod collapsible;
pub mod editor;
pub mod error;
pub mod loader;
pub mod notebook;
pub mod path;
pub mod reconcile;
pub mod remote;
pub mod settings;
pub mod sort;
pub mod storage;
pub mod store;
pub mod tree;
pub mod workspace;

#[doc(inline)]
pub use article::{Article, MarkdownFile};
#[doc(inline)]
pub use collapsible::Collapsible;
#[doc(inline)]
pub use error::{NoteGenError, Result};
#[doc(inline)]
pub use notebook::Notebook;
#[doc(inline)]
pub use reconcile::{MergeStats, ReconcileReport, Reconciler};
#[doc(inline)]
pub use remote::{RemoteEntry, RemoteEntryKind, RemoteFile, RemoteProvider};
#[doc(inline)]
pub use settings::{BackupMethod, GitlabInstanceType, SortDirection, SortKey, SyncSettings};
#[doc(inline)]
pub use storage::Storage;
#[doc(inline)]
pub use store::TreeStore;
#[doc(inline)]
pub use tree::{DirectoryEntry, FileTree, NodeId, Parent, TreeNode, TreeView};
#[doc(inline)]
pub use workspace::Workspace;
