//! Merging remote directory listings into the local [`FileTree`].

use crate::core::remote::{RemoteEntry, RemoteEntryKind, RemoteProvider};
use crate::core::store::TreeStore;
use crate::core::tree::{FileTree, TreeNode};
use crate::Result;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Outcome of merging one listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Local nodes that received a remote revision.
    pub matched: usize,
    /// Remote-only nodes appended to the tree.
    pub added: usize,
}

/// Outcome of reconciling several folders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub merged: Vec<String>,
    pub failed: Vec<String>,
}

/// Merges the remote listing of `folder_path` into that folder's children.
///
/// Entries starting with `.` are skipped. A remote entry whose name equals a
/// local child's (first match wins) sets that child's revision and marks it
/// as present on the remote. Any other entry is appended as a remote-only
/// node. Returns `None` when `folder_path` is not a folder in `tree`.
pub fn merge_listing(
    tree: &mut FileTree,
    folder_path: &str,
    entries: &[RemoteEntry],
) -> Option<MergeStats> {
    let parent = tree.folder(folder_path)?;
    let mut stats = MergeStats::default();

    for entry in entries.iter().filter(|e| !e.name.starts_with('.')) {
        match tree.find_child(parent, &entry.name) {
            Some(id) => {
                if let Some(node) = tree.get_mut(id) {
                    node.remote_revision = Some(entry.revision.clone());
                    node.is_local_only = false;
                    stats.matched += 1;
                }
            }
            None => {
                let node = TreeNode::remote_only(
                    entry.name.clone(),
                    entry.kind == RemoteEntryKind::Dir,
                    entry.revision.clone(),
                );
                if tree.append(parent, node).is_ok() {
                    stats.added += 1;
                }
            }
        }
    }
    Some(stats)
}

/// Fetches remote listings and merges them into a shared [`TreeStore`].
#[derive(Clone)]
pub struct Reconciler {
    provider: Arc<dyn RemoteProvider>,
    store: TreeStore,
}

impl Reconciler {
    pub fn new(provider: Arc<dyn RemoteProvider>, store: TreeStore) -> Self {
        Self { provider, store }
    }

    /// Fetches and merges one folder.
    ///
    /// # Errors
    ///
    /// Propagates the provider error; the tree is left untouched in that case.
    pub async fn reconcile_path(&self, folder_path: &str) -> Result<MergeStats> {
        fetch_and_merge(self.provider.as_ref(), &self.store, folder_path).await
    }

    /// Reconciles every folder in `paths` concurrently.
    ///
    /// Each response is merged as soon as it arrives, in no particular order.
    /// A failed folder is logged and keeps its local-only state.
    pub async fn reconcile_all<I>(&self, paths: I) -> ReconcileReport
    where
        I: IntoIterator<Item = String>,
    {
        let mut tasks = JoinSet::new();
        for folder_path in paths {
            let provider = Arc::clone(&self.provider);
            let store = self.store.clone();
            tasks.spawn(async move {
                let result = fetch_and_merge(provider.as_ref(), &store, &folder_path).await;
                (folder_path, result)
            });
        }

        let mut report = ReconcileReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((folder_path, Ok(_))) => report.merged.push(folder_path),
                Ok((folder_path, Err(e))) => {
                    log::warn!(
                        "{} listing for '{folder_path}' failed: {e}",
                        self.provider.name()
                    );
                    report.failed.push(folder_path);
                }
                Err(e) => log::error!("reconcile task panicked: {e}"),
            }
        }
        report
    }
}

async fn fetch_and_merge(
    provider: &dyn RemoteProvider,
    store: &TreeStore,
    folder_path: &str,
) -> Result<MergeStats> {
    let entries = provider.list_directory(folder_path).await?;
    let stats = store.update(|tree| merge_listing(tree, folder_path, &entries));
    match stats {
        Some(stats) => {
            log::debug!(
                "merged '{folder_path}' from {}: {} matched, {} added",
                provider.name(),
                stats.matched,
                stats.added
            );
            Ok(stats)
        }
        None => {
            log::debug!("'{folder_path}' is no longer in the tree; listing discarded");
            Ok(MergeStats::default())
        }
    }
}
