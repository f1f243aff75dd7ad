//! [`Notebook`]: the open workspace together with its file tree and view state.

use crate::core::article::{self, Article, MarkdownFile};
use crate::core::collapsible::Collapsible;
use crate::core::editor;
use crate::core::loader::load_tree;
use crate::core::path;
use crate::core::reconcile::{ReconcileReport, Reconciler};
use crate::core::remote::{provider_from_settings, RemoteProvider};
use crate::core::sort::sort_tree;
use crate::core::store::TreeStore;
use crate::core::tree::{FileTree, NodeId, Parent, TreeView};
use crate::settings::{self, keys, SyncSettings};
use crate::{NoteGenError, Result, SortDirection, SortKey, Storage, Workspace};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The open note workspace.
///
/// Owns the settings store, the resolved [`Workspace`], the shared file tree,
/// the expanded-folder set and the optional sync provider. Every setting it
/// changes is persisted before the call returns.
pub struct Notebook {
    storage: Storage,
    app_data_dir: PathBuf,
    workspace: Workspace,
    tree: TreeStore,
    collapsible: Collapsible,
    sort_key: SortKey,
    sort_direction: SortDirection,
    active_file_path: String,
    current_article: Option<Article>,
    provider: Option<Arc<dyn RemoteProvider>>,
}

impl Notebook {
    /// Opens the notebook described by `storage` using the platform app data directory.
    pub fn open(storage: Storage) -> Result<Self> {
        Self::open_with_base(storage, settings::app_data_dir())
    }

    /// Opens the notebook with an explicit app data directory.
    ///
    /// The sync provider is built from the persisted settings; a provider
    /// without credentials leaves the notebook local-only. The tree starts
    /// empty until [`load_local`](Self::load_local) or [`reload`](Self::reload).
    pub fn open_with_base<P: AsRef<Path>>(storage: Storage, app_data_dir: P) -> Result<Self> {
        let app_data_dir = app_data_dir.as_ref().to_path_buf();
        let workspace = Workspace::resolve_with_base(&storage, &app_data_dir)?;
        let sort_key = storage.get(keys::SORT_TYPE)?.unwrap_or_default();
        let sort_direction = storage.get(keys::SORT_DIRECTION)?.unwrap_or_default();
        let active_file_path = storage.get(keys::ACTIVE_FILE_PATH)?.unwrap_or_default();
        let collapsible = Collapsible::load(&storage, None)?;

        let provider = match provider_from_settings(&SyncSettings::load(&storage)?) {
            Ok(provider) => Some(provider),
            Err(NoteGenError::NotConfigured(reason)) => {
                log::info!("remote sync disabled: {reason}");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            storage,
            app_data_dir,
            workspace,
            tree: TreeStore::default(),
            collapsible,
            sort_key,
            sort_direction,
            active_file_path,
            current_article: None,
            provider,
        })
    }

    /// Replaces the sync provider.
    #[must_use]
    pub fn with_provider(mut self, provider: Option<Arc<dyn RemoteProvider>>) -> Self {
        self.provider = provider;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The shared tree, for callers that run their own reconciliation.
    pub fn tree_store(&self) -> &TreeStore {
        &self.tree
    }

    /// A detached copy of the current tree.
    pub fn tree(&self) -> FileTree {
        self.tree.snapshot()
    }

    /// The current tree as nested, serializable nodes.
    pub fn view(&self) -> Vec<TreeView> {
        self.tree.snapshot().to_view()
    }

    pub fn collapsible(&self) -> &Collapsible {
        &self.collapsible
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn active_file_path(&self) -> &str {
        &self.active_file_path
    }

    pub fn current_article(&self) -> Option<&Article> {
        self.current_article.as_ref()
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    // ── Loading ───────────────────────────────────────────────────

    /// Reads the workspace from disk, sorts it and replaces the shared tree.
    ///
    /// Expanded paths that now resolve to files are dropped.
    pub fn load_local(&mut self) -> Result<()> {
        let tree = load_tree(&self.workspace)?;
        let tree = sort_tree(&tree, self.sort_key, self.sort_direction);
        self.collapsible = Collapsible::load(&self.storage, Some(&tree))?;
        self.tree.replace(tree);
        Ok(())
    }

    /// Merges remote metadata for the root and every expanded folder.
    ///
    /// Does nothing when no provider is configured.
    pub async fn sync_remote_metadata(&self) -> ReconcileReport {
        let Some(reconciler) = self.reconciler() else {
            log::debug!("no sync provider; skipping remote reconciliation");
            return ReconcileReport::default();
        };
        let mut paths = vec![String::new()];
        paths.extend(self.collapsible.paths().iter().cloned());
        reconciler.reconcile_all(paths).await
    }

    /// Reloads from disk, then merges remote metadata.
    pub async fn reload(&mut self) -> Result<ReconcileReport> {
        self.load_local()?;
        Ok(self.sync_remote_metadata().await)
    }

    fn reconciler(&self) -> Option<Reconciler> {
        self.provider
            .as_ref()
            .map(|p| Reconciler::new(Arc::clone(p), self.tree.clone()))
    }

    // ── Sorting ───────────────────────────────────────────────────

    pub fn set_sort_key(&mut self, key: SortKey) -> Result<()> {
        self.storage.set(keys::SORT_TYPE, &key)?;
        self.sort_key = key;
        self.resort();
        Ok(())
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) -> Result<()> {
        self.storage.set(keys::SORT_DIRECTION, &direction)?;
        self.sort_direction = direction;
        self.resort();
        Ok(())
    }

    fn resort(&self) {
        let (key, direction) = (self.sort_key, self.sort_direction);
        self.tree.update(|t| *t = sort_tree(t, key, direction));
    }

    // ── Expanded folders ──────────────────────────────────────────

    /// Expands or collapses `folder_path`.
    ///
    /// Expanding a folder that was not expanded fetches its remote listing; a
    /// failed fetch is logged and the folder keeps its local-only state.
    ///
    /// # Errors
    ///
    /// Returns [`NoteGenError::InvalidPath`] when expanding a path that is not
    /// a folder in the current tree.
    pub async fn set_expanded(&mut self, folder_path: &str, expanded: bool) -> Result<()> {
        if !expanded {
            if self.collapsible.remove(folder_path) {
                self.collapsible.persist(&self.storage)?;
            }
            return Ok(());
        }

        let is_folder = self
            .tree
            .update(|t| matches!(t.folder(folder_path), Some(Parent::Node(_))));
        if !is_folder {
            return Err(NoteGenError::InvalidPath(format!("{folder_path} is not a folder")));
        }
        if !self.collapsible.insert(folder_path.to_string()) {
            return Ok(());
        }
        self.collapsible.persist(&self.storage)?;
        if let Some(reconciler) = self.reconciler() {
            if let Err(e) = reconciler.reconcile_path(folder_path).await {
                log::warn!("remote listing for '{folder_path}' failed: {e}");
            }
        }
        Ok(())
    }

    /// Expands every folder in the tree and fetches each one's remote listing.
    pub async fn expand_all(&mut self) -> Result<ReconcileReport> {
        let folders = self.tree.snapshot().folder_paths();
        self.collapsible.replace_all(folders.clone());
        self.collapsible.persist(&self.storage)?;
        Ok(match self.reconciler() {
            Some(reconciler) => reconciler.reconcile_all(folders).await,
            None => ReconcileReport::default(),
        })
    }

    /// Collapses every folder. Tree data is left intact.
    pub fn collapse_all(&mut self) -> Result<()> {
        self.collapsible.clear();
        self.collapsible.persist(&self.storage)
    }

    /// Collapses everything if any folder is expanded, otherwise expands everything.
    pub async fn toggle_all(&mut self) -> Result<()> {
        if self.collapsible.is_empty() {
            self.expand_all().await?;
        } else {
            self.collapse_all()?;
        }
        Ok(())
    }

    // ── Workspace switching ───────────────────────────────────────

    /// Switches to the custom workspace at `path` and reloads.
    pub async fn set_custom_path<P: AsRef<Path>>(&mut self, path: P) -> Result<ReconcileReport> {
        let workspace = Workspace::persist_custom(&self.storage, path)?;
        self.switch_to(workspace).await
    }

    /// Switches back to the application-managed workspace and reloads.
    pub async fn reset_to_default(&mut self) -> Result<ReconcileReport> {
        Workspace::persist_default(&self.storage)?;
        let workspace = Workspace::managed(&self.app_data_dir);
        self.switch_to(workspace).await
    }

    async fn switch_to(&mut self, workspace: Workspace) -> Result<ReconcileReport> {
        log::info!("switching workspace to {}", workspace.path().display());
        self.workspace = workspace;
        self.collapse_all()?;
        self.set_active_file_path("")?;
        self.current_article = None;
        self.tree.replace(FileTree::new());
        self.reload().await
    }

    // ── Active file ───────────────────────────────────────────────

    pub fn set_active_file_path(&mut self, rel_path: &str) -> Result<()> {
        self.storage.set(keys::ACTIVE_FILE_PATH, rel_path)?;
        self.active_file_path = rel_path.to_string();
        Ok(())
    }

    /// The folder new files go into: the active path itself when it names a
    /// folder, otherwise its parent.
    fn active_folder(&self) -> String {
        let tree = self.tree.snapshot();
        let is_folder = tree
            .find(&self.active_file_path)
            .and_then(|id| tree.get(id))
            .is_some_and(|n| n.is_directory);
        if is_folder {
            self.active_file_path.clone()
        } else {
            path::parent(&self.active_file_path).to_string()
        }
    }

    // ── Editing ───────────────────────────────────────────────────

    /// Starts creating a folder inside `folder_path`.
    pub fn new_folder(&self, folder_path: &str) -> Result<Option<NodeId>> {
        self.tree
            .update(|t| editor::new_placeholder(t, folder_path, true))
    }

    /// Starts creating a file inside `folder_path`.
    pub fn new_file(&self, folder_path: &str) -> Result<Option<NodeId>> {
        self.tree
            .update(|t| editor::new_placeholder(t, folder_path, false))
    }

    /// Starts creating a file next to the active file and expands its folder.
    pub fn new_file_in_active_folder(&mut self) -> Result<Option<NodeId>> {
        let folder = self.active_folder();
        let id = self.new_file(&folder)?;
        if !folder.is_empty() && self.collapsible.insert(folder) {
            self.collapsible.persist(&self.storage)?;
        }
        Ok(id)
    }

    /// Creates an empty, timestamp-named file in `folder_path` and makes it active.
    pub fn create_file_in_folder(&mut self, folder_path: &str) -> Result<String> {
        let rel = self
            .tree
            .update(|t| editor::create_file_in_folder(&self.workspace, t, folder_path))?;
        self.set_active_file_path(&rel)?;
        Ok(rel)
    }

    /// Names the pending folder in `folder_path` and creates it on disk.
    pub fn commit_folder(&self, folder_path: &str, name: &str) -> Result<Option<String>> {
        self.tree
            .update(|t| editor::commit_create(&self.workspace, t, folder_path, name, true))
    }

    /// Names the pending file in `folder_path` and creates it on disk.
    pub fn commit_file(&self, folder_path: &str, name: &str) -> Result<Option<String>> {
        self.tree
            .update(|t| editor::commit_create(&self.workspace, t, folder_path, name, false))
    }

    /// Drops the pending create in `folder_path`.
    pub fn cancel_create(&self, folder_path: &str) -> bool {
        self.tree.update(|t| editor::cancel_create(t, folder_path))
    }

    /// Renames an entry, carrying the expanded state and active path along.
    pub fn rename(&mut self, rel_path: &str, new_name: &str) -> Result<String> {
        let new_rel = self
            .tree
            .update(|t| editor::rename(&self.workspace, t, rel_path, new_name))?;
        if new_rel == rel_path {
            return Ok(new_rel);
        }

        self.collapsible.rename_prefix(rel_path, &new_rel);
        self.collapsible.persist(&self.storage)?;
        if let Some(rest) = under(&self.active_file_path, rel_path) {
            let active = if rest.is_empty() {
                new_rel.clone()
            } else {
                path::join(&new_rel, rest)
            };
            self.set_active_file_path(&active)?;
        }
        Ok(new_rel)
    }

    /// Deletes an entry from disk and the tree.
    ///
    /// Clears the active path and the open article if they were inside it.
    pub fn delete(&mut self, rel_path: &str) -> Result<usize> {
        let removed = self
            .tree
            .update(|t| editor::delete(&self.workspace, t, rel_path))?;
        self.collapsible.remove_prefix(rel_path);
        self.collapsible.persist(&self.storage)?;
        if under(&self.active_file_path, rel_path).is_some() {
            self.set_active_file_path("")?;
            self.current_article = None;
        }
        Ok(removed)
    }

    // ── Articles ──────────────────────────────────────────────────

    /// Reads an article, makes it active and keeps it as the current article.
    pub async fn open_article(&mut self, rel_path: &str) -> Result<&Article> {
        let article =
            article::read_article(&self.workspace, self.provider.as_deref(), rel_path).await?;
        self.set_active_file_path(rel_path)?;
        Ok(self.current_article.insert(article))
    }

    /// Writes the current article's new content to disk.
    ///
    /// Returns `Ok(false)` when there is no current article or `content` is empty.
    pub fn save_current_article(&mut self, content: &str) -> Result<bool> {
        let Some(current) = self.current_article.as_mut() else {
            return Ok(false);
        };
        let saved = article::save_article(&self.workspace, &self.tree, &current.path, content)?;
        if saved {
            current.content = content.to_string();
        }
        Ok(saved)
    }

    /// Downloads a remote-only article into the workspace.
    pub async fn pull_article(&self, rel_path: &str) -> Result<Article> {
        let provider = self.require_provider()?;
        article::pull_article(&self.workspace, provider, &self.tree, rel_path).await
    }

    /// Uploads an article and returns its new remote revision.
    pub async fn push_article(&self, rel_path: &str, message: &str) -> Result<String> {
        let provider = self.require_provider()?;
        article::push_article(&self.workspace, provider, &self.tree, rel_path, message).await
    }

    pub fn load_all_articles(&self) -> Result<Vec<Article>> {
        article::load_all_articles(&self.workspace)
    }

    pub fn collect_markdown_files(&self, folder_path: &str) -> Result<Vec<MarkdownFile>> {
        article::collect_markdown_files(&self.workspace, folder_path)
    }

    fn require_provider(&self) -> Result<&dyn RemoteProvider> {
        self.provider
            .as_deref()
            .ok_or_else(|| NoteGenError::NotConfigured("no sync provider".to_string()))
    }
}

/// Returns the part of `path` below `ancestor` (`""` when equal), or `None`
/// when `path` is not inside `ancestor`.
fn under<'a>(path: &'a str, ancestor: &str) -> Option<&'a str> {
    if path == ancestor {
        return Some("");
    }
    path.strip_prefix(ancestor)?.strip_prefix('/')
}
