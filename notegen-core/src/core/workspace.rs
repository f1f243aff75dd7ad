//! Resolution of the directory that holds a user's notes.

use crate::core::path;
use crate::settings::{self, keys};
use crate::{NoteGenError, Result, Storage};
use std::path::{Component, Path, PathBuf};

/// Name of the notes folder inside the application data directory.
pub const MANAGED_DIR_NAME: &str = "article";

/// The storage root for notes.
///
/// A workspace is either a custom directory picked by the user or the
/// application-managed `article` folder inside the app data directory. Either
/// way, every file operation addresses entries by a workspace-relative path
/// and goes through [`Workspace::abs_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    path: PathBuf,
    is_custom: bool,
}

impl Workspace {
    /// A workspace rooted at a user-chosen absolute directory.
    #[must_use]
    pub fn custom<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            is_custom: true,
        }
    }

    /// The application-managed workspace inside `app_data_dir`.
    #[must_use]
    pub fn managed<P: AsRef<Path>>(app_data_dir: P) -> Self {
        Self {
            path: app_data_dir.as_ref().join(MANAGED_DIR_NAME),
            is_custom: false,
        }
    }

    /// Reads the persisted `workspacePath`; empty or missing selects the managed workspace.
    pub fn resolve(store: &Storage) -> Result<Self> {
        Self::resolve_with_base(store, settings::app_data_dir())
    }

    /// Like [`resolve`](Self::resolve) with an explicit app data directory.
    pub fn resolve_with_base<P: AsRef<Path>>(store: &Storage, app_data_dir: P) -> Result<Self> {
        let custom: Option<String> = store.get(keys::WORKSPACE_PATH)?;
        Ok(match custom.filter(|p| !p.trim().is_empty()) {
            Some(p) => Self::custom(p),
            None => Self::managed(app_data_dir),
        })
    }

    /// Persists a custom workspace location and returns it.
    pub fn persist_custom<P: AsRef<Path>>(store: &Storage, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(NoteGenError::InvalidPath(format!(
                "workspace path must be absolute: {}",
                path.display()
            )));
        }
        store.set(keys::WORKSPACE_PATH, &path.to_string_lossy())?;
        Ok(Self::custom(path))
    }

    /// Clears the custom location so the managed workspace is used again.
    pub fn persist_default(store: &Storage) -> Result<()> {
        store.set(keys::WORKSPACE_PATH, "")
    }

    /// Absolute path of the workspace root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_custom(&self) -> bool {
        self.is_custom
    }

    /// Creates the workspace root directory if it does not exist yet.
    pub fn ensure_root(&self) -> Result<()> {
        if !self.path.exists() {
            log::info!("creating workspace directory {}", self.path.display());
            std::fs::create_dir_all(&self.path)?;
        }
        Ok(())
    }

    /// Maps a workspace-relative `/`-separated path to an absolute one.
    ///
    /// # Errors
    ///
    /// Returns [`NoteGenError::InvalidPath`] for paths that would escape the
    /// workspace (`..` components).
    pub fn abs_path(&self, rel_path: &str) -> Result<PathBuf> {
        let mut out = self.path.clone();
        for part in path::components(rel_path) {
            if part == ".." || part == "." {
                return Err(NoteGenError::InvalidPath(rel_path.to_string()));
            }
            out.push(part);
        }
        Ok(out)
    }

    /// Maps an absolute path inside the workspace to its relative form.
    pub fn relative_path(&self, abs: &Path) -> Result<String> {
        let rel = abs
            .strip_prefix(&self.path)
            .map_err(|_| NoteGenError::InvalidPath(abs.display().to_string()))?;
        let parts: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Ok(parts.join("/"))
    }
}
