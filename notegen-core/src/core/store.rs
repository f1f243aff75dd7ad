//! Shared holder for the current [`FileTree`].

use crate::core::tree::FileTree;
use std::sync::{Arc, Mutex, MutexGuard};

/// The single shared, mutable file tree.
///
/// Readers take a [`snapshot`](Self::snapshot). Writers either replace the
/// whole tree, in which case two writers working from the same snapshot
/// overwrite each other, or apply a closure with [`update`](Self::update),
/// which runs against whatever tree is current at that moment.
#[derive(Clone, Default)]
pub struct TreeStore {
    inner: Arc<Mutex<FileTree>>,
}

impl TreeStore {
    #[must_use]
    pub fn new(tree: FileTree) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tree)),
        }
    }

    /// Returns an independent copy of the current tree.
    #[must_use]
    pub fn snapshot(&self) -> FileTree {
        self.lock().clone()
    }

    /// Replaces the current tree.
    pub fn replace(&self, tree: FileTree) {
        *self.lock() = tree;
    }

    /// Applies `f` to the current tree in place.
    pub fn update<R>(&self, f: impl FnOnce(&mut FileTree) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, FileTree> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
