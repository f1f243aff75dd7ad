//! In-memory [`RemoteProvider`] for tests.

use super::{encode_content, RemoteEntry, RemoteEntryKind, RemoteFile, RemoteProvider};
use crate::core::path;
use crate::{NoteGenError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct MockProvider {
    listings: Mutex<HashMap<String, Vec<RemoteEntry>>>,
    files: Mutex<HashMap<String, RemoteFile>>,
    failing: Mutex<HashSet<String>>,
    pub(crate) list_calls: Mutex<Vec<String>>,
    pub(crate) puts: Mutex<Vec<(String, String, Option<String>)>>,
}

impl MockProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds an entry to the listing of its parent folder.
    pub(crate) fn with_entry(self, rel_path: &str, kind: RemoteEntryKind, revision: &str) -> Self {
        let entry = RemoteEntry {
            name: path::file_name(rel_path).to_string(),
            path: rel_path.to_string(),
            kind,
            revision: revision.to_string(),
        };
        self.listings
            .lock()
            .unwrap()
            .entry(path::parent(rel_path).to_string())
            .or_default()
            .push(entry);
        self
    }

    /// Adds a file with content, also listing it under its parent folder.
    pub(crate) fn with_file(self, rel_path: &str, content: &str, revision: &str) -> Self {
        self.files.lock().unwrap().insert(
            rel_path.to_string(),
            RemoteFile {
                content_base64: encode_content(content),
                revision: revision.to_string(),
            },
        );
        self.with_entry(rel_path, RemoteEntryKind::File, revision)
    }

    /// Makes every request for `rel_path` fail.
    pub(crate) fn failing_on(self, rel_path: &str) -> Self {
        self.failing.lock().unwrap().insert(rel_path.to_string());
        self
    }

    fn check_failure(&self, rel_path: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(rel_path) {
            return Err(NoteGenError::Remote {
                status: 500,
                message: format!("mock failure for {rel_path}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_directory(&self, rel_path: &str) -> Result<Vec<RemoteEntry>> {
        self.list_calls.lock().unwrap().push(rel_path.to_string());
        self.check_failure(rel_path)?;
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(rel_path)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_file_content(&self, rel_path: &str) -> Result<RemoteFile> {
        self.check_failure(rel_path)?;
        self.files
            .lock()
            .unwrap()
            .get(rel_path)
            .cloned()
            .ok_or_else(|| NoteGenError::Remote {
                status: 404,
                message: format!("{rel_path} not found"),
            })
    }

    async fn put_file(
        &self,
        rel_path: &str,
        content_base64: &str,
        previous_revision: Option<&str>,
        _message: &str,
    ) -> Result<String> {
        self.check_failure(rel_path)?;
        let mut puts = self.puts.lock().unwrap();
        puts.push((
            rel_path.to_string(),
            content_base64.to_string(),
            previous_revision.map(str::to_string),
        ));
        let revision = format!("rev-{}", puts.len());
        self.files.lock().unwrap().insert(
            rel_path.to_string(),
            RemoteFile {
                content_base64: content_base64.to_string(),
                revision: revision.clone(),
            },
        );
        Ok(revision)
    }
}
