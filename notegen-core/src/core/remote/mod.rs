//! Git-hosting providers that notes are synced to.
//!
//! GitHub, Gitee and GitLab expose equivalent "contents" semantics behind
//! different REST shapes. [`RemoteProvider`] is the single capability
//! interface the rest of the crate uses; [`provider_from_settings`] picks the
//! implementation once, from the persisted primary backup method.

pub mod gitee;
pub mod github;
pub mod gitlab;

#[cfg(test)]
pub(crate) mod mock;

pub use gitee::GiteeProvider;
pub use github::GithubProvider;
pub use gitlab::GitlabProvider;

use crate::settings::{BackupMethod, SyncSettings};
use crate::{NoteGenError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Whether a remote entry is a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteEntryKind {
    File,
    Dir,
}

/// One item of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    /// Repository-relative path of the entry.
    pub path: String,
    pub kind: RemoteEntryKind,
    /// Content hash (git blob or tree SHA).
    pub revision: String,
}

/// A remote file's content as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Base64-encoded content; may contain line breaks.
    pub content_base64: String,
    pub revision: String,
}

impl RemoteFile {
    /// Decodes the content to text.
    pub fn decode(&self) -> Result<String> {
        decode_content(&self.content_base64)
    }
}

/// Contents API of one git-hosting provider.
#[async_trait]
pub trait RemoteProvider: Send + Sync {
    /// Short provider name used in log messages.
    fn name(&self) -> &'static str;

    /// Lists the folder at `path` (`""` for the repository root).
    ///
    /// A folder that does not exist on the remote yields an empty listing.
    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>>;

    /// Fetches a file's content and revision.
    async fn get_file_content(&self, path: &str) -> Result<RemoteFile>;

    /// Creates or updates a file and returns its new revision.
    ///
    /// `previous_revision` must be the current remote revision when updating.
    async fn put_file(
        &self,
        path: &str,
        content_base64: &str,
        previous_revision: Option<&str>,
        message: &str,
    ) -> Result<String>;
}

/// Builds the provider selected by `primary_backup_method`.
///
/// # Errors
///
/// Returns [`NoteGenError::NotConfigured`] if the selected provider has no
/// access token.
pub fn provider_from_settings(settings: &SyncSettings) -> Result<Arc<dyn RemoteProvider>> {
    if settings.active_token().is_empty() {
        return Err(NoteGenError::NotConfigured(format!(
            "no access token for {:?}",
            settings.primary_backup_method
        )));
    }
    let provider: Arc<dyn RemoteProvider> = match settings.primary_backup_method {
        BackupMethod::Github => Arc::new(GithubProvider::new(
            &settings.github_access_token,
            &settings.github_username,
            &settings.repo_name,
        )),
        BackupMethod::Gitee => Arc::new(GiteeProvider::new(
            &settings.gitee_access_token,
            &settings.gitee_username,
            &settings.repo_name,
        )),
        BackupMethod::Gitlab => Arc::new(GitlabProvider::from_settings(settings)?),
    };
    Ok(provider)
}

/// Encodes text content for upload.
#[must_use]
pub fn encode_content(content: &str) -> String {
    STANDARD.encode(content.as_bytes())
}

/// Decodes provider base64 content, ignoring embedded whitespace.
pub fn decode_content(content_base64: &str) -> Result<String> {
    let compact: String = content_base64
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parses `base` and appends each of `segments` as an encoded path segment.
pub(crate) fn build_url<'a, I>(base: &str, segments: I) -> Result<Url>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url =
        Url::parse(base).map_err(|e| NoteGenError::InvalidPath(format!("{base}: {e}")))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| NoteGenError::InvalidPath(base.to_string()))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

/// Converts a non-success response into [`NoteGenError::Remote`].
pub(crate) async fn error_for_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(NoteGenError::Remote {
        status: status.as_u16(),
        message,
    })
}
