//! GitLab repository API (v4), for gitlab.com, JihuLab or a self-hosted instance.

use super::{build_url, error_for_status, RemoteEntry, RemoteEntryKind, RemoteFile, RemoteProvider};
use crate::core::path;
use crate::settings::SyncSettings;
use crate::{NoteGenError, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Deserialize, Serialize};

const DEFAULT_BRANCH: &str = "main";
const TREE_PAGE_SIZE: &str = "100";
const NEXT_PAGE_HEADER: &str = "x-next-page";

#[derive(Debug, Clone, Deserialize)]
pub struct TreeItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
}

impl From<TreeItem> for RemoteEntry {
    fn from(item: TreeItem) -> Self {
        RemoteEntry {
            kind: if item.kind == "tree" {
                RemoteEntryKind::Dir
            } else {
                RemoteEntryKind::File
            },
            name: item.name,
            path: item.path,
            revision: item.id,
        }
    }
}

/// The page GitLab reports after `current`; `None` on the last page.
fn next_page(headers: &HeaderMap, current: u32) -> Option<u32> {
    headers
        .get(NEXT_PAGE_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
        .filter(|next| *next > current)
}

/// Appends one page of a tree listing to the entries collected so far.
fn merge_page(entries: &mut Vec<RemoteEntry>, items: Vec<TreeItem>) {
    entries.extend(items.into_iter().map(RemoteEntry::from));
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileResponse {
    pub content: String,
    pub blob_id: String,
}

#[derive(Debug, Serialize)]
struct WriteFileRequest<'a> {
    branch: &'a str,
    content: &'a str,
    encoding: &'a str,
    commit_message: &'a str,
}

#[derive(Clone)]
pub struct GitlabProvider {
    client: Client,
    token: String,
    base_url: String,
    /// Numeric project id or `namespace/project`.
    project: String,
    branch: String,
}

impl GitlabProvider {
    pub fn new(token: &str, base_url: &str, project: &str) -> Self {
        Self {
            client: Client::new(),
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            project: project.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }

    /// Builds a client from the GitLab fields of `settings`.
    ///
    /// The project is `gitlabProjectId` when set, otherwise `username/repo`.
    ///
    /// # Errors
    ///
    /// Returns [`NoteGenError::NotConfigured`] if neither a project id nor a
    /// username is available, or if a self-hosted instance has no URL.
    pub fn from_settings(settings: &SyncSettings) -> Result<Self> {
        let base = settings
            .gitlab_instance_type
            .base_url(&settings.gitlab_custom_url);
        if base.is_empty() {
            return Err(NoteGenError::NotConfigured(
                "self-hosted GitLab URL is empty".to_string(),
            ));
        }
        let project = if !settings.gitlab_project_id.is_empty() {
            settings.gitlab_project_id.clone()
        } else if !settings.gitlab_username.is_empty() {
            format!("{}/{}", settings.gitlab_username, settings.repo_name)
        } else {
            return Err(NoteGenError::NotConfigured(
                "GitLab project is unknown".to_string(),
            ));
        };
        Ok(Self::new(&settings.gitlab_access_token, &base, &project))
    }

    fn project_url(&self, tail: &[&str]) -> Result<Url> {
        let api = format!("{}/api/v4", self.base_url);
        let segments = ["projects", self.project.as_str()]
            .into_iter()
            .chain(tail.iter().copied());
        build_url(&api, segments)
    }

    /// URL of the tree endpoint; the folder goes in the query string.
    pub fn tree_url(&self) -> Result<Url> {
        self.project_url(&["repository", "tree"])
    }

    /// URL of the file endpoint; `rel_path` is encoded as a single segment.
    pub fn file_url(&self, rel_path: &str) -> Result<Url> {
        let joined = path::components(rel_path).collect::<Vec<_>>().join("/");
        self.project_url(&["repository", "files", &joined])
    }

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("PRIVATE-TOKEN", &self.token)
    }
}

#[async_trait]
impl RemoteProvider for GitlabProvider {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        let mut entries = Vec::new();
        let mut page = Some(1_u32);
        while let Some(current) = page {
            let url = self.tree_url()?;
            let resp = self
                .request(Method::GET, url)
                .query(&[
                    ("path", path),
                    ("ref", self.branch.as_str()),
                    ("per_page", TREE_PAGE_SIZE),
                ])
                .query(&[("page", current)])
                .send()
                .await?;
            if resp.status() == StatusCode::NOT_FOUND {
                break;
            }
            let resp = error_for_status(resp).await?;
            page = next_page(resp.headers(), current);
            let items: Vec<TreeItem> = resp.json().await?;
            merge_page(&mut entries, items);
        }
        Ok(entries)
    }

    async fn get_file_content(&self, path: &str) -> Result<RemoteFile> {
        let url = self.file_url(path)?;
        let resp = self
            .request(Method::GET, url)
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await?;
        let file: FileResponse = error_for_status(resp).await?.json().await?;
        Ok(RemoteFile {
            content_base64: file.content,
            revision: file.blob_id,
        })
    }

    async fn put_file(
        &self,
        path: &str,
        content_base64: &str,
        previous_revision: Option<&str>,
        message: &str,
    ) -> Result<String> {
        let url = self.file_url(path)?;
        let method = if previous_revision.is_some() {
            Method::PUT
        } else {
            Method::POST
        };
        let body = WriteFileRequest {
            branch: &self.branch,
            content: content_base64,
            encoding: "base64",
            commit_message: message,
        };
        let resp = self.request(method, url).json(&body).send().await?;
        error_for_status(resp).await?;

        // The write response carries no blob id; read it back.
        Ok(self.get_file_content(path).await?.revision)
    }
}
