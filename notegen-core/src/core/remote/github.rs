//! GitHub repository contents API.

use super::{build_url, error_for_status, RemoteEntry, RemoteEntryKind, RemoteFile, RemoteProvider};
use crate::core::path;
use crate::{NoteGenError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

const GITHUB_API_BASE: &str = "https://api.github.com";

/// Item of a GitHub (and Gitee) contents response.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentItem {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl From<ContentItem> for RemoteEntry {
    fn from(item: ContentItem) -> Self {
        RemoteEntry {
            kind: if item.kind == "dir" {
                RemoteEntryKind::Dir
            } else {
                RemoteEntryKind::File
            },
            name: item.name,
            path: item.path,
            revision: item.sha,
        }
    }
}

/// A contents endpoint answers with an array for folders and an object for files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ContentsResponse {
    Listing(Vec<ContentItem>),
    Single(ContentItem),
}

impl ContentsResponse {
    /// The folder listing, or empty when `path` named a file.
    #[must_use]
    pub fn into_entries(self) -> Vec<RemoteEntry> {
        match self {
            Self::Listing(items) => items.into_iter().map(RemoteEntry::from).collect(),
            Self::Single(_) => Vec::new(),
        }
    }

    /// The file content, or an error when `path` named a folder.
    pub fn into_file(self, requested: &str) -> Result<RemoteFile> {
        match self {
            Self::Single(ContentItem {
                content: Some(content),
                sha,
                ..
            }) => Ok(RemoteFile {
                content_base64: content,
                revision: sha,
            }),
            _ => Err(NoteGenError::Remote {
                status: 422,
                message: format!("{requested} is not a file"),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct PutFileRequest<'a> {
    message: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct PutFileResponse {
    pub content: PutFileContent,
}

#[derive(Debug, Deserialize)]
pub struct PutFileContent {
    pub sha: String,
}

/// Client for `https://api.github.com/repos/{owner}/{repo}/contents`.
#[derive(Clone)]
pub struct GithubProvider {
    client: Client,
    token: String,
    owner: String,
    repo: String,
}

impl GithubProvider {
    pub fn new(token: &str, owner: &str, repo: &str) -> Self {
        Self {
            client: Client::new(),
            token: token.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }

    /// URL of the contents endpoint for `rel_path`.
    pub fn contents_url(&self, rel_path: &str) -> Result<Url> {
        let segments = ["repos", self.owner.as_str(), self.repo.as_str(), "contents"]
            .into_iter()
            .chain(path::components(rel_path));
        build_url(GITHUB_API_BASE, segments)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, "notegen")
    }
}

#[async_trait]
impl RemoteProvider for GithubProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        let url = self.contents_url(path)?;
        let resp = self.request(reqwest::Method::GET, url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let body: ContentsResponse = error_for_status(resp).await?.json().await?;
        Ok(body.into_entries())
    }

    async fn get_file_content(&self, path: &str) -> Result<RemoteFile> {
        let url = self.contents_url(path)?;
        let resp = self.request(reqwest::Method::GET, url).send().await?;
        let body: ContentsResponse = error_for_status(resp).await?.json().await?;
        body.into_file(path)
    }

    async fn put_file(
        &self,
        path: &str,
        content_base64: &str,
        previous_revision: Option<&str>,
        message: &str,
    ) -> Result<String> {
        let url = self.contents_url(path)?;
        let body = PutFileRequest {
            message,
            content: content_base64,
            sha: previous_revision,
        };
        let resp = self
            .request(reqwest::Method::PUT, url)
            .json(&body)
            .send()
            .await?;
        let parsed: PutFileResponse = error_for_status(resp).await?.json().await?;
        Ok(parsed.content.sha)
    }
}
