//! Gitee repository contents API (v5).
//!
//! Response payloads match GitHub's, so the GitHub payload types are reused.
//! Authentication is a query parameter, and creating a file is a `POST`
//! whereas updating one is a `PUT` carrying the previous `sha`.

use super::github::{ContentsResponse, PutFileResponse};
use super::{build_url, error_for_status, RemoteEntry, RemoteFile, RemoteProvider};
use crate::core::path;
use crate::Result;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;

const GITEE_API_BASE: &str = "https://gitee.com/api/v5";

#[derive(Debug, Serialize)]
struct WriteFileRequest<'a> {
    access_token: &'a str,
    content: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Clone)]
pub struct GiteeProvider {
    client: Client,
    token: String,
    owner: String,
    repo: String,
}

impl GiteeProvider {
    pub fn new(token: &str, owner: &str, repo: &str) -> Self {
        Self {
            client: Client::new(),
            token: token.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }

    pub fn contents_url(&self, rel_path: &str) -> Result<Url> {
        let segments = ["repos", self.owner.as_str(), self.repo.as_str(), "contents"]
            .into_iter()
            .chain(path::components(rel_path));
        build_url(GITEE_API_BASE, segments)
    }

    async fn fetch(&self, rel_path: &str) -> Result<reqwest::Response> {
        let url = self.contents_url(rel_path)?;
        Ok(self
            .client
            .get(url)
            .query(&[("access_token", self.token.as_str())])
            .send()
            .await?)
    }
}

#[async_trait]
impl RemoteProvider for GiteeProvider {
    fn name(&self) -> &'static str {
        "gitee"
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>> {
        let resp = self.fetch(path).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let body: ContentsResponse = error_for_status(resp).await?.json().await?;
        Ok(body.into_entries())
    }

    async fn get_file_content(&self, path: &str) -> Result<RemoteFile> {
        let resp = self.fetch(path).await?;
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
        let method = if previous_revision.is_some() {
            Method::PUT
        } else {
            Method::POST
        };
        let body = WriteFileRequest {
            access_token: &self.token,
            content: content_base64,
            message,
            sha: previous_revision,
        };
        let resp = self.client.request(method, url).json(&body).send().await?;
        let parsed: PutFileResponse = error_for_status(resp).await?.json().await?;
        Ok(parsed.content.sha)
    }
}
