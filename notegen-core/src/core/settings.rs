//! Persisted preferences and their on-disk locations.
//!
//! Values live in the key-value [`Storage`]; this module names the keys,
//! defines the typed values stored under them, and locates the store file at
//! an OS-appropriate path.

use crate::{Result, Storage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Keys used in the settings store.
pub mod keys {
    pub const WORKSPACE_PATH: &str = "workspacePath";
    pub const COLLAPSIBLE_LIST: &str = "collapsibleList";
    pub const ACTIVE_FILE_PATH: &str = "activeFilePath";
    pub const SORT_TYPE: &str = "sortType";
    pub const SORT_DIRECTION: &str = "sortDirection";
    pub const PRIMARY_BACKUP_METHOD: &str = "primaryBackupMethod";
    pub const SYNC_REPO_NAME: &str = "syncRepoName";
    pub const GITHUB_ACCESS_TOKEN: &str = "accessToken";
    pub const GITHUB_USERNAME: &str = "githubUsername";
    pub const GITEE_ACCESS_TOKEN: &str = "giteeAccessToken";
    pub const GITEE_USERNAME: &str = "giteeUsername";
    pub const GITLAB_ACCESS_TOKEN: &str = "gitlabAccessToken";
    pub const GITLAB_INSTANCE_TYPE: &str = "gitlabInstanceType";
    pub const GITLAB_CUSTOM_URL: &str = "gitlabCustomUrl";
    pub const GITLAB_PROJECT_ID: &str = "gitlabProjectId";
    pub const GITLAB_USERNAME: &str = "gitlabUsername";
}

/// Repository used for note sync when none is configured.
pub const DEFAULT_SYNC_REPO: &str = "notegen-sync";

/// Field a file tree is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Keep the order entries were loaded in.
    #[default]
    None,
    Name,
    Created,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// The git hosting provider notes are backed up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupMethod {
    #[default]
    Github,
    Gitee,
    Gitlab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GitlabInstanceType {
    /// gitlab.com
    #[default]
    Official,
    /// jihulab.com
    Jihulab,
    /// Self-hosted instance at `gitlabCustomUrl`.
    SelfHosted,
}

impl GitlabInstanceType {
    /// Returns the base URL of this instance, using `custom_url` for self-hosted ones.
    #[must_use]
    pub fn base_url(&self, custom_url: &str) -> String {
        match self {
            Self::Official => "https://gitlab.com".to_string(),
            Self::Jihulab => "https://jihulab.com".to_string(),
            Self::SelfHosted => custom_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Credentials and repository details for the configured sync providers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    pub primary_backup_method: BackupMethod,
    pub repo_name: String,
    pub github_access_token: String,
    pub github_username: String,
    pub gitee_access_token: String,
    pub gitee_username: String,
    pub gitlab_access_token: String,
    pub gitlab_instance_type: GitlabInstanceType,
    pub gitlab_custom_url: String,
    pub gitlab_project_id: String,
    pub gitlab_username: String,
}

impl SyncSettings {
    /// Reads every sync-related key from `store`, falling back to defaults for missing ones.
    pub fn load(store: &Storage) -> Result<Self> {
        Ok(Self {
            primary_backup_method: store
                .get(keys::PRIMARY_BACKUP_METHOD)?
                .unwrap_or_default(),
            repo_name: store
                .get(keys::SYNC_REPO_NAME)?
                .unwrap_or_else(|| DEFAULT_SYNC_REPO.to_string()),
            github_access_token: store.get(keys::GITHUB_ACCESS_TOKEN)?.unwrap_or_default(),
            github_username: store.get(keys::GITHUB_USERNAME)?.unwrap_or_default(),
            gitee_access_token: store.get(keys::GITEE_ACCESS_TOKEN)?.unwrap_or_default(),
            gitee_username: store.get(keys::GITEE_USERNAME)?.unwrap_or_default(),
            gitlab_access_token: store.get(keys::GITLAB_ACCESS_TOKEN)?.unwrap_or_default(),
            gitlab_instance_type: store.get(keys::GITLAB_INSTANCE_TYPE)?.unwrap_or_default(),
            gitlab_custom_url: store.get(keys::GITLAB_CUSTOM_URL)?.unwrap_or_default(),
            gitlab_project_id: store.get(keys::GITLAB_PROJECT_ID)?.unwrap_or_default(),
            gitlab_username: store.get(keys::GITLAB_USERNAME)?.unwrap_or_default(),
        })
    }

    /// Returns the access token of the primary backup method.
    #[must_use]
    pub fn active_token(&self) -> &str {
        match self.primary_backup_method {
            BackupMethod::Github => &self.github_access_token,
            BackupMethod::Gitee => &self.gitee_access_token,
            BackupMethod::Gitlab => &self.gitlab_access_token,
        }
    }
}

/// Returns the path to the settings store file.
///
/// - macOS / Linux: `~/.config/notegen/store.db`
/// - Windows: `%APPDATA%/NoteGen/store.db`
pub fn settings_file_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("NoteGen").join("store.db")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("notegen").join("store.db")
    }
}

/// Returns the application-managed data directory, e.g. `~/.local/share/notegen`.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
        })
        .join("notegen")
}

/// Opens the settings store at [`settings_file_path`], creating it if needed.
pub fn open_settings_store() -> Result<Storage> {
    Storage::open_or_create(settings_file_path())
}
