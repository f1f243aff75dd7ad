//! Error types for the NoteGen core library.

use thiserror::Error;

/// All errors that can occur within the NoteGen core library.
#[derive(Debug, Error)]
pub enum NoteGenError {
    /// A SQLite operation on the settings store failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value or a provider payload could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The HTTP request to a remote provider could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote provider answered with a non-success status.
    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Remote file content was not valid base64.
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A sibling with the requested name already exists.
    #[error("Name already exists: {0}")]
    NameConflict(String),

    /// No tree node exists at the given workspace-relative path.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// The selected sync provider is missing credentials or repository details.
    #[error("Sync provider not configured: {0}")]
    NotConfigured(String),

    /// A path could not be interpreted relative to the workspace.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Convenience alias that pins the error type to [`NoteGenError`].
pub type Result<T> = std::result::Result<T, NoteGenError>;

impl NoteGenError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => format!("Failed to save settings: {e}"),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
            Self::Http(_) => "Could not reach the sync service".to_string(),
            Self::Remote { status, .. } => format!("Sync service returned an error ({status})"),
            Self::Base64(_) => "Remote file content is corrupt".to_string(),
            Self::NameConflict(_) => "A file or folder with this name already exists".to_string(),
            Self::NodeNotFound(_) => "File no longer exists".to_string(),
            Self::NotConfigured(what) => format!("Sync is not set up: {what}"),
            Self::InvalidPath(p) => format!("Invalid path: {p}"),
        }
    }
}
