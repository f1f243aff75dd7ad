//! SQLite-backed key-value store for persisted application state.
//!
//! Every value is stored as a JSON document under a string key and is always
//! read and written whole; there is no partial-update primitive.

use crate::{NoteGenError, Result};
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    /// Creates a new store at `path`, initialising the schema.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Opens an existing store and validates its structure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = 'settings'",
            [],
            |row| row.get(0),
        )?;

        if table_count != 1 {
            return Err(NoteGenError::InvalidPath(
                "Not a valid NoteGen settings store".to_string(),
            ));
        }

        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Opens the store at `path`, creating the file and schema if needed.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::create(path)
    }

    /// Opens a throwaway store that lives only as long as this value.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Reads and deserializes the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key has never been written.
    ///
    /// # Errors
    ///
    /// Returns [`NoteGenError::Json`] if the stored document does not match `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self
            .connection()
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Serializes `value` and stores it under `key`, replacing any previous value.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.connection().execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, json],
        )?;
        Ok(())
    }

    /// Deletes the value stored under `key`, if any.
    pub fn remove(&self, key: &str) -> Result<()> {
        self.connection()
            .execute("DELETE FROM settings WHERE key = ?", [key])?;
        Ok(())
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_create_storage() {
        let temp = NamedTempFile::new().unwrap();
        let storage = Storage::create(temp.path()).unwrap();
        storage.set("sortType", "name").unwrap();
        assert_eq!(storage.get::<String>("sortType").unwrap().as_deref(), Some("name"));
    }

    #[test]
    fn test_open_existing_storage() {
        let temp = NamedTempFile::new().unwrap();
        {
            let storage = Storage::create(temp.path()).unwrap();
            storage.set("collapsibleList", &vec!["notes", "notes/daily"]).unwrap();
        }

        let storage = Storage::open(temp.path()).unwrap();
        let list: Vec<String> = storage.get("collapsibleList").unwrap().unwrap();
        assert_eq!(list, vec!["notes", "notes/daily"]);
    }

    #[test]
    fn test_open_invalid_database() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "not a database").unwrap();

        let result = Storage::open(temp.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_key_returns_none() {
        let storage = Storage::open_in_memory().unwrap();
        assert!(storage.get::<String>("activeFilePath").unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites_whole_value() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set("collapsibleList", &vec!["a", "b"]).unwrap();
        storage.set("collapsibleList", &vec!["c"]).unwrap();
        let list: Vec<String> = storage.get("collapsibleList").unwrap().unwrap();
        assert_eq!(list, vec!["c"]);
    }

    #[test]
    fn test_remove_key() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set("workspacePath", "/tmp/notes").unwrap();
        storage.remove("workspacePath").unwrap();
        assert!(storage.get::<String>("workspacePath").unwrap().is_none());
    }

    #[test]
    fn test_type_mismatch_is_json_error() {
        let storage = Storage::open_in_memory().unwrap();
        storage.set("sortType", "name").unwrap();
        let result = storage.get::<Vec<String>>("sortType");
        assert!(matches!(result, Err(NoteGenError::Json(_))));
    }

    #[test]
    fn test_open_or_create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.db");
        let storage = Storage::open_or_create(&path).unwrap();
        storage.set("html2md", &true).unwrap();
        assert!(path.exists());
    }
}
