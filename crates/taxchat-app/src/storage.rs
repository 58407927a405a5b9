//! Key/value persistence for client state.
//!
//! A single JSON object on disk plays the part browser local storage plays
//! for the web client: the active session id, the recent chats list and the
//! auth token all live here under fixed keys.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Session the chat view resumes on startup
pub const ACTIVE_SESSION_KEY: &str = "tax_reform_active_session";

/// JSON array of recent chats
pub const RECENT_CHATS_KEY: &str = "recent_chats";

/// Bearer token of the logged-in account
pub const AUTH_TOKEN_KEY: &str = "auth_token";

const STORE_FILE: &str = "store.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a valid store file: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("value under '{key}' has an unexpected shape: {source}")]
    Value {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Store shared by the chat and auth controllers
pub type SharedStore = Arc<Mutex<LocalStore>>;

pub struct LocalStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl LocalStore {
    /// Load `<data_dir>/store.json`, starting empty when it does not exist yet
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(data_dir).map_err(|source| StoreError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;

        let path = data_dir.join(STORE_FILE);
        let entries = read_entries(&path)?;
        Ok(Self { path, entries })
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// String value under `key`; non-string values are returned as JSON text
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(key, Some(Value::String(value.to_string())))
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.update(key, None)
    }

    /// Structured value under `key`.
    ///
    /// Accepts both a JSON value and a string holding JSON, which is how the
    /// web client serialized its blobs.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(value) = self.entries.get(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::String(s) => serde_json::from_str(s),
            other => serde_json::from_value(other.clone()),
        };
        parsed
            .map(Some)
            .map_err(|source| StoreError::Value { key: key.to_string(), source })
    }

    pub fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)
            .map_err(|source| StoreError::Value { key: key.to_string(), source })?;
        self.update(key, Some(value))
    }

    /// Apply a single-key change on top of what is currently on disk, so keys
    /// written by another process since `open` are kept.
    fn update(&mut self, key: &str, value: Option<Value>) -> Result<(), StoreError> {
        let mut entries = read_entries(&self.path)?;
        let changed = match value {
            Some(value) => {
                entries.insert(key.to_string(), value);
                true
            }
            None => entries.remove(key).is_some(),
        };
        if changed {
            self.flush(&entries)?;
        }
        self.entries = entries;
        Ok(())
    }

    /// Write through to disk: temp file first, then rename over the old one
    fn flush(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn read_entries(path: &Path) -> Result<Map<String, Value>, StoreError> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let json = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if json.trim().is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str(&json).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_opens_empty() {
        let temp = TempDir::new().unwrap();
        let store = LocalStore::open(temp.path()).unwrap();
        assert_eq!(store.get(ACTIVE_SESSION_KEY), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let mut store = LocalStore::open(temp.path()).unwrap();
            store.set(ACTIVE_SESSION_KEY, "s-1").unwrap();
            store.set_json(RECENT_CHATS_KEY, &vec!["a", "b"]).unwrap();
        }

        let store = LocalStore::open(temp.path()).unwrap();
        assert_eq!(store.get(ACTIVE_SESSION_KEY).as_deref(), Some("s-1"));
        let chats: Vec<String> = store.get_json(RECENT_CHATS_KEY).unwrap().unwrap();
        assert_eq!(chats, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_remove_deletes_key() {
        let temp = TempDir::new().unwrap();
        let mut store = LocalStore::open(temp.path()).unwrap();
        store.set(AUTH_TOKEN_KEY, "tok").unwrap();
        store.remove(AUTH_TOKEN_KEY).unwrap();
        store.remove("never-set").unwrap();

        let reopened = LocalStore::open(temp.path()).unwrap();
        assert_eq!(reopened.get(AUTH_TOKEN_KEY), None);
    }

    #[test]
    fn test_json_encoded_string_blobs_are_read() {
        let temp = TempDir::new().unwrap();
        let mut store = LocalStore::open(temp.path()).unwrap();
        store.set(RECENT_CHATS_KEY, "[1, 2, 3]").unwrap();
        let values: Vec<u32> = store.get_json(RECENT_CHATS_KEY).unwrap().unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_bad_blob_is_a_value_error() {
        let temp = TempDir::new().unwrap();
        let mut store = LocalStore::open(temp.path()).unwrap();
        store.set(RECENT_CHATS_KEY, "not json").unwrap();
        let result: Result<Option<Vec<u32>>, _> = store.get_json(RECENT_CHATS_KEY);
        assert!(matches!(result, Err(StoreError::Value { .. })));
    }

    #[test]
    fn test_writes_from_another_handle_are_kept() {
        let temp = TempDir::new().unwrap();
        let mut repl = LocalStore::open(temp.path()).unwrap();
        let mut login = LocalStore::open(temp.path()).unwrap();

        login.set(AUTH_TOKEN_KEY, "tok-123").unwrap();
        repl.set(ACTIVE_SESSION_KEY, "srv-2").unwrap();
        assert_eq!(repl.get(AUTH_TOKEN_KEY).as_deref(), Some("tok-123"));

        login.remove(ACTIVE_SESSION_KEY).unwrap();
        repl.set_json(RECENT_CHATS_KEY, &vec!["a"]).unwrap();

        let reopened = LocalStore::open(temp.path()).unwrap();
        assert_eq!(reopened.get(AUTH_TOKEN_KEY).as_deref(), Some("tok-123"));
        assert_eq!(reopened.get(ACTIVE_SESSION_KEY), None);
        let chats: Vec<String> = reopened.get_json(RECENT_CHATS_KEY).unwrap().unwrap();
        assert_eq!(chats, vec!["a".to_string()]);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(STORE_FILE), "{ broken").unwrap();
        assert!(matches!(LocalStore::open(temp.path()), Err(StoreError::Corrupt { .. })));
    }
}
