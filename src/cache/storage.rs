//! Storage backend trait, SQLite implementation and an in-memory implementation.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Raw failure reported by a storage backend.
///
/// These never leave [`super::Store`] unwrapped.
#[derive(Debug, Error)]
pub enum BackendError {
  #[error("sqlite: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("{0}")]
  Io(#[from] std::io::Error),

  #[error("invalid stored value: {0}")]
  Serde(#[from] serde_json::Error),

  #[error("lock poisoned: {0}")]
  Lock(String),

  /// Rejection reported by a backend with only a message.
  #[error("{0}")]
  Rejected(String),
}

/// Asynchronous key/value backend.
///
/// Values are opaque JSON. Missing keys are simply absent from `get` results.
#[async_trait]
pub trait StorageBackend: Send + Sync {
  /// Read the given keys. Keys that are not stored are left out of the map.
  async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, BackendError>;

  /// Insert or replace every entry in `items`.
  async fn set(&self, items: HashMap<String, Value>) -> Result<(), BackendError>;

  /// Remove a single key. Removing a missing key is not an error.
  async fn remove(&self, key: &str) -> Result<(), BackendError>;

  /// Remove every key.
  async fn clear(&self) -> Result<(), BackendError>;
}

/// Storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Value>>, BackendError> {
    self
      .entries
      .lock()
      .map_err(|e| BackendError::Lock(e.to_string()))
  }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
  async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, BackendError> {
    let entries = self.lock()?;
    Ok(
      keys
        .iter()
        .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
        .collect(),
    )
  }

  async fn set(&self, items: HashMap<String, Value>) -> Result<(), BackendError> {
    self.lock()?.extend(items);
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<(), BackendError> {
    self.lock()?.remove(key);
    Ok(())
  }

  async fn clear(&self) -> Result<(), BackendError> {
    self.lock()?.clear();
    Ok(())
  }
}

/// SQLite-based storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

/// Schema for the key/value table.
const STORAGE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);
"#;

impl SqliteStorage {
  /// Open or create the database at `path`.
  pub fn open(path: &Path) -> Result<Self, BackendError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    Self::with_connection(conn)
  }

  /// Open a private in-memory database.
  pub fn open_in_memory() -> Result<Self, BackendError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self, BackendError> {
    conn.execute_batch(STORAGE_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, BackendError> {
    self
      .conn
      .lock()
      .map_err(|e| BackendError::Lock(e.to_string()))
  }
}

#[async_trait]
impl StorageBackend for SqliteStorage {
  async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, BackendError> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?")?;

    let mut found = HashMap::new();
    for key in keys {
      let raw: Option<String> = stmt
        .query_row(params![key], |row| row.get(0))
        .optional()?;
      if let Some(raw) = raw {
        found.insert(key.to_string(), serde_json::from_str(&raw)?);
      }
    }

    Ok(found)
  }

  async fn set(&self, items: HashMap<String, Value>) -> Result<(), BackendError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;

    for (key, value) in &items {
      let raw = serde_json::to_string(value)?;
      tx.execute(
        "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?, ?)",
        params![key, raw],
      )?;
    }

    tx.commit()?;
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<(), BackendError> {
    self
      .lock()?
      .execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
    Ok(())
  }

  async fn clear(&self) -> Result<(), BackendError> {
    self.lock()?.execute("DELETE FROM kv_store", [])?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use tempfile::TempDir;

  async fn exercise(backend: &dyn StorageBackend) {
    let mut items = HashMap::new();
    items.insert("a".to_string(), json!({"n": 1}));
    items.insert("b".to_string(), json!("two"));
    backend.set(items).await.unwrap();

    let got = backend.get(&["a", "b", "missing"]).await.unwrap();
    assert_eq!(got.len(), 2);
    assert_eq!(got["a"], json!({"n": 1}));
    assert_eq!(got["b"], json!("two"));

    backend.remove("a").await.unwrap();
    backend.remove("a").await.unwrap();
    assert!(backend.get(&["a"]).await.unwrap().is_empty());

    backend.clear().await.unwrap();
    assert!(backend.get(&["b"]).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_memory_storage_contract() {
    exercise(&MemoryStorage::new()).await;
  }

  #[tokio::test]
  async fn test_sqlite_storage_contract() {
    exercise(&SqliteStorage::open_in_memory().unwrap()).await;
  }

  #[tokio::test]
  async fn test_sqlite_set_replaces_existing_value() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    for value in [json!(1), json!(2)] {
      let mut items = HashMap::new();
      items.insert("k".to_string(), value);
      storage.set(items).await.unwrap();
    }
    assert_eq!(storage.get(&["k"]).await.unwrap()["k"], json!(2));
  }

  #[tokio::test]
  async fn test_sqlite_storage_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("rdm.db");

    {
      let storage = SqliteStorage::open(&path).unwrap();
      let mut items = HashMap::new();
      items.insert("rdApiKey".to_string(), json!("secret"));
      storage.set(items).await.unwrap();
    }

    let reopened = SqliteStorage::open(&path).unwrap();
    assert_eq!(reopened.get(&["rdApiKey"]).await.unwrap()["rdApiKey"], json!("secret"));
  }
}
