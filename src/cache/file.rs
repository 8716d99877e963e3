//! Single-document JSON file storage.
//!
//! Used when the SQLite database cannot be opened. The whole map lives in one
//! file that is rewritten through a temporary file and a rename.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::storage::{BackendError, StorageBackend};

pub struct FileStorage {
  path: PathBuf,
  /// Serializes read-modify-write cycles within this process
  write_lock: Mutex<()>,
}

impl FileStorage {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      write_lock: Mutex::new(()),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Check that the backing file can actually be read.
  ///
  /// Creates the parent directory if needed. A missing file is fine, an
  /// unreadable or corrupt one is not.
  pub fn probe(&self) -> Result<(), BackendError> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent)?;
    }
    self.read_all().map(|_| ())
  }

  fn read_all(&self) -> Result<HashMap<String, Value>, BackendError> {
    let bytes = match fs::read(&self.path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
      Err(e) => return Err(e.into()),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
      return Ok(HashMap::new());
    }

    Ok(serde_json::from_slice(&bytes)?)
  }

  fn write_all(&self, entries: &HashMap<String, Value>) -> Result<(), BackendError> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent)?;
    }

    let tmp = self.path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec(entries)?)?;
    fs::rename(&tmp, &self.path)?;
    Ok(())
  }

  fn update(
    &self,
    f: impl FnOnce(&mut HashMap<String, Value>),
  ) -> Result<(), BackendError> {
    let _guard = self
      .write_lock
      .lock()
      .map_err(|e| BackendError::Lock(e.to_string()))?;

    let mut entries = self.read_all()?;
    f(&mut entries);
    self.write_all(&entries)
  }
}

#[async_trait]
impl StorageBackend for FileStorage {
  async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, BackendError> {
    let mut entries = self.read_all()?;
    Ok(
      keys
        .iter()
        .filter_map(|k| entries.remove(*k).map(|v| (k.to_string(), v)))
        .collect(),
    )
  }

  async fn set(&self, items: HashMap<String, Value>) -> Result<(), BackendError> {
    self.update(|entries| entries.extend(items))
  }

  async fn remove(&self, key: &str) -> Result<(), BackendError> {
    self.update(|entries| {
      entries.remove(key);
    })
  }

  async fn clear(&self) -> Result<(), BackendError> {
    self.update(HashMap::clear)
  }
}
