//! One-time selection of the storage backend.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::file::FileStorage;
use super::storage::{BackendError, MemoryStorage, SqliteStorage, StorageBackend};
use crate::config::BackendPreference;

const SQLITE_FILE: &str = "rdm.db";
const JSON_FILE: &str = "rdm.json";

/// Marker some platforms put on failures that are safe to treat as "nothing there".
const BENIGN_QUIRK: &str = "Invalid argument";

/// Which backend a [`super::Store`] ended up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
  Sqlite,
  File,
  Memory,
}

impl fmt::Display for BackendKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Sqlite => "sqlite",
      Self::File => "file",
      Self::Memory => "memory",
    };
    f.write_str(name)
  }
}

/// Storage could not be set up at all. Fatal at startup.
#[derive(Debug, Error)]
pub enum SetupError {
  #[error("{kind} storage is unavailable: {source}")]
  Unavailable {
    kind: BackendKind,
    #[source]
    source: BackendError,
  },

  #[error("no compatible storage backend found (sqlite: {primary}; file: {fallback})")]
  NoBackend {
    primary: BackendError,
    fallback: BackendError,
  },
}

/// Compatibility shim for backends that reject reads of absent or unsupported
/// entries with an "Invalid argument" error (including EINVAL from the OS).
///
/// Only this exact signature is absorbed; every other failure is surfaced.
pub fn is_benign_quirk(err: &BackendError) -> bool {
  err.to_string().contains(BENIGN_QUIRK)
}

/// Resolve the backend for `preference`, storing files under `dir`.
///
/// With [`BackendPreference::Auto`] the SQLite database is preferred. If it
/// cannot be opened, the JSON file backend is used after a successful probe read.
pub fn select_backend(
  preference: BackendPreference,
  dir: &Path,
) -> Result<(Arc<dyn StorageBackend>, BackendKind), SetupError> {
  let sqlite_path = dir.join(SQLITE_FILE);
  let json_path = dir.join(JSON_FILE);

  let selected: (Arc<dyn StorageBackend>, BackendKind) = match preference {
    BackendPreference::Memory => (Arc::new(MemoryStorage::new()), BackendKind::Memory),
    BackendPreference::Sqlite => {
      let storage = SqliteStorage::open(&sqlite_path).map_err(|source| SetupError::Unavailable {
        kind: BackendKind::Sqlite,
        source,
      })?;
      (Arc::new(storage), BackendKind::Sqlite)
    }
    BackendPreference::File => {
      let storage = FileStorage::new(json_path);
      storage.probe().map_err(|source| SetupError::Unavailable {
        kind: BackendKind::File,
        source,
      })?;
      (Arc::new(storage), BackendKind::File)
    }
    BackendPreference::Auto => match SqliteStorage::open(&sqlite_path) {
      Ok(storage) => (Arc::new(storage), BackendKind::Sqlite),
      Err(primary) => {
        warn!(path = %sqlite_path.display(), error = %primary, "sqlite storage unavailable, trying file storage");
        let storage = FileStorage::new(json_path);
        match storage.probe() {
          Ok(()) => (Arc::new(storage), BackendKind::File),
          Err(fallback) => return Err(SetupError::NoBackend { primary, fallback }),
        }
      }
    },
  };

  info!(backend = %selected.1, dir = %dir.display(), "storage backend selected");
  Ok(selected)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn test_quirk_predicate_matches_only_invalid_argument() {
    assert!(is_benign_quirk(&BackendError::Rejected(
      "Error: Invalid argument for get".into()
    )));
    let einval = std::io::Error::from_raw_os_error(22);
    if einval.to_string().contains(BENIGN_QUIRK) {
      assert!(is_benign_quirk(&BackendError::Io(einval)));
    }
    assert!(!is_benign_quirk(&BackendError::Rejected("quota exceeded".into())));
    assert!(!is_benign_quirk(&BackendError::Lock("poisoned".into())));
  }

  #[test]
  fn test_auto_prefers_sqlite() {
    let dir = TempDir::new().unwrap();
    let (_, kind) = select_backend(BackendPreference::Auto, dir.path()).unwrap();
    assert_eq!(kind, BackendKind::Sqlite);
    assert!(dir.path().join(SQLITE_FILE).exists());
  }

  #[test]
  fn test_auto_falls_back_to_file_when_sqlite_cannot_open() {
    let dir = TempDir::new().unwrap();
    // Occupy the database path with a directory so SQLite cannot open it.
    fs::create_dir(dir.path().join(SQLITE_FILE)).unwrap();

    let (_, kind) = select_backend(BackendPreference::Auto, dir.path()).unwrap();
    assert_eq!(kind, BackendKind::File);
  }

  #[test]
  fn test_auto_fails_when_nothing_works() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, b"file").unwrap();

    let err = select_backend(BackendPreference::Auto, &blocker).err().unwrap();
    assert!(matches!(err, SetupError::NoBackend { .. }));
  }

  #[test]
  fn test_explicit_choices() {
    let dir = TempDir::new().unwrap();
    let (_, kind) = select_backend(BackendPreference::Memory, dir.path()).unwrap();
    assert_eq!(kind, BackendKind::Memory);

    let (_, kind) = select_backend(BackendPreference::File, dir.path()).unwrap();
    assert_eq!(kind, BackendKind::File);

    let (_, kind) = select_backend(BackendPreference::Sqlite, dir.path()).unwrap();
    assert_eq!(kind, BackendKind::Sqlite);
  }

  #[test]
  fn test_explicit_sqlite_does_not_fall_back() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join(SQLITE_FILE)).unwrap();

    let err = select_backend(BackendPreference::Sqlite, dir.path()).err().unwrap();
    assert!(matches!(
      err,
      SetupError::Unavailable {
        kind: BackendKind::Sqlite,
        ..
      }
    ));
  }
}
