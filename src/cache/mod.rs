//! Key-value storage with per-entry expiry.
//!
//! This module provides the persistence layer used for the API key and for
//! cached API responses:
//! - Entries are wrapped in a [`CacheItem`] carrying a write timestamp and a TTL
//! - Expiry is checked lazily on read; expired entries are removed on access
//! - The backend is chosen once at startup (SQLite, falling back to a JSON file)
//! - Backend failures are wrapped into [`crate::error::AppError::Storage`]

mod backend;
mod file;
mod storage;
mod store;
mod traits;

pub use backend::{is_benign_quirk, select_backend, BackendKind, SetupError};
pub use file::FileStorage;
pub use storage::{BackendError, MemoryStorage, SqliteStorage, StorageBackend};
pub use store::{Store, API_KEY};
pub use traits::{CacheItem, Clock, SystemClock};
