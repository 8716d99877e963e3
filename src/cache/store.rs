//! TTL-aware store on top of a [`StorageBackend`].

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::backend::{is_benign_quirk, select_backend, BackendKind, SetupError};
use super::storage::{BackendError, StorageBackend};
use super::traits::{CacheItem, Clock, SystemClock};
use crate::config::BackendPreference;
use crate::error::AppError;

/// Reserved key holding the Real-Debrid API key. Never subject to expiry.
pub const API_KEY: &str = "rdApiKey";

/// Namespaced key/value store with per-entry expiry.
///
/// Construct once at startup and share clones; clones use the same backend.
/// There is no locking across calls: a concurrent `set` and an expiring `get`
/// on the same key race and the last write wins.
#[derive(Clone)]
pub struct Store {
  backend: Arc<dyn StorageBackend>,
  kind: BackendKind,
  clock: Arc<dyn Clock>,
}

impl Store {
  /// Create a store over an already constructed backend.
  pub fn new(backend: Arc<dyn StorageBackend>, kind: BackendKind) -> Self {
    Self {
      backend,
      kind,
      clock: Arc::new(SystemClock),
    }
  }

  /// Select a backend according to `preference` and open it under `dir`.
  pub fn open(preference: BackendPreference, dir: &Path) -> Result<Self, SetupError> {
    let (backend, kind) = select_backend(preference, dir)?;
    Ok(Self::new(backend, kind))
  }

  /// Replace the clock used for timestamps and expiry checks.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn kind(&self) -> BackendKind {
    self.kind
  }

  /// Run a backend call, absorbing the known quirk and wrapping everything else.
  async fn guarded<T, Fut>(&self, operation: &str, call: Fut) -> Result<T, AppError>
  where
    T: Default,
    Fut: Future<Output = Result<T, BackendError>>,
  {
    match call.await {
      Ok(value) => Ok(value),
      Err(e) if is_benign_quirk(&e) => {
        warn!(operation, error = %e, "storage quirk absorbed");
        Ok(T::default())
      }
      Err(e) => {
        error!(operation, backend = %self.kind, error = %e, "storage operation failed");
        Err(AppError::storage(format!("Storage {} failed", operation), e))
      }
    }
  }

  /// Store `value` under `key` for `ttl_minutes`.
  pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_minutes: u32) -> Result<(), AppError> {
    if ttl_minutes == 0 {
      return Err(AppError::validation(
        "TTL must be at least one minute",
        Some("ttl_minutes"),
      ));
    }

    let item = CacheItem::new(value, self.clock.now(), ttl_minutes);
    let encoded = serde_json::to_value(&item)
      .map_err(|e| AppError::storage(format!("Failed to encode value for {}", key), e.into()))?;

    debug!(key, ttl_minutes, "storage set");
    self
      .guarded("set", self.backend.set(single(key, encoded)))
      .await
  }

  /// Read `key`, returning `None` when it is absent or expired.
  ///
  /// Expired entries are removed as a side effect.
  pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
    let mut found = self.guarded("get", self.backend.get(&[key])).await?;

    let raw = match found.remove(key) {
      Some(Value::Null) | None => return Ok(None),
      Some(raw) => raw,
    };

    // The envelope is checked before the value so stale entries of an old shape still expire.
    let item: CacheItem<Value> = serde_json::from_value(raw)
      .map_err(|e| AppError::storage(format!("Stored entry {} is malformed", key), e.into()))?;

    if item.is_expired(self.clock.now()) {
      debug!(key, "storage entry expired");
      self.clear(key).await?;
      return Ok(None);
    }

    serde_json::from_value(item.value)
      .map(Some)
      .map_err(|e| AppError::storage(format!("Stored entry {} is malformed", key), e.into()))
  }

  /// Remove a single key.
  pub async fn clear(&self, key: &str) -> Result<(), AppError> {
    self.guarded("remove", self.backend.remove(key)).await
  }

  /// Remove every key, including the API key.
  pub async fn clear_all(&self) -> Result<(), AppError> {
    self.guarded("clear", self.backend.clear()).await
  }

  /// The stored API key, or an empty string when none is set.
  pub async fn api_key(&self) -> Result<String, AppError> {
    let found = self.guarded("get", self.backend.get(&[API_KEY])).await?;
    Ok(
      found
        .get(API_KEY)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string(),
    )
  }

  /// Persist the API key without any expiry.
  pub async fn set_api_key(&self, api_key: &str) -> Result<(), AppError> {
    self
      .guarded(
        "set",
        self
          .backend
          .set(single(API_KEY, Value::String(api_key.to_string()))),
      )
      .await
  }
}

fn single(key: &str, value: Value) -> HashMap<String, Value> {
  let mut items = HashMap::with_capacity(1);
  items.insert(key.to_string(), value);
  items
}
