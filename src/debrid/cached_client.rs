//! Real-Debrid client with the response cache in front of the read endpoints.

use futures::future::try_join_all;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use tracing::debug;

use super::cache::CacheKey;
use super::client::{DebridClient, FileSelection};
use super::types::{AddedMagnet, AvailableHost, Torrent, UnrestrictedLink, User};
use crate::cache::Store;
use crate::error::AppError;

/// Real-Debrid client with transparent caching.
///
/// User info, the torrent list and the host list are served from the store
/// while fresh. Writes that change the torrent list drop its cached copy.
#[derive(Clone)]
pub struct CachedDebridClient {
  inner: DebridClient,
  store: Store,
}

impl CachedDebridClient {
  pub fn new(inner: DebridClient, store: Store) -> Self {
    Self { inner, store }
  }

  pub fn inner(&self) -> &DebridClient {
    &self.inner
  }

  async fn cached<T, F, Fut>(&self, key: CacheKey, fetcher: F) -> Result<T, AppError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
  {
    if let Some(hit) = self.store.get::<T>(key.as_str()).await? {
      debug!(key = key.as_str(), "cache hit");
      return Ok(hit);
    }

    debug!(key = key.as_str(), "cache miss");
    let fresh = fetcher().await?;
    self
      .store
      .set(key.as_str(), &fresh, key.ttl_minutes())
      .await?;
    Ok(fresh)
  }

  /// Get the current user (cached).
  pub async fn user(&self) -> Result<User, AppError> {
    self.cached(CacheKey::UserInfo, || self.inner.user()).await
  }

  /// List torrents (cached).
  pub async fn torrents(&self) -> Result<Vec<Torrent>, AppError> {
    self
      .cached(CacheKey::TorrentsList, || self.inner.torrents())
      .await
  }

  /// Available hosts (cached).
  pub async fn available_hosts(&self) -> Result<Vec<AvailableHost>, AppError> {
    self
      .cached(CacheKey::AvailableHosts, || self.inner.available_hosts())
      .await
  }

  /// Torrent detail (not cached - progress changes constantly).
  pub async fn torrent_info(&self, id: &str) -> Result<Torrent, AppError> {
    self.inner.torrent_info(id).await
  }

  pub async fn add_magnet(&self, magnet: &str, host: &str) -> Result<AddedMagnet, AppError> {
    let added = self.inner.add_magnet(magnet, host).await?;
    self.invalidate(CacheKey::TorrentsList).await?;
    Ok(added)
  }

  pub async fn select_files(&self, id: &str, files: &FileSelection) -> Result<(), AppError> {
    self.inner.select_files(id, files).await?;
    self.invalidate(CacheKey::TorrentsList).await
  }

  pub async fn delete_torrent(&self, id: &str) -> Result<(), AppError> {
    self.inner.delete_torrent(id).await?;
    self.invalidate(CacheKey::TorrentsList).await
  }

  /// Unrestrict a link (not cached - write operation).
  pub async fn unrestrict_link(&self, link: &str) -> Result<UnrestrictedLink, AppError> {
    self.inner.unrestrict_link(link).await
  }

  pub async fn invalidate(&self, key: CacheKey) -> Result<(), AppError> {
    self.store.clear(key.as_str()).await
  }

  /// Drop every cached response. The API key is kept.
  pub async fn clear_cache(&self) -> Result<(), AppError> {
    try_join_all(CacheKey::ALL.map(|key| self.invalidate(key))).await?;
    Ok(())
  }
}
