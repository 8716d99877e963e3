//! Real-Debrid REST client.

mod cache;
mod cached_client;
mod client;
mod types;

pub use cache::CacheKey;
pub use cached_client::CachedDebridClient;
pub use client::{ApiRequest, DebridClient, FileSelection, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use types::{
  AccountType, AddedMagnet, AvailableHost, Torrent, TorrentFile, TorrentStatus, UnrestrictedLink,
  User,
};
