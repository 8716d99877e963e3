//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds in one minute.
const MINUTE_MS: i64 = 60_000;

/// Envelope persisted for every TTL-governed entry.
///
/// The field names are the on-disk layout and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheItem<T> {
  /// The cached value
  pub value: T,
  /// Write time, epoch milliseconds
  pub timestamp: i64,
  /// Lifetime in milliseconds
  pub ttl: i64,
}

impl<T> CacheItem<T> {
  /// Wrap a value written at `now` that lives for `ttl_minutes`.
  pub fn new(value: T, now: DateTime<Utc>, ttl_minutes: u32) -> Self {
    Self {
      value,
      timestamp: now.timestamp_millis(),
      ttl: i64::from(ttl_minutes) * MINUTE_MS,
    }
  }

  /// An item is expired once strictly more than `ttl` has elapsed since it was written.
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    now.timestamp_millis().saturating_sub(self.timestamp) > self.ttl
  }
}

/// Source of the current time.
///
/// Expiry checks go through this so tests can move time forward.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}
