//! Cache keys and lifetimes for Real-Debrid responses.

/// Cached responses, each under a fixed storage key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheKey {
  UserInfo,
  TorrentsList,
  AvailableHosts,
}

impl CacheKey {
  pub const ALL: [CacheKey; 3] = [Self::UserInfo, Self::TorrentsList, Self::AvailableHosts];

  /// Storage key.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::UserInfo => "rd_user_info",
      Self::TorrentsList => "rd_torrents_list",
      Self::AvailableHosts => "rd_available_hosts",
    }
  }

  /// Lifetime in minutes. The torrent list changes often, hosts rarely.
  pub fn ttl_minutes(&self) -> u32 {
    match self {
      Self::UserInfo => 15,
      Self::TorrentsList => 2,
      Self::AvailableHosts => 60,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::API_KEY;

  #[test]
  fn test_keys_are_distinct_from_api_key() {
    for key in CacheKey::ALL {
      assert_ne!(key.as_str(), API_KEY);
      assert!(key.ttl_minutes() > 0);
    }
  }
}
