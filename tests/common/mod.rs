#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use rdm::cache::Clock;
use serde_json::{json, Value};
use std::sync::Mutex;

pub const MAGNET: &str =
  "magnet:?xt=urn:btih:dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c&dn=ubuntu-24.04-desktop-amd64.iso";

/// Clock that only moves when told to.
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
  pub fn new() -> Self {
    Self(Mutex::new(Utc::now()))
  }

  pub fn advance(&self, by: Duration) {
    *self.0.lock().unwrap() += by;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.0.lock().unwrap()
  }
}

pub fn user_json() -> Value {
  json!({
    "id": 1,
    "username": "alice",
    "email": "alice@example.com",
    "points": 1200,
    "locale": "en",
    "avatar": "https://fcdn.real-debrid.com/images/forum/empty.png",
    "type": "premium",
    "premium": 2_592_000,
    "expiration": "2030-01-01T00:00:00.000Z"
  })
}

pub fn torrent_json(id: &str) -> Value {
  json!({
    "id": id,
    "filename": "ubuntu-24.04-desktop-amd64.iso",
    "hash": "dd8255ecdc7ca55fb0bbf81323d87062db1f6d1c",
    "bytes": 6_114_656_256u64,
    "host": "real-debrid.com",
    "split": 2000,
    "progress": 100,
    "status": "downloaded",
    "added": "2024-04-25T18:03:12.000Z",
    "links": ["https://real-debrid.com/d/ABCDEF"],
    "ended": "2024-04-25T18:05:00.000Z"
  })
}

pub fn hosts_json() -> Value {
  json!([
    { "host": "real-debrid.com", "max_file_size": 2_000_000_000_000u64 },
    { "host": "rd.example", "max_file_size": 0 }
  ])
}
