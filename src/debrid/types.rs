//! Response payloads of the Real-Debrid API.
//!
//! These mirror the remote JSON shapes. Nothing here is derived or mutated locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
  Premium,
  Free,
}

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: u64,
  pub username: String,
  pub email: String,
  pub points: i64,
  pub locale: String,
  pub avatar: String,
  #[serde(rename = "type")]
  pub account_type: AccountType,
  /// Seconds of premium left
  pub premium: i64,
  pub expiration: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentStatus {
  MagnetError,
  MagnetConversion,
  WaitingFilesSelection,
  Queued,
  Downloading,
  Downloaded,
  Error,
  Virus,
  Compressing,
  Uploading,
  Dead,
  /// A status this client does not know about yet
  #[serde(other)]
  Unknown,
}

impl TorrentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::MagnetError => "magnet_error",
      Self::MagnetConversion => "magnet_conversion",
      Self::WaitingFilesSelection => "waiting_files_selection",
      Self::Queued => "queued",
      Self::Downloading => "downloading",
      Self::Downloaded => "downloaded",
      Self::Error => "error",
      Self::Virus => "virus",
      Self::Compressing => "compressing",
      Self::Uploading => "uploading",
      Self::Dead => "dead",
      Self::Unknown => "unknown",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentFile {
  pub id: u64,
  pub path: String,
  pub bytes: u64,
  /// 1 when the file is selected for download
  pub selected: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Torrent {
  pub id: String,
  pub filename: String,
  pub hash: String,
  pub bytes: u64,
  pub host: String,
  /// 0 to 100
  pub progress: f64,
  pub status: TorrentStatus,
  pub added: DateTime<Utc>,
  #[serde(default)]
  pub links: Vec<String>,
  /// Only present on the detail endpoint
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub files: Option<Vec<TorrentFile>>,
}

/// Result of adding a magnet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddedMagnet {
  pub id: String,
  pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnrestrictedLink {
  pub id: String,
  pub filename: String,
  #[serde(rename = "mimeType")]
  pub mime_type: String,
  pub filesize: u64,
  pub link: String,
  pub host: String,
  #[serde(default)]
  pub host_icon: Option<String>,
  pub chunks: u32,
  pub crc: u32,
  pub download: String,
  pub streamable: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableHost {
  pub host: String,
  pub max_file_size: u64,
}
