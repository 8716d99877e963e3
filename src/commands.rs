//! Available commands and their output.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use futures::future::try_join_all;
use std::io::Write;
use tracing::info;

use crate::app::App;
use crate::cache::API_KEY;
use crate::debrid::{CacheKey, FileSelection, Torrent};
use crate::error::AppError;

const BYTES_PER_KB: u64 = 1024;
const BYTES_PER_MB: u64 = 1024 * 1024;
const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Longest filename shown in listings
const MAX_FILENAME_LENGTH: usize = 50;

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
  /// Save the Real-Debrid API key
  Login { api_key: String },
  /// Forget the API key and every cached response
  Logout,
  /// Show the current account
  #[command(alias = "me")]
  User,
  /// List torrents
  #[command(alias = "ls")]
  List,
  /// Show a torrent and its files
  Info { id: String },
  /// Add a magnet link
  Add {
    magnet: String,
    /// Host to add the torrent on (default: first available host)
    #[arg(long)]
    host: Option<String>,
  },
  /// Select files of a torrent: `all` or a comma separated list of file ids
  Select { id: String, files: FileSelection },
  /// Delete a torrent
  #[command(alias = "rm")]
  Delete { id: String },
  /// Turn a hoster link into a direct download link
  Unrestrict { link: String },
  /// List hosts available for new torrents
  Hosts,
  /// Drop cached responses, keeping the API key
  ClearCache,
}

/// Run a single command against `app`.
pub async fn run<W: Write>(app: &App, command: Command, out: &mut W) -> Result<()> {
  match command {
    Command::Login { api_key } => {
      let api_key = api_key.trim();
      if api_key.is_empty() {
        return Err(AppError::validation("API key must not be empty", Some("api_key")).into());
      }
      app.store().set_api_key(api_key).await?;
      clear_cached_responses(app).await?;
      info!("api key saved");
      writeln!(out, "API key saved.")?;
    }
    Command::Logout => {
      app.store().clear(API_KEY).await?;
      clear_cached_responses(app).await?;
      info!("api key removed");
      writeln!(out, "Logged out.")?;
    }
    Command::User => {
      let user = app.client().await?.user().await?;
      writeln!(out, "{} <{}>", user.username, user.email)?;
      writeln!(out, "Account:    {:?}", user.account_type)?;
      writeln!(out, "Premium:    {} days left", user.premium / 86_400)?;
      writeln!(out, "Expiration: {}", user.expiration.format("%Y-%m-%d"))?;
      writeln!(out, "Points:     {}", user.points)?;
    }
    Command::List => {
      let torrents = app.client().await?.torrents().await?;
      if torrents.is_empty() {
        writeln!(out, "No torrents.")?;
      }
      for torrent in &torrents {
        write_torrent_row(out, torrent)?;
      }
    }
    Command::Info { id } => {
      let torrent = app.client().await?.torrent_info(&id).await?;
      write_torrent_row(out, &torrent)?;
      writeln!(out, "Hash:  {}", torrent.hash)?;
      writeln!(out, "Added: {}", torrent.added.format("%Y-%m-%d %H:%M"))?;
      for file in torrent.files.iter().flatten() {
        let marker = if file.selected == 1 { "*" } else { " " };
        writeln!(
          out,
          "  {} {:>4}  {:>10}  {}",
          marker,
          file.id,
          format_bytes(file.bytes),
          file.path
        )?;
      }
      for link in &torrent.links {
        writeln!(out, "  -> {}", link)?;
      }
    }
    Command::Add { magnet, host } => {
      let magnet = crate::magnet::validate(&magnet)?;
      let client = app.client().await?;

      let host = match host {
        Some(host) => host,
        None => client
          .available_hosts()
          .await?
          .into_iter()
          .next()
          .map(|h| h.host)
          .ok_or_else(|| eyre!("No available hosts found"))?,
      };

      let added = client.add_magnet(magnet, &host).await?;
      info!(id = %added.id, host = %host, "magnet added");
      writeln!(out, "Added {} on {}", added.id, host)?;
      writeln!(out, "{}", added.uri)?;
    }
    Command::Select { id, files } => {
      app.client().await?.select_files(&id, &files).await?;
      writeln!(out, "Selected files {} of {}", files.to_form_value(), id)?;
    }
    Command::Delete { id } => {
      app.client().await?.delete_torrent(&id).await?;
      writeln!(out, "Deleted {}", id)?;
    }
    Command::Unrestrict { link } => {
      let unrestricted = app.client().await?.unrestrict_link(&link).await?;
      writeln!(
        out,
        "{} ({})",
        truncate(&unrestricted.filename),
        format_bytes(unrestricted.filesize)
      )?;
      writeln!(out, "{}", unrestricted.download)?;
    }
    Command::Hosts => {
      let hosts = app.client().await?.available_hosts().await?;
      for host in &hosts {
        writeln!(out, "{:<30} max {}", host.host, format_bytes(host.max_file_size))?;
      }
    }
    Command::ClearCache => {
      clear_cached_responses(app).await?;
      writeln!(out, "Cache cleared.")?;
    }
  }

  Ok(())
}

/// Works without an API key, unlike going through the client.
async fn clear_cached_responses(app: &App) -> Result<(), AppError> {
  try_join_all(CacheKey::ALL.map(|key| app.store().clear(key.as_str()))).await?;
  Ok(())
}

fn write_torrent_row<W: Write>(out: &mut W, torrent: &Torrent) -> std::io::Result<()> {
  writeln!(
    out,
    "{:<16} {:<24} {:>5.1}%  {:>10}  {}",
    torrent.id,
    torrent.status.as_str(),
    torrent.progress,
    format_bytes(torrent.bytes),
    truncate(&torrent.filename)
  )
}

/// Human readable size with 1024-based units.
pub fn format_bytes(bytes: u64) -> String {
  if bytes >= BYTES_PER_GB {
    format!("{:.2} GB", bytes as f64 / BYTES_PER_GB as f64)
  } else if bytes >= BYTES_PER_MB {
    format!("{:.2} MB", bytes as f64 / BYTES_PER_MB as f64)
  } else if bytes >= BYTES_PER_KB {
    format!("{:.2} KB", bytes as f64 / BYTES_PER_KB as f64)
  } else {
    format!("{} B", bytes)
  }
}

/// Shorten long filenames, keeping the total at most [`MAX_FILENAME_LENGTH`] characters.
pub fn truncate(name: &str) -> String {
  if name.chars().count() <= MAX_FILENAME_LENGTH {
    return name.to_string();
  }
  let kept: String = name.chars().take(MAX_FILENAME_LENGTH - 3).collect();
  format!("{}...", kept)
}
