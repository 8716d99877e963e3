use color_eyre::{eyre::eyre, Result};
use std::io::Write;

use crate::cache::Store;
use crate::commands::{self, Command};
use crate::config::Config;
use crate::debrid::{CachedDebridClient, DebridClient};
use crate::error::AppError;

/// Application context.
///
/// Owns the store, which is opened exactly once, and hands out API clients
/// bound to the current key. Everything is passed down explicitly.
pub struct App {
  config: Config,
  store: Store,
}

impl App {
  /// Open storage according to the configuration.
  pub fn new(config: Config) -> Result<Self> {
    let dir = config.data_dir()?;
    let store = Store::open(config.storage.backend, &dir)?;
    Ok(Self::with_store(config, store))
  }

  pub fn with_store(config: Config, store: Store) -> Self {
    Self { config, store }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn store(&self) -> &Store {
    &self.store
  }

  /// API key from the environment, else from storage. Empty when neither is set.
  pub async fn api_key(&self) -> Result<String, AppError> {
    match Config::api_key_from_env() {
      Some(key) => Ok(key),
      None => self.store.api_key().await,
    }
  }

  /// Client for the configured endpoint, authenticated with the current key.
  pub async fn client(&self) -> Result<CachedDebridClient> {
    let api_key = self.api_key().await?;
    if api_key.is_empty() {
      return Err(eyre!(
        "No API key configured. Run `rdm login <API_KEY>` or set {}.",
        crate::config::API_KEY_ENV
      ));
    }

    let inner = DebridClient::new(api_key)
      .with_base_url(self.config.api.base_url.clone())
      .with_timeout(self.config.api.timeout());

    Ok(CachedDebridClient::new(inner, self.store.clone()))
  }

  /// Run one command, writing its output to `out`.
  pub async fn run<W: Write>(&self, command: Command, out: &mut W) -> Result<()> {
    commands::run(self, command, out).await
  }
}
