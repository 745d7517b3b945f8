//! [`JsonStore`]: the JSON-file implementation of [`StateStore`].

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use chrono::NaiveDate;
use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tracing::{debug, warn};

use sotd_core::{
  state::{DestinationRegistry, OverrideMap, RoleAllowList, UsedSet},
  store::StateStore,
};

use crate::{Error, Result};

// ─── Tables ──────────────────────────────────────────────────────────────────

/// The documents kept in the state directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
  Used,
  Destinations,
  Overrides,
  LastFired,
  AllowedRoles,
}

impl Table {
  pub const ALL: [Table; 5] = [
    Table::Used,
    Table::Destinations,
    Table::Overrides,
    Table::LastFired,
    Table::AllowedRoles,
  ];

  pub fn file_name(self) -> &'static str {
    match self {
      Table::Used => "used_songs.json",
      Table::Destinations => "channel_config.json",
      Table::Overrides => "scheduled_songs.json",
      Table::LastFired => "last_run.json",
      Table::AllowedRoles => "allowed_roles.json",
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// State tables stored as JSON documents under one directory.
///
/// Cloning is cheap; clones address the same directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
  dir: PathBuf,
}

impl JsonStore {
  /// Open the store at `dir`, creating the directory if needed.
  pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
    let dir = dir.into();
    fs::create_dir_all(&dir)
      .await
      .map_err(|e| Error::io(&dir, e))?;
    Ok(Self { dir })
  }

  pub fn dir(&self) -> &Path { &self.dir }

  pub fn path(&self, table: Table) -> PathBuf { self.dir.join(table.file_name()) }

  /// Read a table.
  ///
  /// A missing document yields the default without touching disk. A
  /// document that cannot be read or parsed is replaced by the default,
  /// which is written back before returning.
  async fn load<T>(&self, table: Table) -> Result<T>
  where
    T: DeserializeOwned + Serialize + Default,
  {
    let path = self.path(table);
    let bytes = match fs::read(&path).await {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        debug!(path = %path.display(), "no document yet; using default");
        return Ok(T::default());
      }
      Err(e) => {
        warn!(path = %path.display(), error = %e, "unreadable state; resetting");
        return self.reset(table).await;
      }
    };

    match serde_json::from_slice(&bytes) {
      Ok(value) => Ok(value),
      Err(e) => {
        warn!(path = %path.display(), error = %e, "corrupt state; resetting");
        self.reset(table).await
      }
    }
  }

  async fn reset<T>(&self, table: Table) -> Result<T>
  where
    T: Serialize + Default,
  {
    let value = T::default();
    self.save(table, &value).await?;
    Ok(value)
  }

  /// Overwrite a table: write a sibling temporary file, then rename it over
  /// the document.
  async fn save<T: Serialize + ?Sized>(&self, table: Table, value: &T) -> Result<()> {
    let path = self.path(table);
    let tmp = path.with_extension("json.tmp");
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');

    fs::write(&tmp, &bytes).await.map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, &path).await.map_err(|e| Error::io(&path, e))?;
    Ok(())
  }
}

// ─── StateStore impl ─────────────────────────────────────────────────────────

impl StateStore for JsonStore {
  type Error = Error;

  async fn load_used(&self) -> Result<UsedSet> { self.load(Table::Used).await }

  async fn save_used(&self, used: &UsedSet) -> Result<()> {
    self.save(Table::Used, used).await
  }

  async fn load_destinations(&self) -> Result<DestinationRegistry> {
    self.load(Table::Destinations).await
  }

  async fn save_destinations(&self, destinations: &DestinationRegistry) -> Result<()> {
    self.save(Table::Destinations, destinations).await
  }

  async fn load_overrides(&self) -> Result<OverrideMap> {
    self.load(Table::Overrides).await
  }

  async fn save_overrides(&self, overrides: &OverrideMap) -> Result<()> {
    self.save(Table::Overrides, overrides).await
  }

  async fn load_last_fired(&self) -> Result<Option<NaiveDate>> {
    self.load(Table::LastFired).await
  }

  async fn save_last_fired(&self, day: NaiveDate) -> Result<()> {
    self.save(Table::LastFired, &Some(day)).await
  }

  async fn load_allowed_roles(&self) -> Result<RoleAllowList> {
    self.load(Table::AllowedRoles).await
  }

  async fn save_allowed_roles(&self, roles: &RoleAllowList) -> Result<()> {
    self.save(Table::AllowedRoles, roles).await
  }
}
