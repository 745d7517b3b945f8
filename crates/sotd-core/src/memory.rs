//! In-memory [`StateStore`] used by tests throughout the workspace.

use std::sync::{
  Arc, Mutex, MutexGuard,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use chrono::NaiveDate;
use thiserror::Error;

use crate::{
  state::{DestinationRegistry, OverrideMap, RoleAllowList, UsedSet},
  store::StateStore,
};

#[derive(Debug, Error)]
#[error("memory store rejected the write")]
pub struct WriteRejected;

/// Contents of every table at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables {
  pub used:          UsedSet,
  pub destinations:  DestinationRegistry,
  pub overrides:     OverrideMap,
  pub last_fired:    Option<NaiveDate>,
  pub allowed_roles: RoleAllowList,
}

/// A [`StateStore`] that keeps everything in process memory.
///
/// Cloning is cheap and clones share the same tables, so a test can keep a
/// handle for inspection after moving the store into the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  tables:      Arc<Mutex<Tables>>,
  writes:      Arc<AtomicUsize>,
  fail_writes: Arc<AtomicBool>,
  fail_mark:   Arc<AtomicBool>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn with_tables(tables: Tables) -> Self {
    Self {
      tables: Arc::new(Mutex::new(tables)),
      ..Self::default()
    }
  }

  /// Copy of the current tables.
  pub fn snapshot(&self) -> Tables { self.lock().clone() }

  /// Number of successful saves across all tables.
  pub fn write_count(&self) -> usize { self.writes.load(Ordering::SeqCst) }

  /// Make every subsequent save fail, to exercise I/O error paths.
  pub fn reject_writes(&self, reject: bool) {
    self.fail_writes.store(reject, Ordering::SeqCst);
  }

  /// Make only [`StateStore::save_last_fired`] fail.
  pub fn reject_last_fired(&self, reject: bool) {
    self.fail_mark.store(reject, Ordering::SeqCst);
  }

  fn lock(&self) -> MutexGuard<'_, Tables> {
    // A panic while holding the lock only happens inside a failing test.
    self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn write(&self, f: impl FnOnce(&mut Tables)) -> Result<(), WriteRejected> {
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(WriteRejected);
    }
    f(&mut self.lock());
    self.writes.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

impl StateStore for MemoryStore {
  type Error = WriteRejected;

  async fn load_used(&self) -> Result<UsedSet, WriteRejected> {
    Ok(self.lock().used.clone())
  }

  async fn save_used(&self, used: &UsedSet) -> Result<(), WriteRejected> {
    self.write(|t| t.used = used.clone())
  }

  async fn load_destinations(
    &self,
  ) -> Result<DestinationRegistry, WriteRejected> {
    Ok(self.lock().destinations.clone())
  }

  async fn save_destinations(
    &self,
    destinations: &DestinationRegistry,
  ) -> Result<(), WriteRejected> {
    self.write(|t| t.destinations = destinations.clone())
  }

  async fn load_overrides(&self) -> Result<OverrideMap, WriteRejected> {
    Ok(self.lock().overrides.clone())
  }

  async fn save_overrides(
    &self,
    overrides: &OverrideMap,
  ) -> Result<(), WriteRejected> {
    self.write(|t| t.overrides = overrides.clone())
  }

  async fn load_last_fired(&self) -> Result<Option<NaiveDate>, WriteRejected> {
    Ok(self.lock().last_fired)
  }

  async fn save_last_fired(&self, day: NaiveDate) -> Result<(), WriteRejected> {
    if self.fail_mark.load(Ordering::SeqCst) {
      return Err(WriteRejected);
    }
    self.write(|t| t.last_fired = Some(day))
  }

  async fn load_allowed_roles(&self) -> Result<RoleAllowList, WriteRejected> {
    Ok(self.lock().allowed_roles.clone())
  }

  async fn save_allowed_roles(
    &self,
    roles: &RoleAllowList,
  ) -> Result<(), WriteRejected> {
    self.write(|t| t.allowed_roles = roles.clone())
  }
}
