//! The `StateStore` trait.
//!
//! Implemented by storage backends (e.g. `sotd-store-json`, and
//! [`MemoryStore`](crate::memory::MemoryStore) for tests). The engine depends
//! on this abstraction only.
//!
//! Loads never fail because a document is missing or corrupt: backends
//! return the empty default instead, persisting it when they had to discard
//! a damaged document. Saves overwrite the whole table.

use std::future::Future;

use chrono::NaiveDate;

use crate::state::{DestinationRegistry, OverrideMap, RoleAllowList, UsedSet};

/// Durable storage for the service's tables.
pub trait StateStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Used tracks ───────────────────────────────────────────────────────

  fn load_used(
    &self,
  ) -> impl Future<Output = Result<UsedSet, Self::Error>> + Send + '_;

  fn save_used<'a>(
    &'a self,
    used: &'a UsedSet,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Destinations ──────────────────────────────────────────────────────

  fn load_destinations(
    &self,
  ) -> impl Future<Output = Result<DestinationRegistry, Self::Error>> + Send + '_;

  fn save_destinations<'a>(
    &'a self,
    destinations: &'a DestinationRegistry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Scheduled overrides ───────────────────────────────────────────────

  fn load_overrides(
    &self,
  ) -> impl Future<Output = Result<OverrideMap, Self::Error>> + Send + '_;

  fn save_overrides<'a>(
    &'a self,
    overrides: &'a OverrideMap,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Last fired date ───────────────────────────────────────────────────

  /// The last day the daily trigger completed a firing, if ever.
  fn load_last_fired(
    &self,
  ) -> impl Future<Output = Result<Option<NaiveDate>, Self::Error>> + Send + '_;

  fn save_last_fired(
    &self,
    day: NaiveDate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Role allow-list ───────────────────────────────────────────────────

  fn load_allowed_roles(
    &self,
  ) -> impl Future<Output = Result<RoleAllowList, Self::Error>> + Send + '_;

  fn save_allowed_roles<'a>(
    &'a self,
    roles: &'a RoleAllowList,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
