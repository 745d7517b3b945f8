//! Administrative commands: authorization and the operations behind them.
//!
//! Every mutating command checks [`is_authorized`] first and takes the
//! station exclusively, so a rejected command never touches state and an
//! accepted one never interleaves with a firing.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
  Error,
  announce::Announcer,
  catalog::CatalogSource,
  state::{CommunityId, DestinationId, RoleAllowList},
  station::{FireOutcome, Station},
  store::StateStore,
  track::TrackId,
};

// ─── Actors ──────────────────────────────────────────────────────────────────

/// The identity invoking a command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub name:          String,
  /// Holds the community-wide administrator permission.
  pub administrator: bool,
  /// Role names the actor holds.
  pub roles:         BTreeSet<String>,
}

/// Administrator, or holder of a role on `community`'s allow-list.
pub fn is_authorized(
  actor: &Actor,
  community: &CommunityId,
  allow_list: &RoleAllowList,
) -> bool {
  actor.administrator
    || allow_list
      .get(community)
      .is_some_and(|allowed| !allowed.is_disjoint(&actor.roles))
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// A rejected or failed command. `Display` is the user-facing message.
#[derive(Debug, Error)]
pub enum CommandError {
  #[error("Permission denied.")]
  Unauthorized,

  #[error("Invalid date format (YYYY-MM-DD).")]
  InvalidDate(String),

  #[error("Invalid Spotify track reference.")]
  InvalidTrackReference(String),

  #[error("Role name must not be empty.")]
  InvalidRole,

  #[error("Nothing scheduled for that date.")]
  NotScheduled(NaiveDate),

  #[error(transparent)]
  Failed(#[from] Error),
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
  NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
    .map_err(|_| CommandError::InvalidDate(input.to_owned()))
}

fn parse_track(input: &str) -> Result<TrackId, CommandError> {
  TrackId::parse_reference(input)
    .ok_or_else(|| CommandError::InvalidTrackReference(input.to_owned()))
}

fn parse_role(input: &str) -> Result<String, CommandError> {
  let role = input.trim();
  if role.is_empty() {
    return Err(CommandError::InvalidRole);
  }
  Ok(role.to_owned())
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// One pending override, as listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEntry {
  pub date:     NaiveDate,
  pub track_id: TrackId,
}

/// Result of scheduling an override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduled {
  pub date:     NaiveDate,
  pub track_id: TrackId,
  /// The override previously held by that date, if any.
  pub replaced: Option<TrackId>,
}

// ─── Commands ────────────────────────────────────────────────────────────────

impl<S, C, A> Station<S, C, A>
where
  S: StateStore,
  C: CatalogSource,
  A: Announcer,
{
  async fn authorize(
    &self,
    actor: &Actor,
    community: &CommunityId,
  ) -> Result<(), CommandError> {
    let allow_list =
      self.store().load_allowed_roles().await.map_err(Error::store)?;
    if is_authorized(actor, community, &allow_list) {
      Ok(())
    } else {
      info!(actor = %actor.name, %community, "command refused");
      Err(CommandError::Unauthorized)
    }
  }

  /// Set the announcement destination for `community`, replacing any
  /// previous one.
  pub async fn register_destination(
    &self,
    actor: &Actor,
    community: &CommunityId,
    destination: DestinationId,
  ) -> Result<(), CommandError> {
    let _guard = self.exclusive().await;
    self.authorize(actor, community).await?;

    let mut destinations =
      self.store().load_destinations().await.map_err(Error::store)?;
    destinations.insert(community.clone(), destination.clone());
    self
      .store()
      .save_destinations(&destinations)
      .await
      .map_err(Error::store)?;

    info!(actor = %actor.name, %community, %destination, "destination registered");
    Ok(())
  }

  /// Schedule `reference` for `date`, replacing any override on that date.
  pub async fn schedule_override(
    &self,
    actor: &Actor,
    community: &CommunityId,
    date: &str,
    reference: &str,
  ) -> Result<Scheduled, CommandError> {
    let _guard = self.exclusive().await;
    self.authorize(actor, community).await?;
    let date = parse_date(date)?;
    let track_id = parse_track(reference)?;

    let mut overrides =
      self.store().load_overrides().await.map_err(Error::store)?;
    let replaced = overrides.insert(date, track_id.clone());
    self.store().save_overrides(&overrides).await.map_err(Error::store)?;

    info!(actor = %actor.name, %date, track = %track_id, "override scheduled");
    Ok(Scheduled { date, track_id, replaced })
  }

  /// Remove the override for `date`, returning what it held.
  pub async fn unschedule_override(
    &self,
    actor: &Actor,
    community: &CommunityId,
    date: &str,
  ) -> Result<ScheduledEntry, CommandError> {
    let _guard = self.exclusive().await;
    self.authorize(actor, community).await?;
    let date = parse_date(date)?;

    let mut overrides =
      self.store().load_overrides().await.map_err(Error::store)?;
    let Some(track_id) = overrides.remove(&date) else {
      return Err(CommandError::NotScheduled(date));
    };
    self.store().save_overrides(&overrides).await.map_err(Error::store)?;

    info!(actor = %actor.name, %date, track = %track_id, "override removed");
    Ok(ScheduledEntry { date, track_id })
  }

  /// Every pending override, earliest first. Not gated.
  pub async fn list_overrides(&self) -> Result<Vec<ScheduledEntry>, CommandError> {
    let overrides = self.store().load_overrides().await.map_err(Error::store)?;
    Ok(
      overrides
        .into_iter()
        .map(|(date, track_id)| ScheduledEntry { date, track_id })
        .collect(),
    )
  }

  /// Remove every override, returning how many there were.
  pub async fn clear_overrides(
    &self,
    actor: &Actor,
    community: &CommunityId,
  ) -> Result<usize, CommandError> {
    let _guard = self.exclusive().await;
    self.authorize(actor, community).await?;

    let overrides = self.store().load_overrides().await.map_err(Error::store)?;
    let cleared = overrides.len();
    self
      .store()
      .save_overrides(&Default::default())
      .await
      .map_err(Error::store)?;

    info!(actor = %actor.name, cleared, "overrides cleared");
    Ok(cleared)
  }

  /// Run the pipeline now, outside the daily window. The last-fired date is
  /// neither read nor written.
  pub async fn force_fire(
    &self,
    actor: &Actor,
    community: &CommunityId,
    today: NaiveDate,
  ) -> Result<FireOutcome, CommandError> {
    let _guard = self.exclusive().await;
    self.authorize(actor, community).await?;

    info!(actor = %actor.name, %community, %today, "manual firing");
    Ok(self.fire_locked(today).await?)
  }

  // ── Role allow-list ───────────────────────────────────────────────────

  /// Roles allowed to run commands in `community`.
  pub async fn list_roles(
    &self,
    actor: &Actor,
    community: &CommunityId,
  ) -> Result<BTreeSet<String>, CommandError> {
    self.authorize(actor, community).await?;
    let mut allow_list =
      self.store().load_allowed_roles().await.map_err(Error::store)?;
    Ok(allow_list.remove(community).unwrap_or_default())
  }

  /// Allow `role` in `community`. Administrators only. Returns `false` if
  /// the role was already allowed.
  pub async fn allow_role(
    &self,
    actor: &Actor,
    community: &CommunityId,
    role: &str,
  ) -> Result<bool, CommandError> {
    let _guard = self.exclusive().await;
    if !actor.administrator {
      return Err(CommandError::Unauthorized);
    }
    let role = parse_role(role)?;

    let mut allow_list =
      self.store().load_allowed_roles().await.map_err(Error::store)?;
    let added = allow_list
      .entry(community.clone())
      .or_default()
      .insert(role.clone());
    if added {
      self
        .store()
        .save_allowed_roles(&allow_list)
        .await
        .map_err(Error::store)?;
      info!(actor = %actor.name, %community, %role, "role allowed");
    }
    Ok(added)
  }

  /// Remove `role` from `community`'s allow-list. Administrators only.
  /// Returns `false` if the role was not on it.
  pub async fn disallow_role(
    &self,
    actor: &Actor,
    community: &CommunityId,
    role: &str,
  ) -> Result<bool, CommandError> {
    let _guard = self.exclusive().await;
    if !actor.administrator {
      return Err(CommandError::Unauthorized);
    }
    let role = parse_role(role)?;

    let mut allow_list =
      self.store().load_allowed_roles().await.map_err(Error::store)?;
    let removed = match allow_list.get_mut(community) {
      Some(roles) => {
        let removed = roles.remove(&role);
        if roles.is_empty() {
          allow_list.remove(community);
        }
        removed
      }
      None => false,
    };
    if removed {
      self
        .store()
        .save_allowed_roles(&allow_list)
        .await
        .map_err(Error::store)?;
      info!(actor = %actor.name, %community, %role, "role disallowed");
    }
    Ok(removed)
  }
}
