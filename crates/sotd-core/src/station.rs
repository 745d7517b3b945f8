//! [`Station`]: the select-then-announce pipeline over the three seams.
//!
//! Both the daily trigger and the force-fire command run [`Station::fire`].
//! Firings and state-mutating commands are serialised behind one async
//! mutex, so their read-modify-write cycles never interleave at `.await`
//! points inside a single process.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::{
  Error, Result,
  announce::{Announcer, DispatchReport, dispatch},
  catalog::CatalogSource,
  selection::{Selection, select_track_for_today},
  store::StateStore,
  track::Track,
  trigger::TriggerPhase,
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What one firing did. None of these are errors; every variant counts as a
/// completed firing for the daily trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FireOutcome {
  /// No community has registered a destination; selection was skipped so
  /// no track is used up.
  NoDestinations,
  /// The selection engine produced no track (empty catalog or a dangling
  /// override).
  NothingSelected { selection: Selection },
  Announced {
    selection: Selection,
    report:    DispatchReport,
  },
}

/// Snapshot of the persisted state plus the trigger phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationStatus {
  pub trigger:           TriggerPhase,
  pub last_fired:        Option<NaiveDate>,
  pub pending_overrides: usize,
  pub used_tracks:       usize,
  pub destinations:      usize,
}

// ─── Station ─────────────────────────────────────────────────────────────────

pub struct Station<S, C, A> {
  store:       S,
  catalog:     C,
  announcer:   A,
  playlist_id: String,
  serial:      Mutex<()>,
}

impl<S, C, A> Station<S, C, A>
where
  S: StateStore,
  C: CatalogSource,
  A: Announcer,
{
  pub fn new(
    store: S,
    catalog: C,
    announcer: A,
    playlist_id: impl Into<String>,
  ) -> Self {
    Self {
      store,
      catalog,
      announcer,
      playlist_id: playlist_id.into(),
      serial: Mutex::new(()),
    }
  }

  pub fn store(&self) -> &S { &self.store }

  /// Hold the station exclusively until the guard is dropped.
  pub(crate) async fn exclusive(&self) -> MutexGuard<'_, ()> {
    self.serial.lock().await
  }

  /// Run the full pipeline for `today`.
  ///
  /// Does not consult or record the last-fired date; that is the daily
  /// trigger's job.
  pub async fn fire(&self, today: NaiveDate) -> Result<FireOutcome> {
    let _guard = self.exclusive().await;
    self.fire_locked(today).await
  }

  /// [`fire`](Self::fire) for callers already holding
  /// [`exclusive`](Self::exclusive).
  pub(crate) async fn fire_locked(&self, today: NaiveDate) -> Result<FireOutcome> {
    let destinations =
      self.store.load_destinations().await.map_err(Error::store)?;
    if destinations.is_empty() {
      info!("no destinations registered; skipping selection");
      return Ok(FireOutcome::NoDestinations);
    }

    let catalog = self
      .catalog
      .fetch_catalog(&self.playlist_id)
      .await
      .map_err(Error::catalog)?;

    // State is flushed before anything is sent.
    let selection = self.select_and_persist(&catalog, today).await?;

    let Some(kind) = selection.pick_kind() else {
      return Ok(FireOutcome::NothingSelected { selection });
    };
    let report = match selection.track() {
      Some(track) => {
        dispatch(&self.announcer, &destinations, track, kind, today).await
      }
      None => DispatchReport::default(),
    };

    info!(
      delivered = report.delivered(),
      destinations = destinations.len(),
      "song of the day announced",
    );
    Ok(FireOutcome::Announced { selection, report })
  }

  /// Load used-set and overrides, select, and save whichever table changed.
  async fn select_and_persist(
    &self,
    catalog: &[Track],
    today: NaiveDate,
  ) -> Result<Selection> {
    let mut used = self.store.load_used().await.map_err(Error::store)?;
    let mut overrides = self.store.load_overrides().await.map_err(Error::store)?;
    let (used_before, overrides_before) = (used.clone(), overrides.clone());

    let selection = {
      let mut rng = rand::thread_rng();
      select_track_for_today(catalog, &mut used, &mut overrides, today, &mut rng)
    };

    if overrides != overrides_before {
      self.store.save_overrides(&overrides).await.map_err(Error::store)?;
    }
    if used != used_before {
      self.store.save_used(&used).await.map_err(Error::store)?;
    }

    match &selection {
      Selection::Scheduled { date, track } => {
        info!(%date, track = %track.id, "scheduled pick");
      }
      Selection::Random { track, wrapped } => {
        if *wrapped {
          info!(tracks = catalog.len(), "every track used; starting over");
        }
        info!(track = %track.id, "random pick");
      }
      Selection::DanglingOverride { date, track_id } => {
        warn!(
          %date,
          track = %track_id,
          "scheduled track is no longer in the playlist; skipping the day",
        );
      }
      Selection::EmptyCatalog => warn!("playlist has no tracks"),
    }

    Ok(selection)
  }

  /// Summarise the persisted state.
  pub async fn status(&self, trigger: TriggerPhase) -> Result<StationStatus> {
    let last_fired = self.store.load_last_fired().await.map_err(Error::store)?;
    let overrides = self.store.load_overrides().await.map_err(Error::store)?;
    let used = self.store.load_used().await.map_err(Error::store)?;
    let destinations =
      self.store.load_destinations().await.map_err(Error::store)?;

    Ok(StationStatus {
      trigger,
      last_fired,
      pending_overrides: overrides.len(),
      used_tracks: used.len(),
      destinations: destinations.len(),
    })
  }
}
