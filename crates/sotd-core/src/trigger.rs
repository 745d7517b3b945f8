//! The once-per-day trigger.
//!
//! A host loop calls [`DailyTrigger::tick`] at a fixed poll interval with the
//! current local time. The trigger fires the station when the time falls in
//! the configured window and the persisted last-fired date is not today,
//! then records today. Failed firings are not recorded, so the next tick
//! inside the window retries. A firing that succeeded but could not be
//! recorded is remembered in memory and never repeated.
//!
//! The window never extends past midnight; a post time late in the evening
//! simply gets a shorter window.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  announce::Announcer,
  catalog::CatalogSource,
  station::{FireOutcome, Station},
  store::StateStore,
};

// ─── Clock ───────────────────────────────────────────────────────────────────

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
  fn now(&self) -> NaiveDateTime;
}

/// The host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> NaiveDateTime { Local::now().naive_local() }
}

// ─── Schedule ────────────────────────────────────────────────────────────────

/// Post time plus the length of the window after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
  post_at: NaiveTime,
  window:  TimeDelta,
}

impl DailySchedule {
  /// A zero-length window is widened to one minute.
  pub fn new(post_at: NaiveTime, window_minutes: u32) -> Self {
    Self {
      post_at,
      window: TimeDelta::minutes(i64::from(window_minutes.max(1))),
    }
  }

  /// Parse `"HH:MM"` or `"HH:MM:SS"`.
  pub fn parse_post_time(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M")
      .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
      .ok()
  }

  pub fn post_at(&self) -> NaiveTime { self.post_at }

  /// Whether `now` lies in `[post_at, post_at + window)` on its own date.
  pub fn in_window(&self, now: NaiveDateTime) -> bool {
    let start = now.date().and_time(self.post_at);
    now >= start && now < start + self.window
  }
}

/// Whether a firing is due at `now` given the last recorded firing.
///
/// A last-fired date after today (clock moved backwards) counts as fired.
pub fn should_fire(
  schedule: &DailySchedule,
  now: NaiveDateTime,
  last_fired: Option<NaiveDate>,
) -> bool {
  schedule.in_window(now) && last_fired.is_none_or(|last| last < now.date())
}

// ─── Trigger ─────────────────────────────────────────────────────────────────

/// Where the trigger is in its daily cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPhase {
  /// Outside the window, or already fired today.
  #[default]
  Idle,
  /// Inside the window with today's firing still outstanding.
  WindowOpen,
  Firing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
  OutsideWindow,
  AlreadyFired,
  Fired(FireOutcome),
}

pub struct DailyTrigger {
  schedule:   DailySchedule,
  phase:      watch::Sender<TriggerPhase>,
  /// A day whose firing completed but whose date is not yet persisted.
  unrecorded: Mutex<Option<NaiveDate>>,
}

impl DailyTrigger {
  pub fn new(schedule: DailySchedule) -> Self {
    Self {
      schedule,
      phase: watch::Sender::new(TriggerPhase::Idle),
      unrecorded: Mutex::new(None),
    }
  }

  pub fn schedule(&self) -> &DailySchedule { &self.schedule }

  /// Observe the phase from another task.
  pub fn subscribe(&self) -> watch::Receiver<TriggerPhase> {
    self.phase.subscribe()
  }

  pub fn phase(&self) -> TriggerPhase { *self.phase.borrow() }

  fn enter(&self, phase: TriggerPhase) {
    self.phase.send_if_modified(|current| {
      let changed = *current != phase;
      *current = phase;
      changed
    });
  }

  fn unrecorded(&self) -> MutexGuard<'_, Option<NaiveDate>> {
    self.unrecorded.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Evaluate the trigger at `now`, firing the station when due.
  ///
  /// The station stays exclusively held from re-reading the last-fired date
  /// until today is recorded, so a concurrent force-fire cannot slip in
  /// between. A firing whose date could not be saved is not repeated; later
  /// ticks only retry the save.
  pub async fn tick<S, C, A>(
    &self,
    station: &Station<S, C, A>,
    now: NaiveDateTime,
  ) -> Result<TickOutcome>
  where
    S: StateStore,
    C: CatalogSource,
    A: Announcer,
  {
    if !self.schedule.in_window(now) {
      self.enter(TriggerPhase::Idle);
      return Ok(TickOutcome::OutsideWindow);
    }
    if !self.due(station, now).await? {
      return Ok(TickOutcome::AlreadyFired);
    }

    self.enter(TriggerPhase::WindowOpen);
    let _guard = station.exclusive().await;
    if !self.due(station, now).await? {
      return Ok(TickOutcome::AlreadyFired);
    }

    let today = now.date();
    let pending = *self.unrecorded();
    if pending == Some(today) {
      self.record(station, today).await?;
      return Ok(TickOutcome::AlreadyFired);
    }

    info!(%today, post_at = %self.schedule.post_at, "daily window open");
    self.enter(TriggerPhase::Firing);
    let outcome = match station.fire_locked(today).await {
      Ok(outcome) => outcome,
      Err(e) => {
        self.enter(TriggerPhase::WindowOpen);
        return Err(e);
      }
    };

    *self.unrecorded() = Some(today);
    self.record(station, today).await?;
    Ok(TickOutcome::Fired(outcome))
  }

  /// Whether the persisted date leaves today's firing outstanding. Moves to
  /// `Idle` when it does not.
  async fn due<S, C, A>(
    &self,
    station: &Station<S, C, A>,
    now: NaiveDateTime,
  ) -> Result<bool>
  where
    S: StateStore,
    C: CatalogSource,
    A: Announcer,
  {
    let today = now.date();
    let last_fired =
      station.store().load_last_fired().await.map_err(Error::store)?;
    if should_fire(&self.schedule, now, last_fired) {
      return Ok(true);
    }

    if let Some(last) = last_fired.filter(|last| *last > today) {
      warn!(%last, %today, "last firing is dated in the future; not firing");
    } else {
      debug!(%today, "already fired today");
    }
    *self.unrecorded() = None;
    self.enter(TriggerPhase::Idle);
    Ok(false)
  }

  /// Persist `today` as fired.
  async fn record<S, C, A>(
    &self,
    station: &Station<S, C, A>,
    today: NaiveDate,
  ) -> Result<()>
  where
    S: StateStore,
    C: CatalogSource,
    A: Announcer,
  {
    if let Err(e) = station.store().save_last_fired(today).await {
      warn!(%today, "announced but the date was not saved; retrying the save");
      self.enter(TriggerPhase::WindowOpen);
      return Err(Error::store(e));
    }
    *self.unrecorded() = None;
    self.enter(TriggerPhase::Idle);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    memory::Tables,
    station::tests::{FixedCatalog, day, one_destination, station},
    track::TrackId,
  };

  fn at(d: u32, hh: u32, mm: u32) -> NaiveDateTime {
    day(d).and_hms_opt(hh, mm, 0).unwrap()
  }

  fn nine_oclock() -> DailyTrigger {
    DailyTrigger::new(DailySchedule::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap(), 60))
  }

  #[test]
  fn post_time_parses_both_forms() {
    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    assert_eq!(DailySchedule::parse_post_time("09:00"), Some(nine));
    assert_eq!(DailySchedule::parse_post_time(" 09:00:00 "), Some(nine));
    assert_eq!(DailySchedule::parse_post_time("9am"), None);
    assert_eq!(DailySchedule::parse_post_time("25:00"), None);
  }

  #[test]
  fn window_is_half_open() {
    let schedule = *nine_oclock().schedule();
    assert!(!schedule.in_window(at(1, 8, 59)));
    assert!(schedule.in_window(at(1, 9, 0)));
    assert!(schedule.in_window(at(1, 9, 59)));
    assert!(!schedule.in_window(at(1, 10, 0)));
  }

  #[test]
  fn window_stops_at_midnight() {
    let late = DailySchedule::new(NaiveTime::from_hms_opt(23, 30, 0).unwrap(), 120);
    assert!(late.in_window(at(1, 23, 45)));
    assert!(!late.in_window(at(2, 0, 15)));
  }

  #[test]
  fn should_fire_respects_last_fired() {
    let schedule = *nine_oclock().schedule();
    let now = at(5, 9, 10);
    assert!(should_fire(&schedule, now, None));
    assert!(should_fire(&schedule, now, Some(day(4))));
    assert!(!should_fire(&schedule, now, Some(day(5))));
    assert!(!should_fire(&schedule, now, Some(day(6))));
    assert!(!should_fire(&schedule, at(5, 11, 0), None));
  }

  #[tokio::test]
  async fn fires_once_per_day() {
    let (station, store) = station(one_destination(), FixedCatalog::of(&["a", "b", "c"]));
    let trigger = nine_oclock();

    let first = trigger.tick(&station, at(1, 9, 0)).await.unwrap();
    assert!(matches!(first, TickOutcome::Fired(FireOutcome::Announced { .. })));

    for minute in [1, 2, 30, 59] {
      let again = trigger.tick(&station, at(1, 9, minute)).await.unwrap();
      assert_eq!(again, TickOutcome::AlreadyFired);
    }

    assert_eq!(station_sends(&station), 1);
    assert_eq!(store.snapshot().last_fired, Some(day(1)));
    assert_eq!(trigger.phase(), TriggerPhase::Idle);
  }

  #[tokio::test]
  async fn fires_again_the_next_day() {
    let (station, store) = station(one_destination(), FixedCatalog::of(&["a", "b"]));
    let trigger = nine_oclock();

    trigger.tick(&station, at(1, 9, 5)).await.unwrap();
    assert_eq!(
      trigger.tick(&station, at(1, 14, 0)).await.unwrap(),
      TickOutcome::OutsideWindow,
    );
    trigger.tick(&station, at(2, 9, 5)).await.unwrap();

    assert_eq!(station_sends(&station), 2);
    assert_eq!(store.snapshot().last_fired, Some(day(2)));
    assert_eq!(store.snapshot().used.len(), 2);
  }

  #[tokio::test]
  async fn failed_fetch_is_retried_within_the_window() {
    let catalog = FixedCatalog { fail: true, ..FixedCatalog::of(&["a"]) };
    let (station, store) = station(one_destination(), catalog);
    let trigger = nine_oclock();
    let phase = trigger.subscribe();

    let err = trigger.tick(&station, at(1, 9, 0)).await.unwrap_err();
    assert!(matches!(err, Error::Catalog(_)));
    assert_eq!(store.snapshot().last_fired, None);
    assert_eq!(*phase.borrow(), TriggerPhase::WindowOpen);

    trigger.tick(&station, at(1, 9, 1)).await.unwrap_err();
    assert_eq!(station.catalog_fetches(), 2);
  }

  #[tokio::test]
  async fn future_last_fired_is_not_rewound() {
    let mut tables = one_destination();
    tables.last_fired = Some(day(20));
    let (station, store) = station(tables, FixedCatalog::of(&["a"]));
    let trigger = nine_oclock();

    let outcome = trigger.tick(&station, at(10, 9, 0)).await.unwrap();

    assert_eq!(outcome, TickOutcome::AlreadyFired);
    assert_eq!(store.snapshot().last_fired, Some(day(20)));
    assert_eq!(store.write_count(), 0);
  }

  #[tokio::test]
  async fn firing_without_destinations_still_counts() {
    let (station, store) = station(Tables::default(), FixedCatalog::of(&["a"]));
    let trigger = nine_oclock();

    let outcome = trigger.tick(&station, at(1, 9, 0)).await.unwrap();

    assert_eq!(outcome, TickOutcome::Fired(FireOutcome::NoDestinations));
    let after = store.snapshot();
    assert_eq!(after.last_fired, Some(day(1)));
    assert!(after.used.is_empty());
  }

  #[tokio::test]
  async fn manual_fire_leaves_last_fired_alone() {
    let (station, store) = station(one_destination(), FixedCatalog::of(&["a", "b"]));
    let trigger = nine_oclock();

    station.fire(day(1)).await.unwrap();
    assert_eq!(store.snapshot().last_fired, None);

    // The daily firing still happens afterwards.
    let outcome = trigger.tick(&station, at(1, 9, 0)).await.unwrap();
    assert!(matches!(outcome, TickOutcome::Fired(_)));
    assert_eq!(station_sends(&station), 2);
  }

  #[tokio::test]
  async fn scheduled_override_is_used_by_the_daily_firing() {
    let mut tables = one_destination();
    tables.overrides = [(day(3), TrackId::from("b"))].into_iter().collect();
    let (station, store) = station(tables, FixedCatalog::of(&["a", "b", "c"]));

    nine_oclock().tick(&station, at(3, 9, 0)).await.unwrap();

    let after = store.snapshot();
    assert!(after.overrides.is_empty());
    assert!(after.used.contains(&TrackId::from("b")));
  }

  #[tokio::test]
  async fn unsaved_day_is_not_fired_again() {
    let (station, store) = station(one_destination(), FixedCatalog::of(&["a", "b", "c"]));
    store.reject_last_fired(true);
    let trigger = nine_oclock();

    let err = trigger.tick(&station, at(1, 9, 0)).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    for minute in 1..=3 {
      trigger.tick(&station, at(1, 9, minute)).await.unwrap_err();
    }

    assert_eq!(station_sends(&station), 1);
    assert_eq!(station.catalog_fetches(), 1);
    assert_eq!(store.snapshot().used.len(), 1);
    assert_eq!(trigger.phase(), TriggerPhase::WindowOpen);

    // Once the store recovers only the date is written.
    store.reject_last_fired(false);
    let outcome = trigger.tick(&station, at(1, 9, 4)).await.unwrap();
    assert_eq!(outcome, TickOutcome::AlreadyFired);
    assert_eq!(store.snapshot().last_fired, Some(day(1)));
    assert_eq!(station_sends(&station), 1);
    assert_eq!(trigger.phase(), TriggerPhase::Idle);

    // The next day fires normally.
    trigger.tick(&station, at(2, 9, 0)).await.unwrap();
    assert_eq!(station_sends(&station), 2);
  }

  #[tokio::test]
  async fn window_open_while_waiting_for_the_station() {
    let (station, _store) = station(one_destination(), FixedCatalog::of(&["a"]));
    let trigger = nine_oclock();

    let busy = station.exclusive().await;
    let tick = trigger.tick(&station, at(1, 9, 0));
    tokio::pin!(tick);
    let waited =
      tokio::time::timeout(std::time::Duration::from_millis(20), &mut tick).await;
    assert!(waited.is_err());
    assert_eq!(trigger.phase(), TriggerPhase::WindowOpen);

    drop(busy);
    let outcome = tick.await.unwrap();
    assert!(matches!(outcome, TickOutcome::Fired(FireOutcome::Announced { .. })));
    assert_eq!(trigger.phase(), TriggerPhase::Idle);
  }

  fn station_sends(station: &crate::station::tests::TestStation) -> usize {
    station.announcer_sent().len()
  }
}
