//! Choosing the track for a given day.
//!
//! Priority order:
//!
//! 1. An empty catalog yields [`Selection::EmptyCatalog`] and touches nothing.
//! 2. The earliest *due* override (date ≤ today) is consumed. If its id is
//!    still in the catalog that track is the pick; otherwise the day yields
//!    [`Selection::DanglingOverride`] with no random fallback.
//! 3. Otherwise a track is drawn uniformly from the catalog minus the used
//!    set, clearing the used set first when nothing is left.
//!
//! Every produced track is added to the used set, including scheduled ones.

use chrono::NaiveDate;
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{
  announce::PickKind,
  state::{OverrideMap, UsedSet},
  track::{Track, TrackId},
};

/// What the selection engine decided for a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
  /// A due override resolved to a catalog track.
  Scheduled { date: NaiveDate, track: Track },
  /// A uniformly random eligible track. `wrapped` is set when the used set
  /// had covered the whole catalog and was cleared first.
  Random { track: Track, wrapped: bool },
  /// A due override pointed at a track no longer in the catalog. The
  /// override was consumed and nothing is announced.
  DanglingOverride { date: NaiveDate, track_id: TrackId },
  /// The catalog had no tracks.
  EmptyCatalog,
}

impl Selection {
  pub fn track(&self) -> Option<&Track> {
    match self {
      Self::Scheduled { track, .. } | Self::Random { track, .. } => Some(track),
      Self::DanglingOverride { .. } | Self::EmptyCatalog => None,
    }
  }

  pub fn pick_kind(&self) -> Option<PickKind> {
    match self {
      Self::Scheduled { .. } => Some(PickKind::Scheduled),
      Self::Random { .. } => Some(PickKind::Random),
      Self::DanglingOverride { .. } | Self::EmptyCatalog => None,
    }
  }
}

/// Resolve the track for `today`, updating `used` and `overrides` in place.
pub fn select_track_for_today<R: Rng + ?Sized>(
  catalog: &[Track],
  used: &mut UsedSet,
  overrides: &mut OverrideMap,
  today: NaiveDate,
  rng: &mut R,
) -> Selection {
  if catalog.is_empty() {
    return Selection::EmptyCatalog;
  }

  // Keys are ordered, so the first entry is the earliest date.
  let due = overrides
    .first_key_value()
    .map(|(date, _)| *date)
    .filter(|date| *date <= today);
  if let Some((date, track_id)) = due.and_then(|d| overrides.remove_entry(&d)) {
    return match catalog.iter().find(|t| t.id == track_id) {
      Some(track) => {
        used.insert(track.id.clone());
        Selection::Scheduled { date, track: track.clone() }
      }
      None => Selection::DanglingOverride { date, track_id },
    };
  }

  let mut eligible: Vec<&Track> =
    catalog.iter().filter(|t| !used.contains(&t.id)).collect();
  let wrapped = eligible.is_empty();
  if wrapped {
    used.clear();
    eligible = catalog.iter().collect();
  }

  match eligible.choose(rng) {
    Some(track) => {
      used.insert(track.id.clone());
      Selection::Random { track: (*track).clone(), wrapped }
    }
    None => Selection::EmptyCatalog,
  }
}

#[cfg(test)]
mod tests {
  use std::collections::{BTreeSet, HashMap};

  use rand::{SeedableRng, rngs::StdRng};

  use super::*;

  fn track(id: &str) -> Track {
    Track {
      id:          TrackId::from(id),
      title:       format!("Song {id}"),
      artists:     vec!["Artist".into()],
      artwork_url: Some(format!("https://i.scdn.co/image/{id}")),
      url:         format!("https://open.spotify.com/track/{id}"),
    }
  }

  fn catalog(n: usize) -> Vec<Track> {
    (0..n).map(|i| track(&format!("t{i}"))).collect()
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn rng() -> StdRng { StdRng::seed_from_u64(7) }

  #[test]
  fn random_picks_never_repeat_until_exhausted() {
    let catalog = catalog(25);
    let mut used = UsedSet::new();
    let mut overrides = OverrideMap::new();
    let mut rng = rng();
    let today = date(2026, 1, 1);

    let mut seen = BTreeSet::new();
    for _ in 0..catalog.len() {
      let selection =
        select_track_for_today(&catalog, &mut used, &mut overrides, today, &mut rng);
      let (track, wrapped) = match selection {
        Selection::Random { track, wrapped } => (track, wrapped),
        other => panic!("expected a random pick, got {other:?}"),
      };
      assert!(!wrapped);
      assert!(seen.insert(track.id), "track picked twice");
    }
    assert_eq!(used.len(), catalog.len());
  }

  #[test]
  fn exhausted_catalog_wraps_around_to_one_used_entry() {
    let catalog = catalog(3);
    let mut used: UsedSet = catalog.iter().map(|t| t.id.clone()).collect();
    let mut overrides = OverrideMap::new();

    let selection = select_track_for_today(
      &catalog,
      &mut used,
      &mut overrides,
      date(2026, 1, 1),
      &mut rng(),
    );

    let (track, wrapped) = match selection {
      Selection::Random { track, wrapped } => (track, wrapped),
      other => panic!("expected a random pick, got {other:?}"),
    };
    assert!(wrapped);
    assert_eq!(used.len(), 1);
    assert!(used.contains(&track.id));
  }

  #[test]
  fn stale_used_ids_do_not_block_wrap_around() {
    // Used ids for tracks that left the playlist don't count as coverage.
    let catalog = catalog(2);
    let mut used: UsedSet =
      ["t0", "gone"].into_iter().map(TrackId::from).collect();
    let mut overrides = OverrideMap::new();

    let selection = select_track_for_today(
      &catalog,
      &mut used,
      &mut overrides,
      date(2026, 1, 1),
      &mut rng(),
    );

    assert_eq!(selection.track().map(|t| t.id.as_str()), Some("t1"));
    assert!(matches!(selection, Selection::Random { wrapped: false, .. }));
  }

  #[test]
  fn due_override_wins_over_used_set() {
    let catalog = catalog(4);
    let today = date(2026, 5, 10);
    let mut used: UsedSet = catalog.iter().map(|t| t.id.clone()).collect();
    let mut overrides: OverrideMap =
      [(today, TrackId::from("t2"))].into_iter().collect();
    let used_before = used.clone();

    let selection =
      select_track_for_today(&catalog, &mut used, &mut overrides, today, &mut rng());

    assert_eq!(selection, Selection::Scheduled { date: today, track: track("t2") });
    assert!(overrides.is_empty());
    // t2 was already used; the set is otherwise untouched.
    assert_eq!(used, used_before);
  }

  #[test]
  fn scheduled_pick_is_recorded_as_used() {
    let catalog = catalog(4);
    let today = date(2026, 5, 10);
    let mut used = UsedSet::new();
    let mut overrides: OverrideMap =
      [(today, TrackId::from("t3"))].into_iter().collect();

    select_track_for_today(&catalog, &mut used, &mut overrides, today, &mut rng());

    assert_eq!(used, [TrackId::from("t3")].into_iter().collect());
  }

  #[test]
  fn future_override_is_left_alone() {
    let catalog = catalog(4);
    let today = date(2026, 5, 10);
    let tomorrow = date(2026, 5, 11);
    let mut used = UsedSet::new();
    let mut overrides: OverrideMap =
      [(tomorrow, TrackId::from("t3"))].into_iter().collect();

    let selection =
      select_track_for_today(&catalog, &mut used, &mut overrides, today, &mut rng());

    assert!(matches!(selection, Selection::Random { .. }));
    assert_eq!(overrides.get(&tomorrow), Some(&TrackId::from("t3")));
  }

  #[test]
  fn dangling_override_is_consumed_without_fallback() {
    let catalog = catalog(4);
    let today = date(2026, 5, 10);
    let mut used: UsedSet = [TrackId::from("t0")].into_iter().collect();
    let mut overrides: OverrideMap =
      [(today, TrackId::from("deleted"))].into_iter().collect();
    let used_before = used.clone();

    let selection =
      select_track_for_today(&catalog, &mut used, &mut overrides, today, &mut rng());

    assert_eq!(selection, Selection::DanglingOverride {
      date:     today,
      track_id: TrackId::from("deleted"),
    });
    assert!(selection.track().is_none());
    assert!(overrides.is_empty());
    assert_eq!(used, used_before);
  }

  #[test]
  fn earliest_due_override_is_consumed_first() {
    let catalog = catalog(4);
    let d1 = date(2026, 5, 1);
    let d2 = date(2026, 5, 3);
    let today = date(2026, 5, 10);
    let mut used = UsedSet::new();
    let mut overrides: OverrideMap = [
      (d2, TrackId::from("t2")),
      (d1, TrackId::from("t1")),
    ]
    .into_iter()
    .collect();

    let selection =
      select_track_for_today(&catalog, &mut used, &mut overrides, today, &mut rng());

    assert_eq!(selection, Selection::Scheduled { date: d1, track: track("t1") });
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides.get(&d2), Some(&TrackId::from("t2")));
  }

  #[test]
  fn empty_catalog_changes_nothing() {
    let today = date(2026, 5, 10);
    let mut used: UsedSet = [TrackId::from("t0")].into_iter().collect();
    let mut overrides: OverrideMap =
      [(today, TrackId::from("t1"))].into_iter().collect();
    let (used_before, overrides_before) = (used.clone(), overrides.clone());

    let selection =
      select_track_for_today(&[], &mut used, &mut overrides, today, &mut rng());

    assert_eq!(selection, Selection::EmptyCatalog);
    assert_eq!(used, used_before);
    assert_eq!(overrides, overrides_before);
  }

  #[test]
  fn random_path_covers_every_eligible_track() {
    // Rough uniformity check: with 4 eligible tracks and 4000 draws from a
    // fresh used set each time, every track lands well within 15% of 1000.
    let catalog = catalog(4);
    let mut rng = rng();
    let mut counts: HashMap<TrackId, usize> = HashMap::new();

    for _ in 0..4000 {
      let mut used = UsedSet::new();
      let mut overrides = OverrideMap::new();
      let selection = select_track_for_today(
        &catalog,
        &mut used,
        &mut overrides,
        date(2026, 1, 1),
        &mut rng,
      );
      let id = selection.track().map(|t| t.id.clone()).unwrap();
      *counts.entry(id).or_default() += 1;
    }

    assert_eq!(counts.len(), 4);
    for (id, count) in counts {
      assert!((850..=1150).contains(&count), "{id} drawn {count} times");
    }
  }
}
