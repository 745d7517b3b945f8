//! The `Announcer` trait and per-destination fan-out.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
  state::{CommunityId, DestinationId, DestinationRegistry},
  track::Track,
};

/// How a chosen track came to be picked; renderers may word it differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickKind {
  Random,
  Scheduled,
}

/// Delivers announcements to chat destinations (Discord channels in
/// production).
pub trait Announcer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// A resolved, sendable destination.
  type Destination: Send + Sync;

  /// Look up a destination. `Ok(None)` means it no longer exists or is not
  /// visible to the bot.
  fn resolve_destination<'a>(
    &'a self,
    id: &'a DestinationId,
  ) -> impl Future<Output = Result<Option<Self::Destination>, Self::Error>> + Send + 'a;

  /// Render and send the announcement for `track` on `day`.
  fn send_announcement<'a>(
    &'a self,
    destination: &'a Self::Destination,
    track: &'a Track,
    kind: PickKind,
    day: NaiveDate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Fan-out ─────────────────────────────────────────────────────────────────

/// Result of announcing to a single destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Delivery {
  Delivered,
  /// The destination could not be resolved.
  Missing,
  Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
  pub community:   CommunityId,
  pub destination: DestinationId,
  pub delivery:    Delivery,
}

/// Per-destination results of one firing, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
  pub deliveries: Vec<DeliveryRecord>,
}

impl DispatchReport {
  pub fn delivered(&self) -> usize {
    self
      .deliveries
      .iter()
      .filter(|d| d.delivery == Delivery::Delivered)
      .count()
  }
}

/// Announce `track` to every registered destination, one at a time.
///
/// Each destination is attempted independently; a missing channel or a
/// failed send is recorded and the loop moves on.
pub async fn dispatch<A: Announcer>(
  announcer: &A,
  destinations: &DestinationRegistry,
  track: &Track,
  kind: PickKind,
  day: NaiveDate,
) -> DispatchReport {
  let mut report = DispatchReport::default();

  for (community, destination) in destinations {
    let delivery = match announcer.resolve_destination(destination).await {
      Ok(Some(handle)) => {
        match announcer.send_announcement(&handle, track, kind, day).await {
          Ok(()) => {
            info!(%community, %destination, track = %track.id, "announcement posted");
            Delivery::Delivered
          }
          Err(e) => {
            warn!(%community, %destination, error = %e, "announcement failed");
            Delivery::Failed(e.to_string())
          }
        }
      }
      Ok(None) => {
        warn!(%community, %destination, "destination not found");
        Delivery::Missing
      }
      Err(e) => {
        warn!(%community, %destination, error = %e, "destination lookup failed");
        Delivery::Failed(e.to_string())
      }
    };

    report.deliveries.push(DeliveryRecord {
      community: community.clone(),
      destination: destination.clone(),
      delivery,
    });
  }

  report
}
