//! The polling loop driving the daily trigger.

use std::{future::Future, sync::Arc, time::Duration};

use sotd_core::{
  announce::Announcer,
  catalog::CatalogSource,
  station::{FireOutcome, Station},
  store::StateStore,
  trigger::{Clock, DailyTrigger, TickOutcome},
};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

/// Tick `trigger` every `poll` until `shutdown` resolves.
///
/// Errors from a tick are logged and the loop carries on; the next tick
/// inside the window retries the firing.
pub async fn run_trigger<S, C, A>(
  station: Arc<Station<S, C, A>>,
  trigger: DailyTrigger,
  clock: Arc<dyn Clock>,
  poll: Duration,
  shutdown: impl Future<Output = ()>,
) where
  S: StateStore,
  C: CatalogSource,
  A: Announcer,
{
  let mut ticker = interval(poll);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
  tokio::pin!(shutdown);

  info!(
    post_at = %trigger.schedule().post_at(),
    poll_seconds = poll.as_secs(),
    "daily trigger running",
  );

  loop {
    tokio::select! {
      _ = &mut shutdown => break,
      _ = ticker.tick() => {}
    }

    let now = clock.now();
    match trigger.tick(&station, now).await {
      Ok(TickOutcome::Fired(outcome)) => log_outcome(&outcome),
      Ok(TickOutcome::AlreadyFired | TickOutcome::OutsideWindow) => {
        debug!(%now, "nothing to do");
      }
      Err(e) => error!(error = %e, "daily firing failed; retrying next tick"),
    }
  }

  info!("daily trigger stopped");
}

fn log_outcome(outcome: &FireOutcome) {
  match outcome {
    FireOutcome::NoDestinations => info!("daily firing done: no destinations"),
    FireOutcome::NothingSelected { .. } => info!("daily firing done: nothing selected"),
    FireOutcome::Announced { report, .. } => info!(
      delivered = report.delivered(),
      attempted = report.deliveries.len(),
      "daily firing done",
    ),
  }
}
