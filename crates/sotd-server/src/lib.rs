//! Process host for the song-of-the-day service.
//!
//! Exposes the admin JSON API as an axum [`Router`] over a shared
//! [`Station`], and the polling loop that drives the daily trigger
//! ([`daemon`]). The `sotd` binary wires both to the JSON store, Spotify
//! and Discord.

pub mod auth;
pub mod config;
pub mod daemon;
pub mod error;
pub mod handlers;

pub use config::ServerConfig;
pub use error::ApiError;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use sotd_core::{
  announce::Announcer,
  catalog::CatalogSource,
  station::Station,
  store::StateStore,
  trigger::{Clock, TriggerPhase},
};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use config::OperatorConfig;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, C, A> {
  pub station:   Arc<Station<S, C, A>>,
  pub operators: Arc<Vec<OperatorConfig>>,
  /// Phase reported by the running daily trigger.
  pub trigger:   watch::Receiver<TriggerPhase>,
  /// Source of "today" for manual firings.
  pub clock:     Arc<dyn Clock>,
}

impl<S, C, A> Clone for AppState<S, C, A> {
  fn clone(&self) -> Self {
    Self {
      station:   Arc::clone(&self.station),
      operators: Arc::clone(&self.operators),
      trigger:   self.trigger.clone(),
      clock:     Arc::clone(&self.clock),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the admin API router.
pub fn router<S, C, A>(state: AppState<S, C, A>) -> Router
where
  S: StateStore + 'static,
  C: CatalogSource + 'static,
  A: Announcer + 'static,
{
  use handlers::{roles, schedule, station};

  Router::new()
    .route("/api/status", get(station::status::<S, C, A>))
    .route("/api/schedule", get(schedule::list::<S, C, A>))
    .route(
      "/api/communities/{community}/destination",
      put(station::set_destination::<S, C, A>),
    )
    .route(
      "/api/communities/{community}/schedule",
      delete(schedule::clear::<S, C, A>),
    )
    .route(
      "/api/communities/{community}/schedule/{date}",
      put(schedule::add::<S, C, A>).delete(schedule::remove::<S, C, A>),
    )
    .route("/api/communities/{community}/fire", post(station::fire::<S, C, A>))
    .route("/api/communities/{community}/roles", get(roles::list::<S, C, A>))
    .route(
      "/api/communities/{community}/roles/{role}",
      put(roles::allow::<S, C, A>).delete(roles::disallow::<S, C, A>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
