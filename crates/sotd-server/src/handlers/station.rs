//! Status, destination registration and manual firing.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::{Deserialize, Serialize};
use sotd_core::{
  announce::Announcer,
  catalog::CatalogSource,
  state::{CommunityId, DestinationId},
  station::{FireOutcome, StationStatus},
  store::StateStore,
};

use crate::{AppState, auth::Operator, error::ApiError};

/// `GET /api/status`
pub async fn status<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _operator: Operator,
) -> Result<Json<StationStatus>, ApiError>
where
  S: StateStore + 'static,
  C: CatalogSource + 'static,
  A: Announcer + 'static,
{
  let phase = *state.trigger.borrow();
  Ok(Json(state.station.status(phase).await?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DestinationBody {
  pub destination_id: DestinationId,
}

/// `PUT /api/communities/{community}/destination`: body:
/// `{"destination_id":"…"}`
pub async fn set_destination<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  Operator(actor): Operator,
  Path(community): Path<CommunityId>,
  Json(body): Json<DestinationBody>,
) -> Result<StatusCode, ApiError>
where
  S: StateStore + 'static,
  C: CatalogSource + 'static,
  A: Announcer + 'static,
{
  state
    .station
    .register_destination(&actor, &community, body.destination_id)
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/communities/{community}/fire`
pub async fn fire<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  Operator(actor): Operator,
  Path(community): Path<CommunityId>,
) -> Result<Json<FireOutcome>, ApiError>
where
  S: StateStore + 'static,
  C: CatalogSource + 'static,
  A: Announcer + 'static,
{
  let today = state.clock.now().date();
  let outcome = state.station.force_fire(&actor, &community, today).await?;
  Ok(Json(outcome))
}
