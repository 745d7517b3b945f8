//! Scheduled overrides.

use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sotd_core::{
  announce::Announcer,
  catalog::CatalogSource,
  command::{Scheduled, ScheduledEntry},
  state::CommunityId,
  store::StateStore,
};

use crate::{AppState, auth::Operator, error::ApiError};

/// `GET /api/schedule`: every pending override, earliest first.
pub async fn list<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  _operator: Operator,
) -> Result<Json<Vec<ScheduledEntry>>, ApiError>
where
  S: StateStore + 'static,
  C: CatalogSource + 'static,
  A: Announcer + 'static,
{
  Ok(Json(state.station.list_overrides().await?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleBody {
  /// Track URL, `spotify:track:` URI or bare id.
  pub track: String,
}

/// `PUT /api/communities/{community}/schedule/{date}`: body:
/// `{"track":"…"}`
pub async fn add<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  Operator(actor): Operator,
  Path((community, date)): Path<(CommunityId, String)>,
  Json(body): Json<ScheduleBody>,
) -> Result<Json<Scheduled>, ApiError>
where
  S: StateStore + 'static,
  C: CatalogSource + 'static,
  A: Announcer + 'static,
{
  let scheduled = state
    .station
    .schedule_override(&actor, &community, &date, &body.track)
    .await?;
  Ok(Json(scheduled))
}

/// `DELETE /api/communities/{community}/schedule/{date}`
pub async fn remove<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  Operator(actor): Operator,
  Path((community, date)): Path<(CommunityId, String)>,
) -> Result<Json<ScheduledEntry>, ApiError>
where
  S: StateStore + 'static,
  C: CatalogSource + 'static,
  A: Announcer + 'static,
{
  let removed = state
    .station
    .unschedule_override(&actor, &community, &date)
    .await?;
  Ok(Json(removed))
}

/// `DELETE /api/communities/{community}/schedule`: drop every override.
pub async fn clear<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  Operator(actor): Operator,
  Path(community): Path<CommunityId>,
) -> Result<Json<Value>, ApiError>
where
  S: StateStore + 'static,
  C: CatalogSource + 'static,
  A: Announcer + 'static,
{
  let cleared = state.station.clear_overrides(&actor, &community).await?;
  Ok(Json(json!({ "cleared": cleared })))
}
