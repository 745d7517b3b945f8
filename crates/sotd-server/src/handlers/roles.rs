//! Per-community role allow-list.

use std::collections::BTreeSet;

use axum::{
  Json,
  extract::{Path, State},
};
use serde_json::{Value, json};
use sotd_core::{
  announce::Announcer, catalog::CatalogSource, state::CommunityId, store::StateStore,
};

use crate::{AppState, auth::Operator, error::ApiError};

/// `GET /api/communities/{community}/roles`
pub async fn list<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  Operator(actor): Operator,
  Path(community): Path<CommunityId>,
) -> Result<Json<BTreeSet<String>>, ApiError>
where
  S: StateStore + 'static,
  C: CatalogSource + 'static,
  A: Announcer + 'static,
{
  Ok(Json(state.station.list_roles(&actor, &community).await?))
}

/// `PUT /api/communities/{community}/roles/{role}`: administrators only.
pub async fn allow<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  Operator(actor): Operator,
  Path((community, role)): Path<(CommunityId, String)>,
) -> Result<Json<Value>, ApiError>
where
  S: StateStore + 'static,
  C: CatalogSource + 'static,
  A: Announcer + 'static,
{
  let changed = state.station.allow_role(&actor, &community, &role).await?;
  Ok(Json(json!({ "role": role, "changed": changed })))
}

/// `DELETE /api/communities/{community}/roles/{role}`: administrators only.
pub async fn disallow<S, C, A>(
  State(state): State<AppState<S, C, A>>,
  Operator(actor): Operator,
  Path((community, role)): Path<(CommunityId, String)>,
) -> Result<Json<Value>, ApiError>
where
  S: StateStore + 'static,
  C: CatalogSource + 'static,
  A: Announcer + 'static,
{
  let changed = state.station.disallow_role(&actor, &community, &role).await?;
  Ok(Json(json!({ "role": role, "changed": changed })))
}
