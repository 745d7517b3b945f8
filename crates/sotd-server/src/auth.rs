//! HTTP Basic-auth extractor mapping operators to command actors.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use sotd_core::{
  announce::Announcer, catalog::CatalogSource, command::Actor, store::StateStore,
};

use crate::{AppState, config::OperatorConfig, error::ApiError};

/// The authenticated caller, as a command actor.
pub struct Operator(pub Actor);

/// Verify Basic credentials against the configured operators.
pub fn verify_auth(
  headers: &HeaderMap,
  operators: &[OperatorConfig],
) -> Result<Actor, ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let operator = operators
    .iter()
    .find(|op| op.username == username)
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash =
    PasswordHash::new(&operator.password_hash).map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(operator.actor())
}

impl<S, C, A> FromRequestParts<AppState<S, C, A>> for Operator
where
  S: StateStore + 'static,
  C: CatalogSource + 'static,
  A: Announcer + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, C, A>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.operators).map(Operator)
  }
}
