//! API error type and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use sotd_core::command::CommandError;
use thiserror::Error;

/// An error returned by an admin API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error(transparent)]
  Command(#[from] CommandError),
}

impl From<sotd_core::Error> for ApiError {
  fn from(e: sotd_core::Error) -> Self { Self::Command(CommandError::Failed(e)) }
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Command(e) => match e {
        CommandError::Unauthorized => StatusCode::FORBIDDEN,
        CommandError::InvalidDate(_)
        | CommandError::InvalidTrackReference(_)
        | CommandError::InvalidRole => StatusCode::BAD_REQUEST,
        CommandError::NotScheduled(_) => StatusCode::NOT_FOUND,
        CommandError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"sotd\""),
      );
    }
    res
  }
}
