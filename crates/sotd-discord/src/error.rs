//! Error type for `sotd-discord`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("discord returned {status}: {body}")]
  Api { status: StatusCode, body: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
