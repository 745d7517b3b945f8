//! Error type for `sotd-spotify`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("token request rejected ({status}): {body}")]
  Token { status: StatusCode, body: String },

  #[error("spotify returned {status} for {url}")]
  Api { status: StatusCode, url: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
