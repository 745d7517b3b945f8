//! Error types for `sotd-core`.

use thiserror::Error;

/// Failure of a firing attempt or a state access.
///
/// Collaborator errors are boxed so the engine stays generic over its seams.
#[derive(Debug, Error)]
pub enum Error {
  #[error("state store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("catalog fetch failed: {0}")]
  Catalog(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn catalog<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Catalog(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
