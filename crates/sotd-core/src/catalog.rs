//! The `CatalogSource` trait, where candidate tracks come from.

use std::future::Future;

use crate::track::Track;

/// A source of playlist tracks (the Spotify client in production).
pub trait CatalogSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch every track of `playlist_id`, in playlist order.
  ///
  /// Implementations paginate internally and drop entries without track
  /// data. Any failure (expired credentials, network) is returned as an
  /// error; the caller treats it as "no catalog for this attempt".
  fn fetch_catalog<'a>(
    &'a self,
    playlist_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Track>, Self::Error>> + Send + 'a;
}
