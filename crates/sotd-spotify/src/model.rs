//! Wire shapes of the Spotify Web API responses we read.

use serde::Deserialize;
use sotd_core::track::{Track, TrackId};

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
  pub access_token: String,
  /// Lifetime in seconds.
  pub expires_in:   u64,
}

/// One page of `GET /v1/playlists/{id}/tracks`.
#[derive(Debug, Deserialize)]
pub(crate) struct Page {
  #[serde(default)]
  pub items: Vec<PlaylistItem>,
  pub next:  Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistItem {
  /// Null for removed or unavailable entries.
  pub track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackObject {
  /// Null for local files.
  pub id:            Option<String>,
  #[serde(default)]
  pub name:          String,
  #[serde(default)]
  pub artists:       Vec<ArtistObject>,
  pub album:         Option<AlbumObject>,
  pub external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistObject {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlbumObject {
  #[serde(default)]
  pub images: Vec<ImageObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageObject {
  pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExternalUrls {
  pub spotify: Option<String>,
}

impl TrackObject {
  /// `None` when the entry has no id.
  pub fn into_track(self) -> Option<Track> {
    let id = self.id.filter(|id| !id.is_empty())?;
    let url = self
      .external_urls
      .and_then(|urls| urls.spotify)
      .unwrap_or_else(|| format!("https://open.spotify.com/track/{id}"));
    let artwork_url = self
      .album
      .and_then(|album| album.images.into_iter().next())
      .map(|image| image.url);

    Some(Track {
      id: TrackId::new(id),
      title: self.name,
      artists: self.artists.into_iter().map(|a| a.name).collect(),
      artwork_url,
      url,
    })
  }
}
