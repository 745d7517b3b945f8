//! Track, one candidate song from the playlist catalog.
//!
//! Tracks are read-only snapshots fetched fresh for every selection; only
//! their ids are ever persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable catalog identifier of a track (a Spotify base-62 id in practice).
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Extract a track id from a user-supplied reference.
  ///
  /// Accepts an `open.spotify.com/track/<id>` URL (query string and
  /// fragment ignored), a `spotify:track:<id>` URI, or a bare id. Returns
  /// `None` when no non-empty alphanumeric id can be found.
  pub fn parse_reference(input: &str) -> Option<Self> {
    let input = input.trim();

    let candidate = if let Some((_, rest)) = input.split_once("/track/") {
      rest
        .split(['?', '#', '/'])
        .next()
        .unwrap_or_default()
    } else if let Some(rest) = input.strip_prefix("spotify:track:") {
      rest
    } else {
      input
    };

    if candidate.is_empty()
      || !candidate.chars().all(|c| c.is_ascii_alphanumeric())
    {
      return None;
    }
    Some(Self(candidate.to_owned()))
  }
}

impl fmt::Display for TrackId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for TrackId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

/// A playable track as reported by the catalog source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
  pub id:          TrackId,
  pub title:       String,
  pub artists:     Vec<String>,
  /// Cover art URL; the first (largest) album image when available.
  pub artwork_url: Option<String>,
  /// Canonical public link to the track.
  pub url:         String,
}

impl Track {
  /// Artist names joined for display, e.g. `"Daft Punk, Pharrell Williams"`.
  pub fn artist_line(&self) -> String { self.artists.join(", ") }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_share_url_with_query() {
    let id = TrackId::parse_reference(
      "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=abc123",
    );
    assert_eq!(id, Some(TrackId::from("4uLU6hMCjMI75M1A2tKUQC")));
  }

  #[test]
  fn parses_localised_url() {
    let id = TrackId::parse_reference(
      "https://open.spotify.com/intl-de/track/4uLU6hMCjMI75M1A2tKUQC",
    );
    assert_eq!(id, Some(TrackId::from("4uLU6hMCjMI75M1A2tKUQC")));
  }

  #[test]
  fn parses_uri_and_bare_id() {
    assert_eq!(
      TrackId::parse_reference("spotify:track:4uLU6hMCjMI75M1A2tKUQC"),
      Some(TrackId::from("4uLU6hMCjMI75M1A2tKUQC")),
    );
    assert_eq!(
      TrackId::parse_reference("  4uLU6hMCjMI75M1A2tKUQC "),
      Some(TrackId::from("4uLU6hMCjMI75M1A2tKUQC")),
    );
  }

  #[test]
  fn rejects_garbage() {
    assert_eq!(TrackId::parse_reference(""), None);
    assert_eq!(TrackId::parse_reference("https://open.spotify.com/track/"), None);
    assert_eq!(
      TrackId::parse_reference("https://open.spotify.com/album/1DFixLWuPkv3KT3TnV35m3"),
      None,
    );
    assert_eq!(TrackId::parse_reference("spotify:track:"), None);
  }

  #[test]
  fn artist_line_joins_names() {
    let track = Track {
      id:          TrackId::from("a"),
      title:       "Get Lucky".into(),
      artists:     vec!["Daft Punk".into(), "Pharrell Williams".into()],
      artwork_url: None,
      url:         "https://open.spotify.com/track/a".into(),
    };
    assert_eq!(track.artist_line(), "Daft Punk, Pharrell Williams");
  }
}
