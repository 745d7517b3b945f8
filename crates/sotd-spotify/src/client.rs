//! [`SpotifyClient`]: token handling and paginated playlist reads.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::{sync::Mutex, time::Instant};
use tracing::debug;

use sotd_core::{catalog::CatalogSource, track::Track};

use crate::{
  Error, Result,
  model::{Page, TokenResponse},
};

/// Tokens are refreshed this long before Spotify says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const PAGE_SIZE: u32 = 100;

// ─── Configuration ───────────────────────────────────────────────────────────

/// App credentials and endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyConfig {
  pub client_id:     String,
  pub client_secret: String,
  /// When set, tokens come from the `refresh_token` grant; otherwise from
  /// `client_credentials`.
  #[serde(default)]
  pub refresh_token: Option<String>,
  #[serde(default = "default_api_base")]
  pub api_base:      String,
  #[serde(default = "default_accounts_base")]
  pub accounts_base: String,
}

fn default_api_base() -> String { "https://api.spotify.com".into() }

fn default_accounts_base() -> String { "https://accounts.spotify.com".into() }

// ─── Client ──────────────────────────────────────────────────────────────────

struct CachedToken {
  access_token: String,
  refresh_at:   Instant,
}

/// Spotify catalog source.
pub struct SpotifyClient {
  http:   Client,
  config: SpotifyConfig,
  token:  Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
  pub fn new(config: SpotifyConfig) -> Result<Self> {
    let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { http, config, token: Mutex::new(None) })
  }

  /// A valid access token, from the cache or freshly granted.
  async fn access_token(&self) -> Result<String> {
    let mut cached = self.token.lock().await;
    if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
      return Ok(token.access_token.clone());
    }

    let granted = self.request_token().await?;
    let access_token = granted.access_token.clone();
    *cached = Some(granted);
    Ok(access_token)
  }

  async fn request_token(&self) -> Result<CachedToken> {
    let url = format!(
      "{}/api/token",
      self.config.accounts_base.trim_end_matches('/')
    );
    let form: Vec<(&str, &str)> = match &self.config.refresh_token {
      Some(refresh_token) => {
        vec![("grant_type", "refresh_token"), ("refresh_token", refresh_token.as_str())]
      }
      None => vec![("grant_type", "client_credentials")],
    };

    let resp = self
      .http
      .post(&url)
      .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
      .form(&form)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Token { status, body });
    }

    let token: TokenResponse = resp.json().await?;
    debug!(expires_in = token.expires_in, "spotify token granted");
    let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
    Ok(CachedToken {
      access_token: token.access_token,
      refresh_at:   Instant::now() + lifetime,
    })
  }

  async fn forget_token(&self) { *self.token.lock().await = None; }

  /// Every track of `playlist_id`, following `next` links until exhausted.
  pub async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
    let token = self.access_token().await?;
    let mut url = format!(
      "{}/v1/playlists/{playlist_id}/tracks?limit={PAGE_SIZE}&offset=0&additional_types=track",
      self.config.api_base.trim_end_matches('/'),
    );
    let mut tracks = Vec::new();

    loop {
      let resp = self.http.get(&url).bearer_auth(&token).send().await?;
      let status = resp.status();
      if !status.is_success() {
        if status == StatusCode::UNAUTHORIZED {
          // Revoked early; grant a new one on the next attempt.
          self.forget_token().await;
        }
        return Err(Error::Api { status, url });
      }

      let page: Page = resp.json().await?;
      tracks.extend(
        page
          .items
          .into_iter()
          .filter_map(|item| item.track)
          .filter_map(|track| track.into_track()),
      );

      match page.next {
        Some(next) => url = next,
        None => break,
      }
    }

    debug!(playlist = playlist_id, tracks = tracks.len(), "playlist fetched");
    Ok(tracks)
  }
}

impl CatalogSource for SpotifyClient {
  type Error = Error;

  async fn fetch_catalog(&self, playlist_id: &str) -> Result<Vec<Track>> {
    self.playlist_tracks(playlist_id).await
  }
}
