//! Async HTTP client wrapping the sotd admin API.

use std::{collections::BTreeSet, time::Duration};

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use sotd_core::{
  command::{Scheduled, ScheduledEntry},
  station::{FireOutcome, StationStatus},
};
use tracing::debug;

/// Connection settings for the sotd API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the sotd admin API.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

/// Body of every non-2xx response.
#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

#[derive(Deserialize)]
pub struct RoleChange {
  pub role:    String,
  pub changed: bool,
}

#[derive(Deserialize)]
struct Cleared {
  cleared: usize,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  /// `<base>/api/<segments…>`, each segment percent-encoded.
  fn url(&self, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(&self.config.base_url)
      .with_context(|| format!("invalid server URL {:?}", self.config.base_url))?;
    url
      .path_segments_mut()
      .map_err(|()| anyhow!("server URL cannot have a path"))?
      .pop_if_empty()
      .push("api")
      .extend(segments);
    Ok(url)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
    let resp = self
      .auth(req)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;

    let status = resp.status();
    debug!(%status, what, "response");
    if status.is_success() {
      return Ok(resp);
    }

    // Prefer the server's own message when it sent one.
    match resp.json::<ErrorBody>().await {
      Ok(body) => Err(anyhow!("{}", body.error)),
      Err(_) => Err(anyhow!("{what} → {status}")),
    }
  }

  async fn json<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
    self
      .send(req, what)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising {what} response"))
  }

  // ── Station ───────────────────────────────────────────────────────────────

  /// `GET /api/status`
  pub async fn status(&self) -> Result<StationStatus> {
    let url = self.url(&["status"])?;
    self.json(self.client.get(url), "GET /status").await
  }

  /// `PUT /api/communities/{community}/destination`
  pub async fn set_destination(&self, community: &str, destination: &str) -> Result<()> {
    let url = self.url(&["communities", community, "destination"])?;
    let req = self
      .client
      .put(url)
      .json(&json!({ "destination_id": destination }));
    self.send(req, "PUT /destination").await?;
    Ok(())
  }

  /// `POST /api/communities/{community}/fire`
  pub async fn fire(&self, community: &str) -> Result<FireOutcome> {
    let url = self.url(&["communities", community, "fire"])?;
    self.json(self.client.post(url), "POST /fire").await
  }

  // ── Schedule ──────────────────────────────────────────────────────────────

  /// `GET /api/schedule`
  pub async fn list_schedule(&self) -> Result<Vec<ScheduledEntry>> {
    let url = self.url(&["schedule"])?;
    self.json(self.client.get(url), "GET /schedule").await
  }

  /// `PUT /api/communities/{community}/schedule/{date}`
  pub async fn schedule(&self, community: &str, date: &str, track: &str) -> Result<Scheduled> {
    let url = self.url(&["communities", community, "schedule", date])?;
    let req = self.client.put(url).json(&json!({ "track": track }));
    self.json(req, "PUT /schedule").await
  }

  /// `DELETE /api/communities/{community}/schedule/{date}`
  pub async fn unschedule(&self, community: &str, date: &str) -> Result<ScheduledEntry> {
    let url = self.url(&["communities", community, "schedule", date])?;
    self.json(self.client.delete(url), "DELETE /schedule").await
  }

  /// `DELETE /api/communities/{community}/schedule`
  pub async fn clear_schedule(&self, community: &str) -> Result<usize> {
    let url = self.url(&["communities", community, "schedule"])?;
    let body: Cleared = self.json(self.client.delete(url), "DELETE /schedule").await?;
    Ok(body.cleared)
  }

  // ── Roles ─────────────────────────────────────────────────────────────────

  /// `GET /api/communities/{community}/roles`
  pub async fn roles(&self, community: &str) -> Result<BTreeSet<String>> {
    let url = self.url(&["communities", community, "roles"])?;
    self.json(self.client.get(url), "GET /roles").await
  }

  /// `PUT /api/communities/{community}/roles/{role}`
  pub async fn allow_role(&self, community: &str, role: &str) -> Result<RoleChange> {
    let url = self.url(&["communities", community, "roles", role])?;
    self.json(self.client.put(url), "PUT /roles").await
  }

  /// `DELETE /api/communities/{community}/roles/{role}`
  pub async fn disallow_role(&self, community: &str, role: &str) -> Result<RoleChange> {
    let url = self.url(&["communities", community, "roles", role])?;
    self.json(self.client.delete(url), "DELETE /roles").await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base_url: &str) -> ApiClient {
    ApiClient::new(ApiConfig {
      base_url: base_url.into(),
      username: String::new(),
      password: String::new(),
    })
    .unwrap()
  }

  #[test]
  fn url_joins_and_encodes_segments() {
    let c = client("http://localhost:8686/");
    assert_eq!(
      c.url(&["communities", "42", "roles", "Night Owls"]).unwrap().as_str(),
      "http://localhost:8686/api/communities/42/roles/Night%20Owls",
    );
  }

  #[test]
  fn url_keeps_a_base_path_prefix() {
    let c = client("https://example.org/sotd");
    assert_eq!(
      c.url(&["status"]).unwrap().as_str(),
      "https://example.org/sotd/api/status",
    );
  }

  #[test]
  fn url_rejects_garbage_base() {
    assert!(client("not a url").url(&["status"]).is_err());
  }
}
