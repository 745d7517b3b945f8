//! [`DiscordAnnouncer`]: channel lookup and message posting over REST.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, StatusCode, header::AUTHORIZATION};
use serde::Deserialize;
use tracing::debug;

use sotd_core::{
  announce::{Announcer, PickKind},
  state::DestinationId,
  track::Track,
};

use crate::{Error, Result, render};

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
  pub bot_token: String,
  /// First line of every announcement.
  #[serde(default = "default_heading")]
  pub heading:   String,
  #[serde(default = "default_api_base")]
  pub api_base:  String,
}

fn default_heading() -> String { "Song of the Day".into() }

fn default_api_base() -> String { "https://discord.com/api/v10".into() }

/// A channel the bot can see.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
  pub id:   String,
  #[serde(default)]
  pub name: Option<String>,
}

pub struct DiscordAnnouncer {
  http:   Client,
  config: DiscordConfig,
}

impl DiscordAnnouncer {
  pub fn new(config: DiscordConfig) -> Result<Self> {
    let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { http, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.config.api_base.trim_end_matches('/'))
  }

  fn bot(&self, req: RequestBuilder) -> RequestBuilder {
    req.header(AUTHORIZATION, format!("Bot {}", self.config.bot_token))
  }

  /// `GET /channels/{id}`. Unknown and forbidden channels are `None`.
  pub async fn channel(&self, id: &DestinationId) -> Result<Option<Channel>> {
    let resp = self
      .bot(self.http.get(self.url(&format!("/channels/{id}"))))
      .send()
      .await?;

    match resp.status() {
      StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Ok(None),
      status if status.is_success() => Ok(Some(resp.json().await?)),
      status => {
        let body = resp.text().await.unwrap_or_default();
        Err(Error::Api { status, body })
      }
    }
  }

  /// `POST /channels/{id}/messages`.
  pub async fn post(&self, channel: &Channel, message: &render::Message) -> Result<()> {
    let resp = self
      .bot(self.http.post(self.url(&format!("/channels/{}/messages", channel.id))))
      .json(message)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Api { status, body });
    }
    debug!(channel = %channel.id, name = ?channel.name, "message posted");
    Ok(())
  }
}

impl Announcer for DiscordAnnouncer {
  type Error = Error;
  type Destination = Channel;

  async fn resolve_destination(&self, id: &DestinationId) -> Result<Option<Channel>> {
    self.channel(id).await
  }

  async fn send_announcement(
    &self,
    destination: &Channel,
    track: &Track,
    kind: PickKind,
    day: NaiveDate,
  ) -> Result<()> {
    let message = render::announcement(&self.config.heading, track, kind, day);
    self.post(destination, &message).await
  }
}
