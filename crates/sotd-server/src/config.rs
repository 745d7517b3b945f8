//! Runtime configuration, deserialised from `config.toml` plus `SOTD_*`
//! environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sotd_core::{command::Actor, trigger::DailySchedule};
use sotd_discord::DiscordConfig;
use sotd_spotify::SpotifyConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  /// Directory holding the JSON state documents. A leading `~/` is
  /// expanded.
  pub state_dir:      PathBuf,
  pub playlist_id:    String,
  /// Local time of the daily post, `HH:MM`.
  pub post_time:      String,
  #[serde(default = "default_window_minutes")]
  pub window_minutes: u32,
  #[serde(default = "default_poll_seconds")]
  pub poll_seconds:   u64,
  pub spotify:        SpotifyConfig,
  pub discord:        DiscordConfig,
  #[serde(default)]
  pub operators:      Vec<OperatorConfig>,
}

/// A user of the admin API.
#[derive(Debug, Clone, Deserialize)]
pub struct OperatorConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  #[serde(default)]
  pub administrator: bool,
  #[serde(default)]
  pub roles:         Vec<String>,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8686 }

fn default_window_minutes() -> u32 { 60 }

fn default_poll_seconds() -> u64 { 10 }

impl ServerConfig {
  /// `None` when `post_time` does not parse.
  pub fn schedule(&self) -> Option<DailySchedule> {
    DailySchedule::parse_post_time(&self.post_time)
      .map(|post_at| DailySchedule::new(post_at, self.window_minutes))
  }
}

impl OperatorConfig {
  pub fn actor(&self) -> Actor {
    Actor {
      name:          self.username.clone(),
      administrator: self.administrator,
      roles:         self.roles.iter().cloned().collect(),
    }
  }
}

/// Layer the optional file at `path` under `SOTD_*` variables (nested keys
/// separated by `__`, e.g. `SOTD_DISCORD__BOT_TOKEN`).
pub fn load(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("SOTD")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()?
    .try_deserialize()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use chrono::NaiveTime;

  use super::*;

  const MINIMAL: &str = r#"
state_dir   = "/var/lib/sotd"
playlist_id = "37i9dQZF1DXcBWIGoYBM5M"
post_time   = "09:30"

[spotify]
client_id     = "id"
client_secret = "secret"

[discord]
bot_token = "token"

[[operators]]
username      = "alice"
password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
administrator = true

[[operators]]
username      = "bob"
password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
roles         = ["DJ"]
"#;

  fn load_str(toml: &str) -> ServerConfig {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, toml).unwrap();
    load(&path).unwrap()
  }

  #[test]
  fn defaults_fill_optional_keys() {
    let cfg = load_str(MINIMAL);

    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8686);
    assert_eq!(cfg.window_minutes, 60);
    assert_eq!(cfg.poll_seconds, 10);
    assert_eq!(cfg.spotify.api_base, "https://api.spotify.com");
    assert_eq!(cfg.spotify.refresh_token, None);
    assert_eq!(cfg.discord.heading, "Song of the Day");
    assert_eq!(cfg.operators.len(), 2);
  }

  #[test]
  fn schedule_parses_post_time() {
    let cfg = load_str(MINIMAL);
    let schedule = cfg.schedule().unwrap();
    assert_eq!(schedule.post_at(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());

    let bad = ServerConfig { post_time: "half nine".into(), ..cfg };
    assert!(bad.schedule().is_none());
  }

  #[test]
  fn operators_become_actors() {
    let cfg = load_str(MINIMAL);

    let alice = cfg.operators[0].actor();
    assert!(alice.administrator);
    assert!(alice.roles.is_empty());

    let bob = cfg.operators[1].actor();
    assert!(!bob.administrator);
    assert!(bob.roles.contains("DJ"));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/sotd")),
      PathBuf::from(home).join("sotd"),
    );
    assert_eq!(expand_tilde(Path::new("/srv/sotd")), PathBuf::from("/srv/sotd"));
  }
}
