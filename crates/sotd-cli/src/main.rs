//! `sotdctl` — command-line front end for the sotd admin API.
//!
//! # Usage
//!
//! ```
//! sotdctl --url http://localhost:8686 --user alice --password secret status
//! sotdctl --config ~/.config/sotd/cli.toml schedule 1234 2026-05-01 spotify:track:4uLU6hMCjMI75M1A2tKUQC
//! ```

mod client;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, RoleChange};
use serde::Deserialize;
use sotd_core::{selection::Selection, station::FireOutcome};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sotdctl", about = "Administer a running sotd server")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the sotd server (default: http://localhost:8686).
  #[arg(long, env = "SOTD_URL")]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "SOTD_USER")]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "SOTD_PASSWORD")]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the trigger phase and table sizes.
  Status,
  /// Set the channel a community's announcements go to.
  SetChannel { community: String, channel: String },
  /// Schedule a track (URL, URI or bare ID) for a date (YYYY-MM-DD).
  Schedule { community: String, date: String, track: String },
  /// Remove the override for a date.
  Unschedule { community: String, date: String },
  /// List pending overrides.
  List,
  /// Remove every pending override.
  Clear { community: String },
  /// Select and announce a track now, outside the daily schedule.
  Fire { community: String },
  /// List the roles allowed to run commands in a community.
  Roles { community: String },
  /// Allow a role to run commands in a community.
  AllowRole { community: String, role: String },
  /// Revoke a role's permission.
  DisallowRole { community: String, role: String },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

fn resolve(flag: Option<String>, file: &str) -> Option<String> {
  flag.or_else(|| (!file.is_empty()).then(|| file.to_string()))
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: resolve(args.url, &file_cfg.url)
      .unwrap_or_else(|| "http://localhost:8686".to_string()),
    username: resolve(args.user, &file_cfg.username).unwrap_or_default(),
    password: resolve(args.password, &file_cfg.password).unwrap_or_default(),
  };

  let client = ApiClient::new(api_config)?;
  run(&client, args.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Status => {
      let status = client.status().await?;
      println!("trigger:           {:?}", status.trigger);
      match status.last_fired {
        Some(day) => println!("last fired:        {day}"),
        None => println!("last fired:        never"),
      }
      println!("destinations:      {}", status.destinations);
      println!("used tracks:       {}", status.used_tracks);
      println!("pending overrides: {}", status.pending_overrides);
    }
    Command::SetChannel { community, channel } => {
      client.set_destination(&community, &channel).await?;
      println!("Announcements for {community} will go to channel {channel}.");
    }
    Command::Schedule { community, date, track } => {
      let scheduled = client.schedule(&community, &date, &track).await?;
      match scheduled.replaced {
        Some(previous) => println!(
          "Scheduled {} for {} (replacing {previous}).",
          scheduled.track_id, scheduled.date
        ),
        None => println!("Scheduled {} for {}.", scheduled.track_id, scheduled.date),
      }
    }
    Command::Unschedule { community, date } => {
      let removed = client.unschedule(&community, &date).await?;
      println!("Removed {} from {}.", removed.track_id, removed.date);
    }
    Command::List => {
      let entries = client.list_schedule().await?;
      if entries.is_empty() {
        println!("No songs scheduled.");
      }
      for entry in entries {
        println!("{}  {}", entry.date, entry.track_id);
      }
    }
    Command::Clear { community } => {
      let cleared = client.clear_schedule(&community).await?;
      println!("Cleared {cleared} scheduled song(s).");
    }
    Command::Fire { community } => {
      let outcome = client.fire(&community).await?;
      println!("{}", describe(&outcome));
    }
    Command::Roles { community } => {
      let roles = client.roles(&community).await?;
      if roles.is_empty() {
        println!("No roles allowed; only administrators can run commands.");
      }
      for role in roles {
        println!("{role}");
      }
    }
    Command::AllowRole { community, role } => {
      print_role_change(&client.allow_role(&community, &role).await?, "allowed");
    }
    Command::DisallowRole { community, role } => {
      print_role_change(&client.disallow_role(&community, &role).await?, "disallowed");
    }
  }
  Ok(())
}

fn print_role_change(change: &RoleChange, verb: &str) {
  if change.changed {
    println!("Role {} {verb}.", change.role);
  } else {
    println!("Role {} was already {verb}.", change.role);
  }
}

/// One-line summary of a firing.
fn describe(outcome: &FireOutcome) -> String {
  match outcome {
    FireOutcome::NoDestinations => "No channels configured; nothing announced.".into(),
    FireOutcome::NothingSelected { selection } => match selection {
      Selection::DanglingOverride { date, track_id } => {
        format!("Override {track_id} for {date} is no longer in the playlist; nothing announced.")
      }
      _ => "The playlist is empty; nothing announced.".into(),
    },
    FireOutcome::Announced { selection, report } => {
      let title = selection
        .track()
        .map(|t| format!("{} by {}", t.title, t.artist_line()))
        .unwrap_or_default();
      format!(
        "Announced {title} to {}/{} channel(s).",
        report.delivered(),
        report.deliveries.len()
      )
    }
  }
}

#[cfg(test)]
mod tests {
  use sotd_core::{
    announce::{Delivery, DeliveryRecord, DispatchReport},
    state::{CommunityId, DestinationId},
    track::{Track, TrackId},
  };

  use super::*;

  #[test]
  fn flag_beats_file_and_empty_file_is_unset() {
    assert_eq!(resolve(Some("a".into()), "b"), Some("a".into()));
    assert_eq!(resolve(None, "b"), Some("b".into()));
    assert_eq!(resolve(None, ""), None);
  }

  #[test]
  fn parses_subcommands() {
    let args = Args::try_parse_from([
      "sotdctl", "--url", "http://h:1", "schedule", "g", "2026-05-01", "abc",
    ])
    .unwrap();
    assert_eq!(args.url.as_deref(), Some("http://h:1"));
    assert!(matches!(
      args.command,
      Command::Schedule { ref community, ref date, ref track }
        if community == "g" && date == "2026-05-01" && track == "abc"
    ));

    let args = Args::try_parse_from(["sotdctl", "allow-role", "g", "DJ"]).unwrap();
    assert!(matches!(args.command, Command::AllowRole { .. }));
  }

  #[test]
  fn describes_outcomes() {
    let track = Track {
      id:          TrackId::from("t"),
      title:       "Song".into(),
      artists:     vec!["A".into(), "B".into()],
      artwork_url: None,
      url:         "https://open.spotify.com/track/t".into(),
    };
    let report = DispatchReport {
      deliveries: vec![
        DeliveryRecord {
          community:   CommunityId::from("g1"),
          destination: DestinationId::from("c1"),
          delivery:    Delivery::Delivered,
        },
        DeliveryRecord {
          community:   CommunityId::from("g2"),
          destination: DestinationId::from("c2"),
          delivery:    Delivery::Missing,
        },
      ],
    };
    let outcome = FireOutcome::Announced {
      selection: Selection::Random { track, wrapped: false },
      report,
    };
    assert_eq!(describe(&outcome), "Announced Song by A, B to 1/2 channel(s).");

    assert_eq!(
      describe(&FireOutcome::NothingSelected { selection: Selection::EmptyCatalog }),
      "The playlist is empty; nothing announced.",
    );
  }
}
