//! sotd server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! JSON state directory, and runs the daily trigger alongside the admin API
//! on a single-threaded runtime.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for an operator's `password_hash`:
//!
//! ```
//! cargo run -p sotd-server --bin sotd -- --hash-password
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context as _, anyhow};
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use sotd_core::{
  station::Station,
  trigger::{Clock, DailyTrigger, SystemClock},
};
use sotd_discord::DiscordAnnouncer;
use sotd_server::{AppState, config, daemon};
use sotd_spotify::SpotifyClient;
use sotd_store_json::JsonStore;
use tokio::{net::TcpListener, signal, sync::watch};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Song-of-the-day announcer")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let cfg = config::load(&cli.config).context("failed to read configuration")?;
  let schedule = cfg
    .schedule()
    .ok_or_else(|| anyhow!("post_time {:?} is not HH:MM", cfg.post_time))?;

  let state_dir = config::expand_tilde(&cfg.state_dir);
  let store = JsonStore::open(&state_dir)
    .await
    .with_context(|| format!("failed to open state directory {state_dir:?}"))?;
  let catalog =
    SpotifyClient::new(cfg.spotify.clone()).context("failed to build Spotify client")?;
  let announcer =
    DiscordAnnouncer::new(cfg.discord.clone()).context("failed to build Discord client")?;

  let station = Arc::new(Station::new(store, catalog, announcer, cfg.playlist_id.clone()));
  let trigger = DailyTrigger::new(schedule);
  let clock: Arc<dyn Clock> = Arc::new(SystemClock);

  if cfg.operators.is_empty() {
    warn!("no operators configured; every admin request will be refused");
  }

  let state = AppState {
    station:   Arc::clone(&station),
    operators: Arc::new(cfg.operators.clone()),
    trigger:   trigger.subscribe(),
    clock:     Arc::clone(&clock),
  };

  // Dropping or signalling `stop_tx` ends the trigger loop.
  let (stop_tx, mut stop_rx) = watch::channel(());
  let poll = Duration::from_secs(cfg.poll_seconds.max(1));
  let trigger_task = tokio::spawn(daemon::run_trigger(
    station,
    trigger,
    clock,
    poll,
    async move {
      let _ = stop_rx.changed().await;
    },
  ));

  let app = sotd_server::router(state);
  let address = format!("{}:{}", cfg.host, cfg.port);

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async move {
      shutdown_signal().await;
      let _ = stop_tx.send(());
    })
    .await
    .context("server error")?;

  trigger_task.await.context("trigger task failed")?;
  info!("shutdown complete");
  Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = signal::ctrl_c().await {
      warn!(error = %e, "failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut sigterm) => {
        sigterm.recv().await;
      }
      Err(e) => {
        warn!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => info!("received Ctrl-C, shutting down"),
    _ = terminate => info!("received SIGTERM, shutting down"),
  }
}

/// Read one password line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
