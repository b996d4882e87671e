//! Scoreline live client: entry point.
//!
//! Connects to the scoreboard backend over WebSocket, turns score events into
//! notifications and toasts, and prints the live panel to the terminal
//! whenever something changes.
//!
//! # Usage
//!
//! ```text
//! scoreline-client [OPTIONS]
//!
//! Options:
//!   --ws-url            <URL>   Backend WebSocket endpoint [default: ws://127.0.0.1:3001]
//!   --retry-interval-ms <MS>    Delay between reconnect attempts [default: 5000]
//!   --max-retries       <N>     Reconnect attempts before giving up [default: 5]
//!   --toast-capacity    <N>     Toasts shown at once [default: 5]
//!   --config            <PATH>  Optional TOML config file
//!   --log-level         <LEVEL> Log filter when RUST_LOG is unset [default: info]
//! ```
//!
//! # Precedence
//!
//! Built-in defaults < config file < environment variable < command line.
//!
//! | Variable                       | Flag                  |
//! |--------------------------------|-----------------------|
//! | `SCORELINE_WS_URL`             | `--ws-url`            |
//! | `SCORELINE_RETRY_INTERVAL_MS`  | `--retry-interval-ms` |
//! | `SCORELINE_MAX_RETRIES`        | `--max-retries`       |
//! | `SCORELINE_TOAST_CAPACITY`     | `--toast-capacity`    |
//! | `SCORELINE_CONFIG`             | `--config`            |
//! | `SCORELINE_LOG`                | `--log-level`         |
//!
//! # Wiring
//!
//! ```text
//! LiveTransport ──frames──► EventRouter ──► ScoreAlerts ─┬─► NotificationCenter
//!                                                        ├─► ToastQueue (ToastHandle)
//!                                                        └─► ChannelRefresher ──► refresh consumer
//! watch revisions ──► render loop ──► stdout
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scoreline_client::application::{
    toast_hub, AlertDeps, EventRouter, NotificationCenter, ScoreAlerts, ToastQueue,
};
use scoreline_client::domain::LiveConfig;
use scoreline_client::infrastructure::refresh::ChannelRefresher;
use scoreline_client::infrastructure::storage::{load_config, ConfigFile};
use scoreline_client::infrastructure::transport::LiveTransport;
use scoreline_client::infrastructure::ui_bridge::{render_text, LiveStatus, PanelSnapshot};
use scoreline_core::{ToastRequest, ToastSeverity};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Live score alert client.
///
/// Every option is optional: unset options fall back to the config file,
/// then to the built-in defaults.
#[derive(Debug, Parser)]
#[command(
    name = "scoreline-client",
    about = "Live score and leaderboard alerts over WebSocket",
    version
)]
struct Cli {
    /// Backend WebSocket endpoint (`ws://` or `wss://`).
    #[arg(long, env = "SCORELINE_WS_URL")]
    ws_url: Option<String>,

    /// Fixed delay between reconnect attempts, in milliseconds.
    #[arg(long, env = "SCORELINE_RETRY_INTERVAL_MS")]
    retry_interval_ms: Option<u64>,

    /// Reconnect attempts after a drop before the client stops trying.
    #[arg(long, env = "SCORELINE_MAX_RETRIES")]
    max_retries: Option<u32>,

    /// Maximum number of toasts alive at once; older ones are evicted.
    #[arg(long, env = "SCORELINE_TOAST_CAPACITY")]
    toast_capacity: Option<usize>,

    /// TOML config file.  A missing file means defaults.
    #[arg(long, env = "SCORELINE_CONFIG")]
    config: Option<PathBuf>,

    /// `tracing` filter used when `RUST_LOG` is not set.
    #[arg(long, env = "SCORELINE_LOG")]
    log_level: Option<String>,
}

impl Cli {
    /// Merges the config file (if any) with the command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if
    /// the toast capacity is zero.
    fn into_live_config(self) -> anyhow::Result<LiveConfig> {
        let file = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => ConfigFile::default(),
        };
        let mut config = LiveConfig::from(file);

        if let Some(url) = self.ws_url {
            config.ws_url = url;
        }
        if let Some(ms) = self.retry_interval_ms {
            config.reconnect.interval = Duration::from_millis(ms);
        }
        if let Some(n) = self.max_retries {
            config.reconnect.max_attempts = n;
        }
        if let Some(n) = self.toast_capacity {
            config.toast_capacity = n;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        if config.toast_capacity == 0 {
            bail!("toast capacity must be at least 1");
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// Everything runs on one cooperative event loop: frames are dispatched on
/// the transport's session task and timers are plain Tokio tasks, so a
/// current-thread runtime is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_live_config()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(
        "Scoreline client starting: url={}, retry every {:?} (max {}), {} toasts",
        config.ws_url, config.reconnect.interval, config.reconnect.max_attempts, config.toast_capacity
    );

    // ── Live state ────────────────────────────────────────────────────────────
    let router = Arc::new(EventRouter::new());
    let notifications = Arc::new(NotificationCenter::new(config.notification_ttls));
    let toasts = ToastQueue::new(config.toast_capacity, config.toast);
    let _hub = toast_hub::bind(&toasts).context("failed to bind the toast hub")?;

    // ── Refresh consumer ──────────────────────────────────────────────────────
    let (refresher, mut refresh_rx) = ChannelRefresher::channel();
    let refresh_task = tokio::spawn(async move {
        let mut served = 0u64;
        while let Some(request) = refresh_rx.recv().await {
            served += 1;
            info!("leaderboard refresh #{served} requested at {:?}", request.requested_at);
        }
    });

    // ── Score alerts ──────────────────────────────────────────────────────────
    let high_scores = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&high_scores);
    let alerts = ScoreAlerts::attach(
        Arc::clone(&router),
        AlertDeps {
            notifications: Arc::clone(&notifications),
            toasts: toasts.handle(),
            refresher: Arc::new(refresher),
            on_high_score: Some(Arc::new(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })),
        },
    );

    // ── Transport ─────────────────────────────────────────────────────────────
    let transport = LiveTransport::new(config.ws_url.clone(), config.reconnect, Arc::clone(&router));
    transport
        .connect()
        .await
        .with_context(|| format!("cannot connect to {}", config.ws_url))?;

    // ── Render loop ───────────────────────────────────────────────────────────
    let mut link_rx = transport.status_receiver();
    let mut notes_rx = notifications.subscribe_changes();
    let mut toasts_rx = toasts.subscribe_changes();
    let mut last_status = LiveStatus::from(&*link_rx.borrow());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    print_panel(&transport, &notifications, &toasts);
    loop {
        tokio::select! {
            signal = &mut shutdown => {
                match signal {
                    Ok(()) => info!("received Ctrl+C, shutting down"),
                    Err(e) => error!("failed to listen for Ctrl+C: {e}"),
                }
                break;
            }
            changed = link_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = LiveStatus::from(&*link_rx.borrow_and_update());
                if status != last_status {
                    announce(status);
                    last_status = status;
                }
            }
            changed = notes_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                notes_rx.borrow_and_update();
            }
            changed = toasts_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                toasts_rx.borrow_and_update();
            }
        }
        print_panel(&transport, &notifications, &toasts);
    }

    // ── Teardown ──────────────────────────────────────────────────────────────
    alerts.detach();
    transport.disconnect();
    // Let the session task flush the Close frame.
    tokio::time::sleep(Duration::from_millis(100)).await;
    refresh_task.abort();

    info!(
        "Scoreline client stopped after {} high score(s)",
        high_scores.load(Ordering::Relaxed)
    );
    Ok(())
}

fn print_panel(transport: &LiveTransport, notifications: &NotificationCenter, toasts: &ToastQueue) {
    let snapshot = PanelSnapshot::capture(&transport.status(), notifications, toasts);
    println!("{}", render_text(&snapshot));
}

/// Shows a toast for link status changes worth telling the user about.
fn announce(status: LiveStatus) {
    let toast = match status {
        LiveStatus::Live => ToastRequest::new(ToastSeverity::Success, "Connected", status.text()),
        LiveStatus::NotLive => ToastRequest::new(
            ToastSeverity::Error,
            "Connection lost",
            "Live updates unavailable; restart to try again",
        )
        .with_ttl(Duration::ZERO),
        LiveStatus::Connecting => return,
    };
    toast_hub::show(toast);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
