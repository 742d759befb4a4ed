//! sysdash - Entry Point
//!
//! Console front end: stdin lines are sent as chat messages, `/status`,
//! `/cpu`, `/memory` and `/disk` trigger the quick actions, `/quit` exits.

use anyhow::Result;
use clap::Parser;
use std::io::BufRead;
use sysdash_app::{AppConfig, AppHandle, Application, DashboardView, QuickAction};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Realtime system-telemetry dashboard client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via SYSDASH_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Backend WebSocket URL (overrides config and SYSDASH_URL)
    #[arg(short, long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any WS connections)
    sysdash_ws::init_crypto();

    let args = Args::parse();

    // Determine config path: CLI arg > SYSDASH_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var(sysdash_app::config::CONFIG_ENV).ok())
        .unwrap_or_else(|| sysdash_app::config::DEFAULT_CONFIG_PATH.to_string());

    let mut config = AppConfig::load_or_default(&config_path)?;
    config.apply_env_overrides();
    if let Some(url) = args.url {
        config.ws_url = url;
    }

    sysdash_telemetry::init_logging(&config.telemetry.log_level)?;

    info!("Starting sysdash v{}", env!("CARGO_PKG_VERSION"));
    info!(config_path = %config_path, ws_url = %config.ws_url, "Configuration loaded");

    let app = Application::new(config)?;
    let handle = app.handle();

    tokio::spawn(render_views(handle.subscribe()));
    spawn_console_reader(handle);

    app.run().await?;

    Ok(())
}

/// Print chat entries as they arrive and log state changes.
async fn render_views(mut rx: watch::Receiver<DashboardView>) {
    let mut printed = 0;
    let mut last_state = None;
    let mut last_snapshot = None;

    loop {
        {
            let view = rx.borrow_and_update();
            if last_state != Some(view.connection_state) {
                info!(state = %view.connection_state, "Connection state");
                last_state = Some(view.connection_state);
            }
            if view.latest_snapshot != last_snapshot {
                if let Some(latest) = &view.latest_snapshot {
                    print_snapshot(latest);
                }
                last_snapshot = view.latest_snapshot.clone();
            }
            for entry in view.transcript.iter().skip(printed) {
                println!(
                    "[{}] {}: {}",
                    entry.created_at().format("%H:%M:%S"),
                    entry.role(),
                    entry.content()
                );
            }
            printed = view.transcript.len();
        }

        if rx.changed().await.is_err() {
            break;
        }
    }
}

fn print_snapshot(latest: &sysdash_state::ObservedSnapshot) {
    if let Some(err) = latest.snapshot.error() {
        warn!(error = %err, "Backend could not collect metrics");
        return;
    }
    if let Some(m) = latest.snapshot.metrics() {
        debug!(
            observed_at = %latest.observed_at,
            cpu_percent = m.cpu.usage_percent,
            memory_percent = m.memory.usage_percent,
            max_disk_percent = ?m.max_disk_percentage(),
            uptime_hours = m.uptime_hours,
            "Snapshot"
        );
    }
}

/// Read stdin on a dedicated thread; EOF or `/quit` tears the app down.
fn spawn_console_reader(handle: AppHandle) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line == "/quit" {
                break;
            }
            let delivered = match QuickAction::from_command(line) {
                Some(action) => handle.quick_action(action),
                None => handle.submit_chat(line),
            };
            if !delivered {
                return;
            }
        }
        handle.teardown();
    });
}
