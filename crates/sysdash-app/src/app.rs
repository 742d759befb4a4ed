//! Application driver.
//!
//! Owns the connection task and the [`DashboardCore`], and serializes
//! connection events and user commands onto one event loop.

use crate::config::AppConfig;
use crate::core::{ChatSubmission, DashboardCore, DashboardView, QuickAction};
use crate::error::AppResult;
use std::sync::Arc;
use sysdash_telemetry::Metrics;
use sysdash_ws::{ConnectionEvent, ConnectionManager, WsHandle};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Commands accepted by a running [`Application`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Chat(String),
    QuickAction(QuickAction),
    Teardown,
}

/// Cloneable front end onto a running [`Application`].
#[derive(Clone)]
pub struct AppHandle {
    commands: mpsc::UnboundedSender<AppCommand>,
    view: watch::Receiver<DashboardView>,
}

impl AppHandle {
    /// Returns false once the application has stopped.
    pub fn submit_chat(&self, text: impl Into<String>) -> bool {
        self.commands.send(AppCommand::Chat(text.into())).is_ok()
    }

    pub fn quick_action(&self, action: QuickAction) -> bool {
        self.commands.send(AppCommand::QuickAction(action)).is_ok()
    }

    pub fn teardown(&self) {
        let _ = self.commands.send(AppCommand::Teardown);
    }

    /// Latest published view.
    pub fn view(&self) -> DashboardView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.view.clone()
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    manager: Arc<ConnectionManager>,
    core: DashboardCore<WsHandle>,
    event_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    command_tx: mpsc::UnboundedSender<AppCommand>,
    command_rx: mpsc::UnboundedReceiver<AppCommand>,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let manager = Arc::new(ConnectionManager::new(config.connection_config(), event_tx));
        let core = DashboardCore::new(manager.handle(), &config.greeting);

        Ok(Self {
            config,
            manager,
            core,
            event_rx,
            command_tx,
            command_rx,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn handle(&self) -> AppHandle {
        AppHandle {
            commands: self.command_tx.clone(),
            view: self.core.subscribe(),
        }
    }

    /// Run until teardown is requested, every [`AppHandle`] is dropped, or
    /// Ctrl-C is received.
    pub async fn run(self) -> AppResult<()> {
        let Self {
            config,
            manager,
            mut core,
            mut event_rx,
            command_tx,
            mut command_rx,
        } = self;
        drop(command_tx);

        info!(url = %config.ws_url, "Starting dashboard");

        let connector = manager.clone();
        let ws_task = tokio::spawn(async move { connector.connect().await });

        loop {
            tokio::select! {
                Some(event) = event_rx.recv() => {
                    core.handle_event(event);
                }
                command = command_rx.recv() => {
                    match command {
                        Some(AppCommand::Chat(text)) => {
                            log_submission(core.submit_chat(&text));
                        }
                        Some(AppCommand::QuickAction(action)) => {
                            log_submission(core.submit_quick_action(action));
                        }
                        Some(AppCommand::Teardown) => {
                            info!("Teardown requested");
                            break;
                        }
                        None => {
                            info!("All handles dropped, shutting down");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl-C, shutting down");
                    break;
                }
            }
        }

        core.teardown();
        if let Err(e) = ws_task.await? {
            error!(?e, "WebSocket connection failed");
            return Err(e.into());
        }

        let lifecycle = manager.lifecycle();
        info!(
            connect_attempts = lifecycle.connect_attempts(),
            errors = lifecycle.errors(),
            snapshots = core.snapshots().updates(),
            transcript = core.transcript().len(),
            "Dashboard stopped"
        );
        match Metrics::render() {
            Ok(text) => debug!(metrics = %text, "Final metrics"),
            Err(e) => warn!(?e, "Failed to render metrics"),
        }

        Ok(())
    }
}

fn log_submission(outcome: ChatSubmission) {
    match outcome {
        ChatSubmission::Sent => debug!("Chat message sent"),
        ChatSubmission::Dropped => info!("Not connected; chat message recorded but not sent"),
        ChatSubmission::Rejected => debug!("Empty chat message ignored"),
    }
}
