//! Dashboard core: the state a view layer renders and the commands it issues.
//!
//! `DashboardCore` owns the snapshot store and the chat transcript, applies
//! connection events to them in arrival order, and publishes a fresh
//! [`DashboardView`] on a watch channel after every mutation.

use std::sync::Arc;
use sysdash_core::ChatEntry;
use sysdash_state::{ChatTranscript, ObservedSnapshot, SnapshotStore};
use sysdash_telemetry::Metrics;
use sysdash_ws::{
    ConnectionEvent, ConnectionHandle, ConnectionState, InboundMessage, OutboundRequest,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Read-only view published to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub connection_state: ConnectionState,
    pub latest_snapshot: Option<ObservedSnapshot>,
    /// Shared between views until the transcript changes.
    pub transcript: Arc<[ChatEntry]>,
    /// Incremented on every published mutation.
    pub revision: u64,
}

/// Result of a chat submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSubmission {
    /// Empty text or torn-down core; nothing recorded.
    Rejected,
    /// Recorded and handed to the transport.
    Sent,
    /// Recorded locally, but the frame was dropped (not connected).
    Dropped,
}

/// Canned prompts offered next to the chat input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    SystemStatus,
    Cpu,
    Memory,
    Disk,
}

impl QuickAction {
    pub const ALL: [QuickAction; 4] = [Self::SystemStatus, Self::Cpu, Self::Memory, Self::Disk];

    pub fn prompt(&self) -> &'static str {
        match self {
            Self::SystemStatus => "What is my current system status?",
            Self::Cpu => "Is my CPU usage normal?",
            Self::Memory => "How much memory am I using?",
            Self::Disk => "Check my disk space",
        }
    }

    /// Console shortcut (`/status`, `/cpu`, `/memory`, `/disk`).
    pub fn from_command(command: &str) -> Option<Self> {
        match command.trim() {
            "/status" => Some(Self::SystemStatus),
            "/cpu" => Some(Self::Cpu),
            "/memory" => Some(Self::Memory),
            "/disk" => Some(Self::Disk),
            _ => None,
        }
    }
}

/// Composition root for the dashboard state.
pub struct DashboardCore<H: ConnectionHandle> {
    connection: H,
    connection_state: ConnectionState,
    snapshots: SnapshotStore,
    transcript: ChatTranscript,
    transcript_view: Arc<[ChatEntry]>,
    view_tx: watch::Sender<DashboardView>,
    revision: u64,
    torn_down: bool,
}

impl<H: ConnectionHandle> DashboardCore<H> {
    /// Create a core around `connection`, seeding the transcript with
    /// `greeting` unless it is empty.
    pub fn new(connection: H, greeting: &str) -> Self {
        let transcript = ChatTranscript::with_greeting(greeting);
        let transcript_view: Arc<[ChatEntry]> = Arc::from(transcript.all());
        let initial = DashboardView {
            connection_state: ConnectionState::Disconnected,
            latest_snapshot: None,
            transcript: transcript_view.clone(),
            revision: 0,
        };
        let (view_tx, _) = watch::channel(initial);
        Metrics::transcript_len(transcript.len());

        Self {
            connection,
            connection_state: ConnectionState::Disconnected,
            snapshots: SnapshotStore::new(),
            transcript,
            transcript_view,
            view_tx,
            revision: 0,
            torn_down: false,
        }
    }

    /// Change notifications; the receiver always holds the latest view.
    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            connection_state: self.connection_state,
            latest_snapshot: self.snapshots.latest().cloned(),
            transcript: self.transcript_view.clone(),
            revision: self.revision,
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Apply one connection event.
    pub fn handle_event(&mut self, event: ConnectionEvent) {
        if self.torn_down {
            debug!(?event, "Ignoring event after teardown");
            return;
        }

        match event {
            ConnectionEvent::Connecting => self.set_state(ConnectionState::Connecting),
            ConnectionEvent::Connected => {
                info!("Dashboard connected");
                self.set_state(ConnectionState::Connected);
            }
            ConnectionEvent::Disconnected { reason } => {
                warn!(%reason, "Dashboard disconnected");
                Metrics::ws_reconnect();
                self.set_state(ConnectionState::Disconnected);
            }
            ConnectionEvent::Message(msg) => self.route(msg),
            ConnectionEvent::DecodeFailed { error } => {
                debug!(%error, "Inbound frame dropped");
                Metrics::decode_error();
            }
        }
    }

    fn route(&mut self, msg: InboundMessage) {
        Metrics::frame_received(msg.kind());
        match msg {
            InboundMessage::SystemData {
                snapshot,
                timestamp,
            } => {
                self.snapshots.replace(snapshot, timestamp);
            }
            InboundMessage::ChatResponse {
                response,
                timestamp,
            } => {
                self.transcript.append_remote(response, timestamp);
                Metrics::chat_received();
                self.transcript_changed();
            }
        }
        self.publish();
    }

    /// Record a user message and send it.
    ///
    /// The entry is appended even when the connection is down; the frame
    /// itself is then dropped, never queued.
    pub fn submit_chat(&mut self, text: &str) -> ChatSubmission {
        if self.torn_down || !self.transcript.append_local(text) {
            return ChatSubmission::Rejected;
        }
        self.transcript_changed();
        self.publish();

        match self.connection.send(OutboundRequest::chat(text)) {
            Ok(()) => {
                Metrics::chat_sent();
                ChatSubmission::Sent
            }
            Err(e) => {
                warn!(error = %e, "Chat message not sent");
                Metrics::chat_dropped();
                ChatSubmission::Dropped
            }
        }
    }

    pub fn submit_quick_action(&mut self, action: QuickAction) -> ChatSubmission {
        self.submit_chat(action.prompt())
    }

    /// Tear down the connection. The view is published one last time with
    /// the Disconnected state and never changes afterwards.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.connection.teardown();
        self.set_state(ConnectionState::Disconnected);
        self.torn_down = true;
        info!("Dashboard torn down");
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.connection_state == state {
            return;
        }
        self.connection_state = state;
        Metrics::ws_state_set(state.as_str());
        self.publish();
    }

    fn transcript_changed(&mut self) {
        self.transcript_view = Arc::from(self.transcript.all());
        Metrics::transcript_len(self.transcript.len());
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.view_tx.send_replace(self.view());
    }
}
