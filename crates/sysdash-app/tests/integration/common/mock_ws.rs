//! Mock monitoring backend for integration tests.
//!
//! Provides a WebSocket server that can:
//! - Accept connections and count them
//! - Record received text frames
//! - Answer `chat` with a `chat_response` and `ping` with `pong` (or stay
//!   silent on `ping`, to exercise the keepalive timeout)
//! - Push arbitrary frames to, or drop, every open connection

use futures_util::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// Prefix the mock puts in front of every chat reply.
pub const REPLY_PREFIX: &str = "echo: ";

enum ServerCommand {
    Push(String),
    Close,
}

type Peers = Arc<Mutex<Vec<mpsc::UnboundedSender<ServerCommand>>>>;

/// A mock WebSocket server for testing.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    messages: Arc<Mutex<VecDeque<String>>>,
    connections: Arc<Mutex<u32>>,
    peers: Peers,
}

impl MockWsServer {
    /// Start a new mock WebSocket server on an available port.
    pub async fn start() -> Self {
        Self::start_with(true).await
    }

    /// Start a server that never answers keepalive pings.
    pub async fn start_without_pong() -> Self {
        Self::start_with(false).await
    }

    async fn start_with(answer_pings: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let messages: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(VecDeque::new()));
        let connections: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
        let peers: Peers = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let messages_clone = messages.clone();
        let connections_clone = connections.clone();
        let peers_clone = peers.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        let (tx, rx) = mpsc::unbounded_channel();
                        peers_clone.lock().await.push(tx);
                        tokio::spawn(handle_connection(
                            stream,
                            messages_clone.clone(),
                            connections_clone.clone(),
                            rx,
                            answer_pings,
                        ));
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            messages,
            connections,
            peers,
        }
    }

    /// Get the server's WebSocket URL.
    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Get the number of accepted connections.
    pub async fn connection_count(&self) -> u32 {
        *self.connections.lock().await
    }

    /// Get all received text frames.
    pub async fn received_messages(&self) -> Vec<String> {
        self.messages.lock().await.iter().cloned().collect()
    }

    /// Send a text frame to every open connection.
    pub async fn push(&self, text: impl Into<String>) {
        let text = text.into();
        let mut peers = self.peers.lock().await;
        peers.retain(|tx| tx.send(ServerCommand::Push(text.clone())).is_ok());
    }

    /// Close every open connection from the server side.
    pub async fn drop_connections(&self) {
        let mut peers = self.peers.lock().await;
        for tx in peers.drain(..) {
            let _ = tx.send(ServerCommand::Close);
        }
    }

    /// Shutdown the server.
    pub async fn shutdown(self) {
        self.drop_connections().await;
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(
    stream: TcpStream,
    messages: Arc<Mutex<VecDeque<String>>>,
    connections: Arc<Mutex<u32>>,
    mut commands: mpsc::UnboundedReceiver<ServerCommand>,
    answer_pings: bool,
) {
    {
        let mut count = connections.lock().await;
        *count += 1;
    }

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    messages.lock().await.push_back(text.clone());
                    if let Some(reply) = reply_to(&text, answer_pings) {
                        let _ = write.send(Message::Text(reply)).await;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            cmd = commands.recv() => match cmd {
                Some(ServerCommand::Push(text)) => {
                    let _ = write.send(Message::Text(text)).await;
                }
                Some(ServerCommand::Close) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }
}

fn reply_to(text: &str, answer_pings: bool) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(text).ok()?;
    match parsed.get("type")?.as_str()? {
        "chat" => {
            let message = parsed.get("message")?.as_str()?;
            Some(
                serde_json::json!({
                    "type": "chat_response",
                    "response": format!("{REPLY_PREFIX}{message}"),
                    "timestamp": "2024-05-01T12:00:00.000000",
                })
                .to_string(),
            )
        }
        "ping" if answer_pings => Some(serde_json::json!({"type": "pong"}).to_string()),
        _ => None,
    }
}

/// A `system_data` frame with a fixed shape and the given CPU usage.
pub fn system_data_frame(cpu_usage: f64, timestamp: &str) -> String {
    serde_json::json!({
        "type": "system_data",
        "data": {
            "system": {
                "platform": "Linux",
                "release": "6.1.0",
                "machine": "x86_64",
                "processor": "x86_64"
            },
            "uptime_hours": 12.5,
            "cpu": {"cores": 8, "usage_percent": cpu_usage, "frequency_mhz": "N/A"},
            "memory": {
                "total_gb": 16.0,
                "used_gb": 8.0,
                "available_gb": 8.0,
                "usage_percent": 50.0
            },
            "disks": [{
                "device": "/dev/sda1",
                "total_gb": 500.0,
                "used_gb": 250.0,
                "free_gb": 250.0,
                "percentage": 50.0
            }]
        },
        "timestamp": timestamp,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_starts() {
        let server = MockWsServer::start().await;
        assert!(server.url().starts_with("ws://127.0.0.1:"));
        server.shutdown().await;
    }

    #[test]
    fn test_reply_to_chat_and_ping() {
        let reply = reply_to(r#"{"type":"chat","message":"hi"}"#, true).unwrap();
        assert!(reply.contains("echo: hi"));
        assert_eq!(
            reply_to(r#"{"type":"ping"}"#, true).unwrap(),
            r#"{"type":"pong"}"#
        );
        assert!(reply_to(r#"{"type":"ping"}"#, false).is_none());
        assert!(reply_to("not json", true).is_none());
    }
}
