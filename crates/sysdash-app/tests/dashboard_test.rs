//! Dashboard integration tests.
//!
//! Runs the full [`Application`] against a mock backend and observes it only
//! through the published view.

mod integration;
use integration::common::mock_ws::{system_data_frame, MockWsServer, REPLY_PREFIX};

use chrono::{Local, NaiveDate};
use std::time::Duration;
use sysdash_app::{AppConfig, AppHandle, Application, AppResult, DashboardView, QuickAction};
use sysdash_core::ChatRole;
use sysdash_ws::ConnectionState;
use tokio::task::JoinHandle;
use tokio::time::timeout;

fn config_for(url: String) -> AppConfig {
    let mut config = AppConfig {
        ws_url: url,
        greeting: "Hello from the assistant".to_string(),
        ..AppConfig::default()
    };
    config.websocket.reconnect_delay_ms = 100;
    config
}

fn start_app(config: AppConfig) -> (AppHandle, JoinHandle<AppResult<()>>) {
    let app = Application::new(config).unwrap();
    let handle = app.handle();
    let task = tokio::spawn(app.run());
    (handle, task)
}

async fn wait_for_view(
    handle: &AppHandle,
    condition: impl FnMut(&DashboardView) -> bool,
) -> DashboardView {
    let mut rx = handle.subscribe();
    let view = timeout(Duration::from_secs(3), rx.wait_for(condition))
        .await
        .expect("view condition within timeout")
        .expect("view channel open");
    view.clone()
}

fn contents(view: &DashboardView) -> Vec<(ChatRole, String)> {
    view.transcript
        .iter()
        .map(|e| (e.role(), e.content().to_string()))
        .collect()
}

/// Test that snapshots and chat replies show up in the view.
#[tokio::test]
async fn test_dashboard_shows_snapshot_and_chat() {
    let server = MockWsServer::start().await;
    let (handle, task) = start_app(config_for(server.url()));

    wait_for_view(&handle, |v| v.connection_state == ConnectionState::Connected).await;

    server
        .push(system_data_frame(42.0, "2024-05-01T12:00:00"))
        .await;
    let view = wait_for_view(&handle, |v| v.latest_snapshot.is_some()).await;
    let metrics = view.latest_snapshot.unwrap().snapshot.metrics().unwrap();
    assert_eq!(metrics.cpu.usage_percent, 42.0);

    assert!(handle.submit_chat("hello"));
    let view = wait_for_view(&handle, |v| v.transcript.len() == 3).await;
    assert_eq!(
        contents(&view),
        vec![
            (ChatRole::Assistant, "Hello from the assistant".to_string()),
            (ChatRole::User, "hello".to_string()),
            (ChatRole::Assistant, format!("{REPLY_PREFIX}hello")),
        ]
    );

    handle.teardown();
    task.await.unwrap().unwrap();
    server.shutdown().await;
}

/// Test that the newest arrival replaces the snapshot regardless of timestamp.
#[tokio::test]
async fn test_dashboard_snapshot_arrival_order_wins() {
    let server = MockWsServer::start().await;
    let (handle, task) = start_app(config_for(server.url()));
    wait_for_view(&handle, |v| v.connection_state == ConnectionState::Connected).await;

    server
        .push(system_data_frame(10.0, "2024-05-01T12:00:10"))
        .await;
    server
        .push(system_data_frame(20.0, "2024-05-01T12:00:05"))
        .await;

    let view = wait_for_view(&handle, |v| {
        v.latest_snapshot
            .as_ref()
            .and_then(|s| s.snapshot.metrics())
            .is_some_and(|m| m.cpu.usage_percent == 20.0)
    })
    .await;
    let observed_at = view.latest_snapshot.unwrap().observed_at;
    assert_eq!(
        observed_at.with_timezone(&Local).naive_local(),
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 5)
            .unwrap()
    );

    handle.teardown();
    task.await.unwrap().unwrap();
    server.shutdown().await;
}

/// Test that a dropped connection is shown and then recovered.
#[tokio::test]
async fn test_dashboard_reconnects() {
    let server = MockWsServer::start().await;
    let (handle, task) = start_app(config_for(server.url()));
    wait_for_view(&handle, |v| v.connection_state == ConnectionState::Connected).await;

    let mut rx = handle.subscribe();
    rx.mark_unchanged();
    server.drop_connections().await;

    timeout(
        Duration::from_secs(3),
        rx.wait_for(|v| v.connection_state != ConnectionState::Connected),
    )
    .await
    .expect("disconnect observed")
    .unwrap();
    wait_for_view(&handle, |v| v.connection_state == ConnectionState::Connected).await;
    assert_eq!(server.connection_count().await, 2);

    assert!(handle.quick_action(QuickAction::Cpu));
    let view = wait_for_view(&handle, |v| v.transcript.len() == 3).await;
    assert_eq!(
        view.transcript[2].content(),
        format!("{REPLY_PREFIX}Is my CPU usage normal?")
    );

    handle.teardown();
    task.await.unwrap().unwrap();
    server.shutdown().await;
}

/// Test that chat while disconnected is recorded but never delivered.
#[tokio::test]
async fn test_dashboard_chat_while_disconnected() {
    let (handle, task) = start_app(config_for("ws://127.0.0.1:1/ws".to_string()));

    assert!(handle.submit_chat("is anyone there?"));
    let view = wait_for_view(&handle, |v| v.transcript.len() == 2).await;
    assert_eq!(view.transcript[1].role(), ChatRole::User);
    assert_ne!(view.connection_state, ConnectionState::Connected);

    // Blank input is ignored.
    assert!(handle.submit_chat("   "));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(handle.view().transcript.len(), 2);

    handle.teardown();
    task.await.unwrap().unwrap();
}

/// Test that teardown stops the connection and freezes the view.
#[tokio::test]
async fn test_dashboard_teardown_freezes_view() {
    let server = MockWsServer::start().await;
    let (handle, task) = start_app(config_for(server.url()));
    wait_for_view(&handle, |v| v.connection_state == ConnectionState::Connected).await;

    handle.teardown();
    timeout(Duration::from_secs(2), task)
        .await
        .expect("run exits after teardown")
        .unwrap()
        .unwrap();

    let frozen = handle.view();
    assert_eq!(frozen.connection_state, ConnectionState::Disconnected);
    assert!(!handle.submit_chat("after teardown"));

    server
        .push(system_data_frame(99.0, "2024-05-01T12:00:00"))
        .await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(handle.view(), frozen);
    assert_eq!(server.connection_count().await, 1);
    server.shutdown().await;
}
