//! Connection manager behaviour against the in-memory connector.

use std::{sync::Arc, time::Duration};

use a2ui_core::{TransportError, memory::MemoryConnector};
use a2ui_transport::{ConnectionEvent, ConnectionManager, ConnectionOptions};
use serde_json::json;
use url::Url;

fn url() -> Url {
    Url::parse("ws://dashboard.test/ws/events").unwrap()
}

fn ms(d: Duration) -> u128 {
    (d.as_micros() + 500) / 1000
}

fn gaps(connector: &MemoryConnector) -> Vec<u128> {
    connector
        .attempts()
        .windows(2)
        .map(|w| ms(w[1].at - w[0].at))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles_and_caps() {
    let (connector, _peers) = MemoryConnector::new();
    connector.set_refuse_all(true);
    let (manager, _events) = ConnectionManager::new(
        Arc::new(connector.clone()),
        url(),
        ConnectionOptions::default(),
    );

    manager.connect();
    tokio::time::sleep(Duration::from_secs(200)).await;

    let gaps = gaps(&connector);
    assert_eq!(
        &gaps[..7],
        &[1000, 2000, 4000, 8000, 16000, 30000, 30000]
    );
    assert!(gaps.iter().all(|g| *g <= 30000));
}

#[tokio::test(start_paused = true)]
async fn test_successful_open_resets_backoff() {
    let (connector, mut peers) = MemoryConnector::new();
    connector.refuse_next(2);
    let (manager, _events) = ConnectionManager::new(
        Arc::new(connector.clone()),
        url(),
        ConnectionOptions::default(),
    );

    manager.connect();
    let peer = peers.accept().await.unwrap();
    peer.close();
    let _second = peers.accept().await.unwrap();

    assert_eq!(gaps(&connector), vec![1000, 2000, 1000]);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_pending_reconnect() {
    let (connector, _peers) = MemoryConnector::new();
    connector.set_refuse_all(true);
    let (manager, _events) = ConnectionManager::new(
        Arc::new(connector.clone()),
        url(),
        ConnectionOptions::default(),
    );

    manager.connect();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(connector.attempt_count(), 1);

    manager.disconnect();
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(connector.attempt_count(), 1);
    assert!(!manager.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_connect_is_noop_while_running() {
    let (connector, mut peers) = MemoryConnector::new();
    let (manager, _events) = ConnectionManager::new(
        Arc::new(connector.clone()),
        url(),
        ConnectionOptions::default(),
    );

    manager.connect();
    let _peer = peers.accept().await.unwrap();
    manager.connect();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(connector.attempt_count(), 1);
    assert!(manager.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_after_disconnect_reports_open() {
    let (connector, mut peers) = MemoryConnector::new();
    let (manager, mut events) = ConnectionManager::new(
        Arc::new(connector.clone()),
        url(),
        ConnectionOptions::default(),
    );

    manager.connect();
    let first = peers.accept().await.unwrap();
    assert_eq!(events.recv().await, Some(ConnectionEvent::Opened));

    manager.disconnect();
    manager.connect();
    let _second = peers.accept().await.unwrap();
    assert_eq!(events.recv().await, Some(ConnectionEvent::Opened));

    drop(first);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(connector.attempt_count(), 2);
    assert!(manager.is_open());

    manager.disconnect();
    assert!(!manager.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frames_do_not_disrupt_stream() {
    let (connector, mut peers) = MemoryConnector::new();
    let (manager, mut events) =
        ConnectionManager::new(Arc::new(connector), url(), ConnectionOptions::default());

    manager.connect();
    let peer = peers.accept().await.unwrap();
    assert_eq!(events.recv().await, Some(ConnectionEvent::Opened));

    peer.send_text("{not json");
    peer.send_text("[1, 2, 3]");
    peer.send_json(&json!({"type": "agent.joined", "agent_id": "a1"}));

    let Some(ConnectionEvent::Message(bag)) = events.recv().await else {
        panic!("Expected a message event");
    };
    assert_eq!(bag["agent_id"], "a1");
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_mode_reports_failure_and_stops() {
    let (connector, _peers) = MemoryConnector::new();
    connector.set_refuse_all(true);
    let (manager, mut events) = ConnectionManager::new(
        Arc::new(connector.clone()),
        url(),
        ConnectionOptions::once(),
    );

    manager.connect();
    let event = events.recv().await.unwrap();
    assert!(matches!(
        event,
        ConnectionEvent::Closed {
            error: Some(TransportError::Connect(_))
        }
    ));

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(connector.attempt_count(), 1);
    assert!(!manager.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_frames_queued_before_open_are_sent() {
    let (connector, mut peers) = MemoryConnector::new();
    let (manager, _events) =
        ConnectionManager::new(Arc::new(connector), url(), ConnectionOptions::default());

    tokio_test::assert_err!(manager.send("early".to_string()));

    manager.connect();
    tokio_test::assert_ok!(manager.send("hello".to_string()));
    let mut peer = peers.accept().await.unwrap();

    assert_eq!(peer.recv().await.as_deref(), Some("hello"));
}

#[tokio::test(start_paused = true)]
async fn test_peer_error_is_reported_then_reconnects() {
    let (connector, mut peers) = MemoryConnector::new();
    let (manager, mut events) = ConnectionManager::new(
        Arc::new(connector.clone()),
        url(),
        ConnectionOptions::default(),
    );

    manager.connect();
    let peer = peers.accept().await.unwrap();
    assert_eq!(events.recv().await, Some(ConnectionEvent::Opened));

    peer.fail("reset by peer");
    assert_eq!(
        events.recv().await,
        Some(ConnectionEvent::Closed {
            error: Some(TransportError::Io("reset by peer".to_string()))
        })
    );

    let _again = peers.accept().await.unwrap();
    assert_eq!(events.recv().await, Some(ConnectionEvent::Opened));
    assert_eq!(gaps(&connector), vec![1000]);
}
