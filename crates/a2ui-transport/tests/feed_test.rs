//! Event feed client behaviour against the in-memory connector.

use std::{sync::Arc, time::Duration};

use a2ui_core::{FeedConfig, FeedEvent, Origin, memory::MemoryConnector};
use a2ui_transport::EventFeedClient;
use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;

fn config() -> FeedConfig {
    FeedConfig::new(Origin::parse("http://dashboard.test").unwrap())
}

/// Listener that forwards every event's `n` field to a channel.
fn forward(client: &EventFeedClient<MemoryConnector>) -> mpsc::UnboundedReceiver<u64> {
    let (tx, rx) = mpsc::unbounded_channel();
    let _subscription = client.subscribe(Arc::new(move |event: &FeedEvent| {
        let n = event.get("n").and_then(serde_json::Value::as_u64).unwrap_or(u64::MAX);
        let _ = tx.send(n);
    }));
    rx
}

#[tokio::test(start_paused = true)]
async fn test_feed_connects_to_derived_endpoint() {
    let (connector, mut peers) = MemoryConnector::new();
    let client = EventFeedClient::new(connector, &config()).unwrap();

    client.connect();
    let peer = peers.accept().await.unwrap();

    assert_eq!(peer.url().as_str(), "ws://dashboard.test/ws/events");
}

#[tokio::test(start_paused = true)]
async fn test_feed_retains_most_recent_fifty() {
    let (connector, mut peers) = MemoryConnector::new();
    let client = EventFeedClient::new(connector, &config()).unwrap();
    let mut seen = forward(&client);

    client.connect();
    let peer = peers.accept().await.unwrap();
    for n in 0..55 {
        peer.send_json(&json!({"type": "order.created", "n": n}));
    }
    for _ in 0..55 {
        seen.recv().await.unwrap();
    }

    let recent = client.recent();
    assert_eq!(recent.len(), 50);
    assert_eq!(recent[0].get("n"), Some(&json!(54)));
    assert_eq!(recent[49].get("n"), Some(&json!(5)));
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frame_does_not_stop_feed() {
    let (connector, mut peers) = MemoryConnector::new();
    let client = EventFeedClient::new(connector, &config()).unwrap();
    let mut seen = forward(&client);

    client.connect();
    let peer = peers.accept().await.unwrap();
    peer.send_text("garbage");
    peer.send_json(&json!({"type": "tick", "n": 1}));

    assert_eq!(seen.recv().await, Some(1));
    assert_eq!(client.recent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_listeners_are_independent() {
    let (connector, mut peers) = MemoryConnector::new();
    let client = EventFeedClient::new(connector, &config()).unwrap();

    let (tx, mut first_rx) = mpsc::unbounded_channel();
    let first = client.subscribe(Arc::new(move |_: &FeedEvent| {
        let _ = tx.send(());
    }));
    let mut second_rx = forward(&client);

    client.connect();
    let peer = peers.accept().await.unwrap();
    peer.send_json(&json!({"n": 1}));
    assert_eq!(second_rx.recv().await, Some(1));
    assert!(first_rx.recv().await.is_some());

    first.unsubscribe();
    peer.send_json(&json!({"n": 2}));
    assert_eq!(second_rx.recv().await, Some(2));
    assert!(first_rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_feed_reconnects_after_close() {
    let (connector, mut peers) = MemoryConnector::new();
    let client = EventFeedClient::new(connector.clone(), &config()).unwrap();

    client.connect();
    let peer = peers.accept().await.unwrap();
    peer.close();

    let _again = peers.accept().await.unwrap();
    let attempts = connector.attempts();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[1].at - attempts[0].at, Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_disconnected_feed_stays_down() {
    let (connector, mut peers) = MemoryConnector::new();
    let client = EventFeedClient::new(connector.clone(), &config()).unwrap();

    client.connect();
    let peer = peers.accept().await.unwrap();
    client.disconnect();
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert!(peer.is_closed());
    assert_eq!(connector.attempt_count(), 1);
    assert!(!client.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_late_subscriber_gets_history_then_live() {
    let (connector, mut peers) = MemoryConnector::new();
    let client = EventFeedClient::new(connector, &config()).unwrap();
    let mut seen = forward(&client);

    client.connect();
    let peer = peers.accept().await.unwrap();
    peer.send_json(&json!({"n": 1}));
    peer.send_json(&json!({"n": 2}));
    seen.recv().await.unwrap();
    seen.recv().await.unwrap();

    let mut stream = client.history_plus_stream();
    peer.send_json(&json!({"n": 3}));

    let mut ns = Vec::new();
    for _ in 0..3 {
        ns.push(stream.next().await.unwrap().get("n").unwrap().as_u64().unwrap());
    }
    assert_eq!(ns, vec![1, 2, 3]);
}
