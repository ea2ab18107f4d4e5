use netops_devkit::{FeedMessageBuilder as Msg, TestHarness};
use netops_kernel::{ConnectionState, LiveUpdateClient, NodeStatus, StreamHandle, TopologyStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

const DELAY: Duration = Duration::from_millis(300);

async fn connect(harness: &TestHarness) -> (Arc<LiveUpdateClient>, StreamHandle) {
    let client = Arc::new(LiveUpdateClient::new(TopologyStore::new()));
    let url = Url::parse(&harness.feed_url()).unwrap();
    let handle = client.spawn(url, DELAY);
    harness.wait_for_feed_clients(1).await.unwrap();
    (client, handle)
}

fn two_nodes() -> Vec<serde_json::Value> {
    vec![
        Msg::node("n1", "edge-fw", "10.0.0.1", 48.85, 2.35, "online"),
        Msg::node("n2", "db-1", "10.0.0.2", 50.11, 8.68, "online"),
    ]
}

#[tokio::test]
async fn test_initial_state_loaded_on_connect() {
    let harness = TestHarness::start().await.unwrap();
    harness.greet_with(two_nodes());

    let (client, handle) = connect(&harness).await;
    let store = client.store().clone();

    harness.expect("initial nodes", || store.node_count() == 2).await.unwrap();
    assert_eq!(handle.state(), ConnectionState::Open);
    assert_eq!(client.health().sessions, 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_malformed_frame_does_not_stop_the_feed() {
    let harness = TestHarness::start().await.unwrap();
    let (client, handle) = connect(&harness).await;
    let store = client.store().clone();

    harness.server.push_feed_frame("{ not json");
    harness.send_feed(&json!({"type": "threat_event", "id": "t9"}));
    harness.send_feed(&Msg::node_add(Msg::node("n3", "sw-1", "10.0.0.3", 40.4, -3.7, "warning")));

    harness.expect("node added after bad frames", || store.node("n3").is_some()).await.unwrap();
    let health = client.health();
    assert_eq!(health.frames_malformed, 1);
    assert_eq!(health.frames_unknown, 1);
    assert_eq!(handle.state(), ConnectionState::Open);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_node_remove_clears_selection_and_links() {
    let harness = TestHarness::start().await.unwrap();
    harness.greet_with(two_nodes());
    let (client, handle) = connect(&harness).await;
    let store = client.store().clone();
    harness.expect("initial nodes", || store.node_count() == 2).await.unwrap();

    harness.send_feed(&Msg::connections_update(&[("n1", "n2"), ("n2", "n2")]));
    harness.expect("connections replaced", || store.connections().len() == 2).await.unwrap();

    store.select_node(store.node("n1"));
    harness.send_feed(&Msg::node_remove("n1"));

    harness.expect("selection cleared", || store.selected_node().is_none()).await.unwrap();
    assert_eq!(store.node_count(), 1);
    let remaining: Vec<String> = store.connections().into_iter().map(|c| c.id).collect();
    assert_eq!(remaining, vec!["n2-n2-1"]);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_node_update_reaches_selected_copy() {
    let harness = TestHarness::start().await.unwrap();
    harness.greet_with(two_nodes());
    let (client, handle) = connect(&harness).await;
    let store = client.store().clone();
    harness.expect("initial nodes", || store.node_count() == 2).await.unwrap();

    store.select_node(store.node("n2"));
    harness.send_feed(&Msg::node_update(json!({"id": "n2", "status": "critical", "connections": 7})));

    harness
        .expect("selected node patched", || {
            store.selected_node().is_some_and(|n| n.status == NodeStatus::Critical)
        })
        .await
        .unwrap();
    let node = store.node("n2").unwrap();
    assert_eq!(node.connections, Some(7));
    assert_eq!(node.name, "db-1");

    handle.shutdown().await;
}

#[tokio::test]
async fn test_reconnects_once_after_fixed_delay() {
    let harness = TestHarness::start().await.unwrap();
    harness.greet_with(two_nodes());
    let (client, handle) = connect(&harness).await;
    let store = client.store().clone();
    harness.expect("initial nodes", || store.node_count() == 2).await.unwrap();

    let closed_at = Instant::now();
    harness.server.close_feed_clients();
    harness.expect("second session", || harness.server.feed_connections() == 2).await.unwrap();
    assert!(closed_at.elapsed() >= DELAY);

    // une seule tentative par fermeture
    tokio::time::sleep(DELAY + Duration::from_millis(200)).await;
    assert_eq!(harness.server.feed_connections(), 2);
    assert_eq!(harness.server.active_feed_clients(), 1);

    // l'état initial rejoué remplace les nœuds au lieu de les dupliquer
    harness.expect("resynced", || client.health().sessions == 2).await.unwrap();
    harness.expect("no duplicates", || store.node_count() == 2).await.unwrap();

    handle.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_closes_socket_and_stops_retrying() {
    let harness = TestHarness::start().await.unwrap();
    let (_client, handle) = connect(&harness).await;
    let mut state = handle.watch_state();

    handle.shutdown().await;

    assert_eq!(*state.borrow_and_update(), ConnectionState::Disconnected);
    harness.expect("server saw the close", || harness.server.active_feed_clients() == 0).await.unwrap();
    tokio::time::sleep(DELAY * 2).await;
    assert_eq!(harness.server.feed_connections(), 1);
}

#[tokio::test]
async fn test_dropping_handle_stops_stream() {
    let harness = TestHarness::start().await.unwrap();
    let (_client, handle) = connect(&harness).await;

    drop(handle);

    harness.expect("socket released", || harness.server.active_feed_clients() == 0).await.unwrap();
    tokio::time::sleep(DELAY * 2).await;
    assert_eq!(harness.server.feed_connections(), 1);
}
