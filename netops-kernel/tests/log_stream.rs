use netops_devkit::TestHarness;
use netops_kernel::{
    ConnectionState, LiveUpdateClient, LogLevel, LogStream, Scrollback, TopologyStore,
};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const DELAY: Duration = Duration::from_millis(300);

fn messages(scrollback: &Scrollback) -> Vec<String> {
    scrollback.entries().into_iter().map(|e| e.message).collect()
}

#[tokio::test]
async fn test_log_frames_fill_scrollback() {
    let harness = TestHarness::start().await.unwrap();
    let scrollback = Scrollback::new();
    let stream = Arc::new(LogStream::new(scrollback.clone(), DELAY));
    let handle = stream.spawn(Url::parse(&harness.logs_url()).unwrap());
    harness.wait_for_log_clients(1).await.unwrap();

    harness.send_log("error", "capture interface eth1 down");
    harness.server.push_log_frame("raw line from backend");

    harness.expect("two log lines", || scrollback.len() == 3).await.unwrap();
    let entries = scrollback.entries();
    assert_eq!(entries[0].message, "Terminal connected to backend log stream");
    assert_eq!(entries[1].level, LogLevel::Error);
    assert_eq!(entries[1].message, "capture interface eth1 down");
    assert_eq!(entries[2].level, LogLevel::Info);
    assert_eq!(entries[2].message, "raw line from backend");

    scrollback.clear();
    assert_eq!(messages(&scrollback), vec!["Terminal cleared"]);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_log_stream_reconnect_is_independent_from_feed() {
    let harness = TestHarness::start().await.unwrap();

    let client = Arc::new(LiveUpdateClient::new(TopologyStore::new()));
    let feed = client.spawn(Url::parse(&harness.feed_url()).unwrap(), DELAY);
    let scrollback = Scrollback::new();
    let logs = Arc::new(LogStream::new(scrollback.clone(), DELAY))
        .spawn(Url::parse(&harness.logs_url()).unwrap());
    harness.wait_for_feed_clients(1).await.unwrap();
    harness.wait_for_log_clients(1).await.unwrap();

    harness.server.close_log_clients();

    harness
        .expect("disconnect marker", || {
            messages(&scrollback).iter().any(|m| m.starts_with("Disconnected from backend."))
        })
        .await
        .unwrap();
    harness.expect("log stream back", || harness.server.log_connections() == 2).await.unwrap();
    harness
        .expect("connected marker twice", || {
            messages(&scrollback)
                .iter()
                .filter(|m| *m == "Terminal connected to backend log stream")
                .count()
                == 2
        })
        .await
        .unwrap();

    assert_eq!(harness.server.feed_connections(), 1);
    assert_eq!(feed.state(), ConnectionState::Open);

    feed.shutdown().await;
    logs.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_backend_logs_error_then_close() {
    let harness = TestHarness::start().await.unwrap();
    // port réservé puis libéré : connexion refusée
    let url = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        Url::parse(&format!("ws://{}/logs", listener.local_addr().unwrap())).unwrap()
    };
    let scrollback = Scrollback::new();
    let handle = Arc::new(LogStream::new(scrollback.clone(), Duration::from_secs(5))).spawn(url);

    harness
        .expect("error and disconnect markers", || scrollback.len() >= 2)
        .await
        .unwrap();
    let entries = scrollback.entries();
    assert_eq!(entries[0].message, "WebSocket connection error");
    assert_eq!(entries[0].level, LogLevel::Error);
    assert_eq!(entries[1].message, "Disconnected from backend. Reconnecting in 5s...");

    handle.shutdown().await;
}
