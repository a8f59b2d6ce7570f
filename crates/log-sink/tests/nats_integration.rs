//! End-to-end tests against a live NATS server with JetStream enabled.
//!
//! Run with `cargo test -- --ignored` once a server is up, e.g.
//! `nats-server -js`. The server URL is taken from `NATS_URL` and falls back
//! to `nats://localhost:4222`.

use std::path::Path;
use std::time::Duration;

use assert_matches::assert_matches;
use sdr_log_sink::{
    CONTENT_TYPE_HEADER, CONTENT_TYPE_JSON, Error, LOG_STREAM_NAME, LogSink, LogSinkOptions,
};
use uuid::Uuid;

async fn connect() -> async_nats::Client {
    let nats_url =
        std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string());

    async_nats::connect(&nats_url)
        .await
        .expect("Failed to connect to NATS for tests")
}

async fn wait_for_lines(path: &Path, expected: usize) -> String {
    for _ in 0..50 {
        if let Ok(contents) = std::fs::read_to_string(path) {
            if contents.lines().count() >= expected {
                return contents;
            }
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    panic!("log file never reached {expected} lines at {}", path.display());
}

#[tokio::test]
#[ignore = "Requires NATS server to be running"]
async fn sinks_published_events_to_disk() {
    let client = connect().await;
    let jetstream_context = async_nats::jetstream::new(client.clone());

    // Leftover state from an earlier aborted run would replay into the file.
    jetstream_context.delete_stream(LOG_STREAM_NAME).await.ok();

    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir
        .path()
        .join(format!("{}.log", Uuid::new_v4().as_hyphenated()));

    let sink = LogSink::new(LogSinkOptions {
        client: client.clone(),
        log_path: log_path.clone(),
    });
    let _sink_task = sink.start().await.expect("sink start");

    let mut json_headers = async_nats::HeaderMap::new();
    json_headers.insert(CONTENT_TYPE_HEADER, CONTENT_TYPE_JSON);

    jetstream_context
        .publish_with_headers(
            LOG_STREAM_NAME,
            json_headers.clone(),
            r#"{"timestamp": 1700000000.123456, "message": "boot complete"}"#.into(),
        )
        .await
        .expect("publish")
        .await
        .expect("publish ack");

    jetstream_context
        .publish_with_headers(
            LOG_STREAM_NAME,
            json_headers,
            r#"{"message": "no timestamp field"}"#.into(),
        )
        .await
        .expect("publish")
        .await
        .expect("publish ack");

    let mut plain_headers = async_nats::HeaderMap::new();
    plain_headers.insert(CONTENT_TYPE_HEADER, "text/plain");

    jetstream_context
        .publish_with_headers(LOG_STREAM_NAME, plain_headers, "raw sensor ping".into())
        .await
        .expect("publish")
        .await
        .expect("publish ack");

    let contents = wait_for_lines(&log_path, 2).await;
    let lines: Vec<&str> = contents.lines().collect();

    assert_eq!(lines.len(), 2, "dropped delivery must not produce a line");
    assert_eq!(lines[0], "1700000000.123456 : boot complete");
    assert!(lines[1].ends_with(" : raw sensor ping"));

    sink.shutdown().await;

    jetstream_context.delete_stream(LOG_STREAM_NAME).await.ok();
}

#[tokio::test]
#[ignore = "Requires NATS server to be running"]
async fn second_start_is_rejected() {
    let client = connect().await;

    let dir = tempfile::tempdir().expect("tempdir");
    let sink = LogSink::new(LogSinkOptions {
        client: client.clone(),
        log_path: dir.path().join("sdr.log"),
    });

    let _sink_task = sink.start().await.expect("sink start");
    assert_matches!(sink.start().await, Err(Error::AlreadyStarted));

    sink.shutdown().await;

    let jetstream_context = async_nats::jetstream::new(client);
    jetstream_context.delete_stream(LOG_STREAM_NAME).await.ok();
}
