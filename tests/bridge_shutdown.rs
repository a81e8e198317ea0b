use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_util::codec::{FramedRead, FramedWrite};

use tracerec_cli::cli::ServeRuntime;
use tracerec_cli::transport::{self, frame_codec};
use tracerec_cli::{Config, ExitReason, RejectingRouter};
use tracerec_tracer::NullSnapshotterFactory;

#[tokio::test]
async fn stream_close_drives_orderly_shutdown() {
    let runtime = ServeRuntime::new(&Config::default(), Arc::new(NullSnapshotterFactory));
    let (client, server) = tokio::io::duplex(16 * 1024);
    let (server_reader, server_writer) = tokio::io::split(server);
    let bridge = tokio::spawn(transport::run(
        server_reader,
        server_writer,
        Arc::new(RejectingRouter),
    ));

    let (client_reader, client_writer) = tokio::io::split(client);
    let mut requests = FramedWrite::new(client_writer, frame_codec());
    let mut replies = FramedRead::new(client_reader, frame_codec());
    requests
        .send(Bytes::from_static(br#"{"id":1,"guid":"","method":"initialize"}"#))
        .await
        .unwrap();
    let reply: Value = serde_json::from_slice(&replies.next().await.unwrap().unwrap()).unwrap();
    assert_eq!(reply["id"], 1);
    assert!(reply["error"]["error"]["message"].is_string());

    drop(requests);
    drop(replies);
    tokio::time::timeout(Duration::from_secs(5), bridge)
        .await
        .expect("bridge did not notice the closed stream")
        .unwrap()
        .unwrap();

    let reason = runtime
        .shutdown_coordinator(Duration::from_secs(5))
        .run()
        .await;
    assert_eq!(reason, ExitReason::Graceful);
    assert!(!runtime.registry.is_installed());
}
