//! Integration tests for the client multiplexer against a scripted
//! WebSocket peer standing in for the remote application.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use obsws::prelude::*;
use obsws::protocol::{GetVersion, ResponseBase, decode_custom};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

/// Starts a one-shot peer on a random port and connects a client to it.
async fn start_with(builder: ClientBuilder) -> (Client, ServerWs) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let port = listener.local_addr().expect("should have addr").port();

    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("should accept");
        tokio_tungstenite::accept_async(stream)
            .await
            .expect("handshake should succeed")
    });

    let client = builder
        .host("127.0.0.1")
        .port(port)
        .connect()
        .await
        .expect("client should connect");
    let server = accept.await.expect("accept task should complete");
    (client, server)
}

async fn start() -> (Client, ServerWs) {
    start_with(Client::builder()).await
}

/// Reads the next request frame the client wrote.
async fn next_request(server: &mut ServerWs) -> Value {
    loop {
        let msg = server
            .next()
            .await
            .expect("client should still be connected")
            .expect("frame should be valid");
        if msg.is_text() {
            return serde_json::from_str(msg.to_text().unwrap()).expect("request should be JSON");
        }
    }
}

async fn push(server: &mut ServerWs, frame: Value) {
    server
        .send(Message::text(frame.to_string()))
        .await
        .expect("peer send should succeed");
}

async fn push_raw(server: &mut ServerWs, frame: &str) {
    server
        .send(Message::text(frame.to_string()))
        .await
        .expect("peer send should succeed");
}

/// Answers `request` with `status: ok` plus `fields`.
async fn reply_ok(server: &mut ServerWs, request: &Value, fields: Value) {
    let mut frame = json!({"message-id": request["message-id"], "status": "ok"});
    if let (Some(frame), Some(fields)) = (frame.as_object_mut(), fields.as_object()) {
        frame.extend(fields.clone());
    }
    push(server, frame).await;
}

/// A request the peer answers by echoing `text` back.
#[derive(Serialize)]
struct Echo {
    text: String,
}

#[derive(Debug, Deserialize)]
struct EchoResponse {
    #[serde(flatten)]
    base: ResponseBase,
    text: String,
}

impl Request for Echo {
    const REQUEST_TYPE: &'static str = "Echo";
    type Response = EchoResponse;
}

// =========================================================================
// Requests and responses
// =========================================================================

#[tokio::test]
async fn test_get_scene_list_scenario() {
    let (client, mut server) = start().await;

    let (result, ()) = tokio::join!(client.get_scene_list(), async {
        let request = next_request(&mut server).await;
        assert_eq!(request["request-type"], "GetSceneList");
        assert_eq!(request["message-id"], "1");
        reply_ok(
            &mut server,
            &request,
            json!({"current-scene": "Main", "scenes": [{"name": "Main", "sources": []}]}),
        )
        .await;
    });

    let scenes = result.expect("request should succeed");
    assert_eq!(scenes.current_scene, "Main");
    assert_eq!(scenes.scenes.len(), 1);
    assert_eq!(scenes.scenes[0].name, "Main");

    client.close().await;
}

#[tokio::test]
async fn test_requests_written_in_acceptance_order_and_resolved_by_id() {
    let (client, mut server) = start().await;

    let mut calls = Vec::new();
    for i in 0..5 {
        let mut call = Call::new(Echo {
            text: format!("echo-{i}"),
        });
        call.send(&client).await.expect("send should succeed");
        calls.push(call);
    }

    let mut requests = Vec::new();
    for _ in 0..5 {
        requests.push(next_request(&mut server).await);
    }
    for (i, request) in requests.iter().enumerate() {
        assert_eq!(request["request-type"], "Echo");
        assert_eq!(request["message-id"], (i + 1).to_string());
        assert_eq!(request["text"], format!("echo-{i}"));
    }

    // Answer out of order; every caller still gets its own response.
    for request in requests.iter().rev() {
        reply_ok(&mut server, request, json!({"text": request["text"]})).await;
    }
    for (i, call) in calls.iter_mut().enumerate() {
        let response = call.receive().await.expect("receive should succeed");
        assert_eq!(response.text, format!("echo-{i}"));
        assert_eq!(response.base.message_id.as_str(), (i + 1).to_string());
    }

    client.close().await;
}

#[tokio::test]
async fn test_concurrent_submitters_resolve_independently() {
    let (client, mut server) = start().await;

    let mut tasks = Vec::new();
    for i in 0..4 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            client
                .submit(Echo {
                    text: format!("task-{i}"),
                })
                .await
        }));
    }

    let mut requests = Vec::new();
    for _ in 0..4 {
        requests.push(next_request(&mut server).await);
    }
    let ids: Vec<_> = requests
        .iter()
        .map(|r| r["message-id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["1", "2", "3", "4"]);

    for request in requests.iter().rev() {
        reply_ok(&mut server, request, json!({"text": request["text"]})).await;
    }
    for (i, task) in tasks.into_iter().enumerate() {
        let response = task.await.unwrap().expect("request should succeed");
        assert_eq!(response.text, format!("task-{i}"));
    }

    client.close().await;
}

#[tokio::test]
async fn test_status_error_surfaces_remote_message() {
    let (client, mut server) = start().await;

    let (result, ()) = tokio::join!(client.set_current_scene("Nope"), async {
        let request = next_request(&mut server).await;
        assert_eq!(request["scene-name"], "Nope");
        push(
            &mut server,
            json!({
                "message-id": request["message-id"],
                "status": "error",
                "error": "requested scene does not exist",
            }),
        )
        .await;
    });

    assert!(
        matches!(&result, Err(ClientError::Status(m)) if m == "requested scene does not exist"),
        "{result:?}"
    );
    client.close().await;
}

#[tokio::test]
async fn test_anomalies_do_not_stop_the_loop() {
    let (client, mut server) = start().await;

    let (result, ()) = tokio::join!(client.get_version(), async {
        push_raw(&mut server, r#"{"update-type":"foo"}"#).await;
        push_raw(&mut server, "not json").await;
        push_raw(&mut server, r#"{"update-type":"SwitchScenes","stream-timecode":"a"}"#).await;
        push(
            &mut server,
            json!({
                "update-type": "ScenesChanged",
                "stream-timecode": "9999999999999999:00:00.000",
            }),
        )
        .await;
        push(&mut server, json!({"message-id": "999", "status": "ok"})).await;

        let request = next_request(&mut server).await;
        reply_ok(
            &mut server,
            &request,
            json!({
                "version": 1.1,
                "obs-websocket-version": "4.3.0",
                "obs-studio-version": "22.0.0",
                "available-requests": "GetVersion",
            }),
        )
        .await;
    });

    let version = result.expect("request after anomalies should succeed");
    assert_eq!(version.websocket_version, "4.3.0");
    client.close().await;
}

// =========================================================================
// Call facade
// =========================================================================

#[tokio::test]
async fn test_call_misuse_and_timeout() {
    let (client, mut server) = start().await;

    let mut call = Call::new(GetVersion).with_timeout(Duration::from_millis(50));
    assert!(matches!(call.receive().await, Err(ClientError::NotSent)));

    call.send(&client).await.expect("first send should succeed");
    assert!(call.is_sent());
    assert!(matches!(call.send(&client).await, Err(ClientError::AlreadySent)));

    // Nobody answers yet.
    assert!(matches!(call.receive().await, Err(ClientError::Timeout(_))));

    // The request was not retracted: a late answer is still delivered.
    let request = next_request(&mut server).await;
    reply_ok(&mut server, &request, json!({"obs-websocket-version": "4.3.0"})).await;
    let version = call.receive().await.expect("late receive should succeed");
    assert_eq!(version.websocket_version, "4.3.0");

    assert!(matches!(call.receive().await, Err(ClientError::AlreadyReceived)));
    client.close().await;
}

#[tokio::test]
async fn test_call_uses_client_receive_timeout() {
    let (client, _server) =
        start_with(Client::builder().receive_timeout(Duration::from_millis(20))).await;

    let mut call = Call::new(GetVersion);
    call.send(&client).await.expect("send should succeed");
    assert!(matches!(
        call.receive().await,
        Err(ClientError::Timeout(d)) if d == Duration::from_millis(20)
    ));
    client.close().await;
}

// =========================================================================
// Events
// =========================================================================

#[tokio::test]
async fn test_events_delivered_in_wire_order_with_timecodes() {
    let (client, mut server) = start().await;
    let events = client.subscribe_events().await.expect("should subscribe");

    for scene in ["A", "B", "C"] {
        push(
            &mut server,
            json!({
                "update-type": "SwitchScenes",
                "scene-name": scene,
                "stream-timecode": "01:00:00.000",
            }),
        )
        .await;
    }

    for expected in ["A", "B", "C"] {
        let event = events.next().await.expect("event should arrive");
        let Event::SwitchScenes(switch) = &event else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(switch.scene_name, expected);
        assert_eq!(event.stream_timecode().elapsed(), Some(Duration::from_secs(3600)));
        assert!(event.rec_timecode().is_absent());
    }

    client.close().await;
}

#[tokio::test]
async fn test_subscribe_twice_shares_one_stream() {
    let (client, mut server) = start().await;
    let a = client.subscribe_events().await.expect("should subscribe");
    let b = client.subscribe_events().await.expect("should subscribe");
    assert!(a.same_stream(&b));

    push(&mut server, json!({"update-type": "ScenesChanged"})).await;
    push(&mut server, json!({"update-type": "SceneCollectionChanged"})).await;

    let first = a.next().await.expect("first event");
    let second = b.next().await.expect("second event");
    assert_eq!(first.update_type(), "ScenesChanged");
    assert_eq!(second.update_type(), "SceneCollectionChanged");

    // Each event was received once in total.
    let extra = tokio::time::timeout(Duration::from_millis(50), a.next()).await;
    assert!(extra.is_err(), "no third event expected");

    client.close().await;
}

#[tokio::test]
async fn test_event_without_subscriber_is_not_replayed() {
    let (client, mut server) = start().await;

    // The response doubles as a barrier: the loop handles frames in wire
    // order, so the event was processed before the response.
    let (result, ()) = tokio::join!(client.get_version(), async {
        push(&mut server, json!({"update-type": "SwitchScenes", "scene-name": "Dropped"})).await;
        let request = next_request(&mut server).await;
        reply_ok(&mut server, &request, json!({})).await;
    });
    result.expect("request should succeed");

    let events = client.subscribe_events().await.expect("should subscribe");
    push(&mut server, json!({"update-type": "SwitchScenes", "scene-name": "Kept"})).await;

    let event = events.next().await.expect("event should arrive");
    assert!(matches!(event, Event::SwitchScenes(s) if s.scene_name == "Kept"));
    client.close().await;
}

#[tokio::test]
async fn test_stalled_subscriber_does_not_block_requests() {
    let (client, mut server) = start_with(Client::builder().event_capacity(3)).await;
    let events = client.subscribe_events().await.expect("should subscribe");

    // Nobody reads `events` while the peer pushes far more than fit.
    let (result, ()) = tokio::join!(client.get_version(), async {
        for i in 0..50 {
            let frame = json!({"update-type": "SwitchScenes", "scene-name": format!("s{i}")});
            push(&mut server, frame).await;
        }
        let request = next_request(&mut server).await;
        reply_ok(&mut server, &request, json!({"obs-websocket-version": "4.3.0"})).await;
    });
    let version = result.expect("request should succeed while subscriber stalls");
    assert_eq!(version.websocket_version, "4.3.0");

    // Only the first `event_capacity` events were kept.
    client.close().await;
    let mut kept = Vec::new();
    while let Some(event) = events.next().await {
        let Event::SwitchScenes(switch) = &event else {
            panic!("unexpected event {event:?}");
        };
        kept.push(switch.scene_name.clone());
    }
    assert_eq!(kept, ["s0", "s1", "s2"]);
}

#[tokio::test]
async fn test_custom_event_decoder() {
    let (client, mut server) =
        start_with(Client::builder().event_decoder("Heartbeat", decode_custom)).await;
    let events = client.subscribe_events().await.expect("should subscribe");

    push(&mut server, json!({"update-type": "Heartbeat", "pulse": true})).await;

    let Some(Event::Custom(custom)) = events.next().await else {
        panic!("expected a custom event");
    };
    assert_eq!(custom.header.update_type, "Heartbeat");
    assert_eq!(custom.fields["pulse"], true);
    client.close().await;
}

#[tokio::test]
async fn test_unsubscribe_ends_stream() {
    let (client, _server) = start().await;
    let events = client.subscribe_events().await.expect("should subscribe");
    client.unsubscribe_events().await;
    assert!(events.next().await.is_none());
    client.close().await;
}

// =========================================================================
// Closing
// =========================================================================

#[tokio::test]
async fn test_close_resolves_outstanding_request_as_closed() {
    let (client, mut server) = start().await;
    let events = client.subscribe_events().await.expect("should subscribe");

    let outstanding = tokio::spawn({
        let client = client.clone();
        async move { client.get_scene_list().await }
    });
    // Once the peer sees the request, its entry is in the pending table.
    let request = next_request(&mut server).await;
    assert_eq!(request["request-type"], "GetSceneList");

    client.close().await;
    assert!(client.is_closing());
    assert!(matches!(outstanding.await.unwrap(), Err(ClientError::Closed)));
    assert!(events.next().await.is_none());

    assert!(matches!(client.get_version().await, Err(ClientError::Closed)));
    assert!(matches!(client.subscribe_events().await, Err(ClientError::Closed)));

    // Idempotent.
    client.close().await;
}

#[tokio::test]
async fn test_peer_disconnect_resolves_outstanding_request_as_closed() {
    let (client, mut server) = start().await;

    let outstanding = tokio::spawn({
        let client = client.clone();
        async move { client.get_streaming_status().await }
    });
    next_request(&mut server).await;
    drop(server);

    assert!(matches!(outstanding.await.unwrap(), Err(ClientError::Closed)));
    assert!(matches!(client.subscribe_events().await, Err(ClientError::Closed)));
    assert!(matches!(client.get_version().await, Err(ClientError::Closed)));
    client.close().await;
}

#[tokio::test]
async fn test_connect_refused_is_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let result = Client::builder().host("127.0.0.1").port(port).connect().await;
    assert!(matches!(result, Err(ClientError::Transport(_))));
}
