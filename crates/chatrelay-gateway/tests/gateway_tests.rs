// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router and WebSocket tests against a relay harness.

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use chatrelay_core::types::Message;
use chatrelay_gateway::{GatewayState, ServerFrame, router, serve};
use chatrelay_test_utils::{MemoryLog, RelayHarness, ScriptedEndpoint};

const ORIGIN: &str = "http://localhost:3000";

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn state_for(harness: &RelayHarness) -> GatewayState {
    GatewayState::new(harness.relay.clone(), 500, CancellationToken::new())
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

struct RunningServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

async fn spawn_server(state: GatewayState) -> RunningServer {
    let shutdown = state.shutdown.clone();
    let app = router(state, ORIGIN).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let token = shutdown.clone();
    let task = tokio::spawn(async move {
        serve(listener, app, token).await.unwrap();
    });
    RunningServer {
        addr,
        shutdown,
        task,
    }
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();
    ws
}

async fn next_frame(ws: &mut Client) -> ServerFrame {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("socket error");
        if let WsMessage::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn next_message(ws: &mut Client) -> Message {
    match next_frame(ws).await {
        ServerFrame::Message { message } => message,
        other => panic!("expected a live message, got {other:?}"),
    }
}

async fn send_json(ws: &mut Client, json: &str) {
    ws.send(WsMessage::text(json)).await.unwrap();
}

#[tokio::test]
async fn health_reports_idle_dispatcher() {
    let harness = RelayHarness::with_replies(["Hi!"]);
    let app = router(state_for(&harness), ORIGIN).unwrap();

    let (status, json) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["dispatcher"]["state"], "idle");
    assert_eq!(json["dispatcher"]["queued"], 0);
    assert_eq!(json["dispatcher"]["jobs_completed"], 0);
    assert_eq!(json["subscribers"], 0);
}

#[tokio::test]
async fn health_counts_completed_jobs() {
    let harness = RelayHarness::with_replies(["Hi!"]);
    harness.send("hello", "u1").await.unwrap();
    harness.drained().await;

    let app = router(state_for(&harness), ORIGIN).unwrap();
    let (_, json) = get_json(app, "/health").await;
    assert_eq!(json["dispatcher"]["jobs_completed"], 1);
    assert_eq!(json["dispatcher"]["fallbacks_sent"], 0);
}

#[tokio::test]
async fn health_is_degraded_when_log_fails() {
    let harness = RelayHarness::builder().start();
    harness.log.set_failing(true);

    let app = router(state_for(&harness), ORIGIN).unwrap();
    let (status, json) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let harness = RelayHarness::builder().start();
    let app = router(state_for(&harness), ORIGIN).unwrap();

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, ORIGIN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        ORIGIN
    );
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let harness = RelayHarness::builder().start();
    let app = router(state_for(&harness), ORIGIN).unwrap();
    let resp = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_cors_origin_is_a_config_error() {
    let harness = RelayHarness::builder().start();
    let err = router(state_for(&harness), "http://bad\norigin").unwrap_err();
    assert!(err.to_string().contains("cors_origin"), "got: {err}");
}

#[tokio::test]
async fn socket_gets_history_then_echo_then_reply() {
    let history = vec![
        Message::new("earlier", "bob@example.com"),
        Message::system("welcome back"),
    ];
    let harness = RelayHarness::builder()
        .with_log(MemoryLog::with_messages(history.clone()))
        .with_endpoint(ScriptedEndpoint::with_replies(["Hi!"]))
        .start();
    let server = spawn_server(state_for(&harness)).await;
    let mut ws = connect(server.addr).await;

    assert_eq!(
        next_frame(&mut ws).await,
        ServerFrame::LoadMessages { messages: history }
    );

    send_json(
        &mut ws,
        r#"{"text": "hello", "sender": "ana@example.com", "timestamp": "2026-01-01T00:00:00.000Z"}"#,
    )
    .await;

    let echo = next_message(&mut ws).await;
    assert_eq!(echo.text, "hello");
    assert_eq!(echo.sender, "ana@example.com");
    assert_eq!(echo.timestamp, "2026-01-01T00:00:00.000Z");

    let reply = next_message(&mut ws).await;
    assert_eq!(reply.text, "Hi!");
    assert_eq!(reply.sender, "AI");

    server.shutdown.cancel();
    server.task.await.unwrap();
}

#[tokio::test]
async fn history_is_limited_to_newest_messages() {
    let history: Vec<Message> = (0..5)
        .map(|i| Message::new(format!("m{i}"), "u1"))
        .collect();
    let harness = RelayHarness::builder()
        .with_log(MemoryLog::with_messages(history))
        .start();
    let state = GatewayState::new(harness.relay.clone(), 2, CancellationToken::new());
    let server = spawn_server(state).await;
    let mut ws = connect(server.addr).await;

    let ServerFrame::LoadMessages { messages } = next_frame(&mut ws).await else {
        panic!("first frame must be the history snapshot");
    };
    let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["m3", "m4"]);

    server.shutdown.cancel();
}

#[tokio::test]
async fn every_client_sees_every_message() {
    let harness = RelayHarness::with_replies(["Hi!"]);
    let server = spawn_server(state_for(&harness)).await;
    let mut ana = connect(server.addr).await;
    let mut bob = connect(server.addr).await;
    next_frame(&mut ana).await;
    next_frame(&mut bob).await;

    send_json(&mut ana, r#"{"text": "hello", "sender": "ana"}"#).await;

    for ws in [&mut ana, &mut bob] {
        let echo = next_message(ws).await;
        assert_eq!((echo.sender.as_str(), echo.text.as_str()), ("ana", "hello"));
        let reply = next_message(ws).await;
        assert_eq!((reply.sender.as_str(), reply.text.as_str()), ("AI", "Hi!"));
    }

    server.shutdown.cancel();
}

#[tokio::test]
async fn invalid_frames_are_skipped() {
    let harness = RelayHarness::with_replies(["Hi!"]);
    let server = spawn_server(state_for(&harness)).await;
    let mut ws = connect(server.addr).await;
    next_frame(&mut ws).await;

    send_json(&mut ws, "not json").await;
    send_json(&mut ws, r#"{"text": "no sender"}"#).await;
    send_json(&mut ws, r#"{"text": "   ", "sender": "ana"}"#).await;
    send_json(&mut ws, r#"{"text": "hello", "sender": "ana"}"#).await;

    let echo = next_message(&mut ws).await;
    assert_eq!(echo.text, "hello");
    assert_eq!(next_message(&mut ws).await.text, "Hi!");
    assert_eq!(harness.endpoint.call_count(), 1);

    server.shutdown.cancel();
}

#[tokio::test]
async fn shutdown_closes_open_sockets() {
    let harness = RelayHarness::builder().start();
    let server = spawn_server(state_for(&harness)).await;
    let mut ws = connect(server.addr).await;
    next_frame(&mut ws).await;

    server.shutdown.cancel();

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(WsMessage::Close(_))) => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "socket stayed open after shutdown");
    tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .expect("server did not stop")
        .unwrap();
}
