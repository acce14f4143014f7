#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::{tungstenite, MaybeTlsStream, WebSocketStream};

use chat_api::config::Config;
use chat_api::db::history::MemoryHistoryStore;
use chat_api::AppState;
use ligo_common::MemoryBus;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Relay state over an in-process bus and history store, consumers running.
pub struct TestContext {
    pub state: AppState,
    pub bus: Arc<MemoryBus>,
    pub store: Arc<MemoryHistoryStore>,
}

pub async fn test_state() -> TestContext {
    let bus = Arc::new(MemoryBus::new());
    let store = Arc::new(MemoryHistoryStore::new());
    let state = AppState::new(Config::default(), bus.clone(), store.clone());
    state
        .start_consumers()
        .await
        .expect("subscribe relay topics");
    TestContext { state, bus, store }
}

pub fn test_app(state: AppState) -> Router {
    chat_api::routes::router().with_state(state)
}

/// Start an actual TCP server for WebSocket testing. The server runs in the background.
pub async fn start_ws_server() -> (SocketAddr, TestContext) {
    let ctx = test_state().await;
    let app = test_app(ctx.state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, ctx)
}

/// Connect to the gateway and wait for READY. Returns the socket and its session id.
pub async fn connect(addr: SocketAddr) -> (WsClient, String) {
    let url = format!("ws://{addr}/ws");
    let (mut ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");

    let ready = next_json(&mut ws).await;
    assert_eq!(ready["op"], 0, "READY should be op=0 (DISPATCH)");
    assert_eq!(ready["t"], "READY");
    let session_id = ready["d"]["session_id"]
        .as_str()
        .expect("session_id present")
        .to_string();
    (ws, session_id)
}

pub async fn send_text(ws: &mut WsClient, text: &str) {
    ws.send(tungstenite::Message::Text(text.to_string().into()))
        .await
        .expect("ws send");
}

pub async fn send_json(ws: &mut WsClient, value: serde_json::Value) {
    send_text(ws, &value.to_string()).await;
}

/// Send an op=0 frame for `verb` carrying `event`.
pub async fn send_verb(ws: &mut WsClient, verb: &str, event: serde_json::Value) {
    send_json(ws, serde_json::json!({ "op": 0, "t": verb, "d": event })).await;
}

/// Next text frame, parsed.
pub async fn next_json(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for frame")
            .expect("stream ended")
            .expect("ws read error");
        if let tungstenite::Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("parse frame");
        }
    }
}

/// True if no frame arrives within `ms`.
pub async fn silent_for(ws: &mut WsClient, ms: u64) -> bool {
    time::timeout(Duration::from_millis(ms), ws.next())
        .await
        .is_err()
}

/// Wait until the relay has forgotten `session_id`.
pub async fn wait_until_gone(state: &AppState, session_id: &str) {
    for _ in 0..100 {
        if !state.registry.contains(session_id) {
            return;
        }
        time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session {session_id} never unregistered");
}
