//! WebSocket upgrade handler and per-connection event loop.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use ligo_common::ChatEvent;
use tokio::time;

use crate::AppState;

use super::events::{
    ClientMessage, GatewayMessage, HeartbeatPayload, Verb, OP_DISPATCH, OP_HEARTBEAT,
};
use super::fanout::Mailbox;
use super::handler::HEARTBEAT_INTERVAL_MS;
use super::registry::USERNAME;

type WsSink = SplitSink<WebSocket, Message>;
type WsStream = SplitStream<WebSocket>;

/// Close codes (4000-range for application-level).
const CLOSE_UNKNOWN_ERROR: u16 = 4000;
const CLOSE_UNKNOWN_OPCODE: u16 = 4001;
const CLOSE_SESSION_TIMEOUT: u16 = 4009;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, ws_rx) = socket.split();

    let session_id = state.registry.register();
    let mailbox = state.fanout.attach(&session_id);
    tracing::info!(%session_id, live = state.registry.len(), "gateway session established");

    if send_message(&mut ws_tx, &GatewayMessage::ready(&session_id, HEARTBEAT_INTERVAL_MS)).await {
        run_session(&state, &session_id, ws_tx, ws_rx, mailbox).await;
    }

    disconnect(&state, &session_id).await;
}

/// Main session event loop: read client frames, drain the mailbox, enforce heartbeat.
async fn run_session(
    state: &AppState,
    session_id: &str,
    mut ws_tx: WsSink,
    mut ws_rx: WsStream,
    mut mailbox: Mailbox,
) {
    // Heartbeat deadline: client must heartbeat within 1.5× the interval.
    let heartbeat_deadline = Duration::from_millis(HEARTBEAT_INTERVAL_MS * 3 / 2);
    let mut heartbeat_timer = time::interval(heartbeat_deadline);
    heartbeat_timer.tick().await; // First tick fires immediately; skip it.
    let mut got_heartbeat = true;
    let mut seq: u64 = 0;

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let client_msg: ClientMessage = match serde_json::from_str(&text) {
                            Ok(m) => m,
                            Err(_) => {
                                let _ = send_close(&mut ws_tx, CLOSE_UNKNOWN_ERROR, "Invalid JSON").await;
                                break;
                            }
                        };

                        match client_msg.op {
                            OP_HEARTBEAT => {
                                got_heartbeat = true;
                                let payload: HeartbeatPayload =
                                    serde_json::from_value(client_msg.d).unwrap_or(HeartbeatPayload { seq: 0 });
                                if !send_message(&mut ws_tx, &GatewayMessage::heartbeat_ack(payload.seq)).await {
                                    break;
                                }
                            }
                            OP_DISPATCH => on_client_dispatch(state, session_id, client_msg).await,
                            _ => {
                                let _ = send_close(&mut ws_tx, CLOSE_UNKNOWN_OPCODE, "Unknown opcode").await;
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, %session_id, "ws read error");
                        break;
                    }
                    _ => continue,
                }
            }

            outbound = mailbox.recv() => {
                let Some(outbound) = outbound else {
                    // Mailbox detached elsewhere.
                    break;
                };
                let data = match serde_json::to_value(&outbound.event) {
                    Ok(data) => data,
                    Err(e) => {
                        tracing::error!(error = %e, %session_id, "failed to encode outbound event");
                        continue;
                    }
                };
                seq += 1;
                let msg = GatewayMessage::dispatch(outbound.channel, seq, data);
                if !send_message(&mut ws_tx, &msg).await {
                    break;
                }
            }

            _ = heartbeat_timer.tick() => {
                if !got_heartbeat {
                    tracing::debug!(%session_id, "heartbeat timeout, closing connection");
                    let _ = send_close(&mut ws_tx, CLOSE_SESSION_TIMEOUT, "Heartbeat timeout").await;
                    break;
                }
                got_heartbeat = false;
            }
        }
    }
}

/// Handle an op=0 frame. Bad verbs and payloads are logged and ignored.
async fn on_client_dispatch(state: &AppState, session_id: &str, msg: ClientMessage) {
    let Some(verb) = msg.t.as_deref().and_then(Verb::parse) else {
        tracing::warn!(%session_id, verb = ?msg.t, "ignoring unknown verb");
        return;
    };
    let event: ChatEvent = match serde_json::from_value(msg.d) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(%session_id, verb = verb.as_str(), error = %e, "ignoring unparsable event");
            return;
        }
    };
    state.dispatcher.dispatch(verb, event, session_id).await;
}

/// Tear down a session. Sessions that joined get a LEAVE broadcast.
async fn disconnect(state: &AppState, session_id: &str) {
    state.fanout.detach(session_id);
    let Some(entry) = state.registry.unregister(session_id) else {
        return;
    };

    tracing::info!(
        %session_id,
        connected_for = ?entry.connected_at.elapsed(),
        "gateway session ended"
    );

    if let Some(username) = entry.attributes.get(USERNAME) {
        state.dispatcher.on_leave(username, session_id).await;
    }
}

/// Serialize and send one gateway message. Returns false once the socket is unusable.
async fn send_message(ws_tx: &mut WsSink, msg: &GatewayMessage) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode gateway message");
            return false;
        }
    };
    ws_tx.send(Message::Text(json.into())).await.is_ok()
}

/// Send a WebSocket close frame with a code and reason.
async fn send_close(ws_tx: &mut WsSink, code: u16, reason: &str) -> Result<(), axum::Error> {
    let close_msg = Message::Close(Some(axum::extract::ws::CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    ws_tx.send(close_msg).await
}
