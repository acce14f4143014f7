mod common;

use std::time::Duration;

use futures_util::StreamExt;
use ligo_common::bus::publish_event;
use ligo_common::{topic, ChatEvent, EventKind, TopicBus};
use serde_json::json;
use tokio::time;
use tokio_tungstenite::tungstenite;

use common::{connect, next_json, send_json, send_verb, silent_for, start_ws_server};

/// Group the side-channel worker consumes in.
const WORKER_GROUP: &str = "chat-group";

// ---------------------------------------------------------------------------
// Handshake and heartbeat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connect_returns_ready_with_session_id() {
    let (addr, ctx) = start_ws_server().await;
    let (_ws, session_id) = connect(addr).await;

    assert!(session_id.starts_with("ws_"));
    assert!(ctx.state.registry.contains(&session_id));
}

#[tokio::test]
async fn heartbeat_is_acked() {
    let (addr, _ctx) = start_ws_server().await;
    let (mut ws, _) = connect(addr).await;

    send_json(&mut ws, json!({ "op": 1, "d": { "seq": 7 } })).await;

    let ack = next_json(&mut ws).await;
    assert_eq!(ack["op"], 6);
    assert_eq!(ack["d"]["ack"], 7);
}

#[tokio::test]
async fn unknown_verb_is_ignored() {
    let (addr, _ctx) = start_ws_server().await;
    let (mut ws, _) = connect(addr).await;

    send_verb(&mut ws, "delete-everything", json!({ "sender": "x" })).await;
    send_json(&mut ws, json!({ "op": 1, "d": { "seq": 1 } })).await;

    // The connection survives and the next frame is the ack.
    let ack = next_json(&mut ws).await;
    assert_eq!(ack["op"], 6);
}

#[tokio::test]
async fn invalid_json_closes_with_4000() {
    let (addr, _ctx) = start_ws_server().await;
    let (mut ws, _) = connect(addr).await;

    common::send_text(&mut ws, "{nope").await;
    assert_eq!(close_code(&mut ws).await, 4000);
}

#[tokio::test]
async fn unknown_opcode_closes_with_4001() {
    let (addr, _ctx) = start_ws_server().await;
    let (mut ws, _) = connect(addr).await;

    send_json(&mut ws, json!({ "op": 42, "d": {} })).await;
    assert_eq!(close_code(&mut ws).await, 4001);
}

// ---------------------------------------------------------------------------
// Broadcast
// ---------------------------------------------------------------------------

#[tokio::test]
async fn join_then_chat_reaches_everyone_under_the_joined_name() {
    let (addr, _ctx) = start_ws_server().await;
    let (mut alice, alice_id) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;

    send_verb(&mut alice, "add-user", json!({ "sender": "alice", "type": "JOIN" })).await;
    for ws in [&mut alice, &mut bob] {
        let join = next_json(ws).await;
        assert_eq!(join["t"], "/topic/public");
        assert_eq!(join["d"]["type"], "JOIN");
        assert_eq!(join["d"]["sender"], "alice");
    }

    send_verb(
        &mut alice,
        "send-message",
        json!({ "sender": "somebody-else", "content": "hello", "type": "CHAT" }),
    )
    .await;
    for ws in [&mut alice, &mut bob] {
        let chat = next_json(ws).await;
        assert_eq!(chat["t"], "/topic/public");
        assert_eq!(chat["d"]["type"], "CHAT");
        assert_eq!(chat["d"]["sender"], "alice");
        assert_eq!(chat["d"]["content"], "hello");
        assert_eq!(chat["d"]["sessionId"], alice_id.as_str());
    }
}

#[tokio::test]
async fn legacy_connect_type_is_accepted_as_join() {
    let (addr, _ctx) = start_ws_server().await;
    let (mut ws, _) = connect(addr).await;

    send_verb(&mut ws, "add-user", json!({ "sender": "carol", "type": "CONNECT" })).await;
    let join = next_json(&mut ws).await;
    assert_eq!(join["d"]["type"], "JOIN");
}

#[tokio::test]
async fn dispatch_sequence_numbers_increase_per_session() {
    let (addr, _ctx) = start_ws_server().await;
    let (mut ws, _) = connect(addr).await;

    send_verb(&mut ws, "add-user", json!({ "sender": "dave" })).await;
    send_verb(&mut ws, "send-message", json!({ "sender": "dave", "content": "1" })).await;

    let first = next_json(&mut ws).await["s"].as_u64().unwrap();
    let second = next_json(&mut ws).await["s"].as_u64().unwrap();
    assert!(second > first);
}

#[tokio::test]
async fn chat_is_recorded_in_history() {
    let (addr, ctx) = start_ws_server().await;
    let (mut ws, _) = connect(addr).await;

    send_verb(&mut ws, "send-message", json!({ "sender": "erin", "content": "keep me" })).await;
    next_json(&mut ws).await;

    let mut recent = Vec::new();
    for _ in 0..50 {
        recent = ctx.state.history.recent(10).await;
        if !recent.is_empty() {
            break;
        }
        time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].content, "keep me");
}

// ---------------------------------------------------------------------------
// Side channels
// ---------------------------------------------------------------------------

#[tokio::test]
async fn grammar_result_reaches_only_the_requester() {
    let (addr, ctx) = start_ws_server().await;
    let mut requests = ctx
        .bus
        .subscribe(topic::CHECK_GRAMMAR_REQUEST, WORKER_GROUP)
        .await
        .unwrap();
    let (mut alice, alice_id) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;

    send_verb(&mut alice, "check-grammar", json!({ "sender": "alice", "content": "i is fine" })).await;

    // Act as the worker.
    let raw = time::timeout(Duration::from_secs(5), requests.next())
        .await
        .expect("request published")
        .unwrap();
    let mut request: ChatEvent = serde_json::from_str(&raw).unwrap();
    assert_eq!(request.session_id.as_deref(), Some(alice_id.as_str()));
    request.content = "I am fine.".into();
    publish_event(ctx.bus.as_ref(), topic::CHECK_GRAMMAR_RESPONSE, &request)
        .await
        .unwrap();

    let result = next_json(&mut alice).await;
    assert_eq!(result["t"], "/queue/private/checkgrammar");
    assert_eq!(result["d"]["type"], "GRAMMAR_RESULT");
    assert_eq!(result["d"]["content"], "I am fine.");
    assert!(silent_for(&mut bob, 200).await);
}

#[tokio::test]
async fn bot_result_for_departed_session_is_dropped() {
    let (addr, ctx) = start_ws_server().await;
    let (alice, alice_id) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;

    drop(alice);
    common::wait_until_gone(&ctx.state, &alice_id).await;

    let mut late = ChatEvent::new(EventKind::Chat, "alice", "too late");
    late.session_id = Some(alice_id);
    publish_event(ctx.bus.as_ref(), topic::ASK_BOT_RESPONSE, &late)
        .await
        .unwrap();

    assert!(silent_for(&mut bob, 200).await);
}

#[tokio::test]
async fn translation_result_is_broadcast() {
    let (addr, ctx) = start_ws_server().await;
    let mut requests = ctx
        .bus
        .subscribe(topic::TRANSLATE_REQUEST, WORKER_GROUP)
        .await
        .unwrap();
    let (mut alice, _) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;

    send_verb(
        &mut alice,
        "send-message",
        json!({ "sender": "alice", "content": "hello", "translationMode": "ko" }),
    )
    .await;
    for ws in [&mut alice, &mut bob] {
        assert_eq!(next_json(ws).await["d"]["content"], "hello");
    }

    let raw = time::timeout(Duration::from_secs(5), requests.next())
        .await
        .expect("translation requested")
        .unwrap();
    let mut request: ChatEvent = serde_json::from_str(&raw).unwrap();
    request.content = "ko: 안녕하세요".into();
    publish_event(ctx.bus.as_ref(), topic::TRANSLATE_RESPONSE, &request)
        .await
        .unwrap();

    for ws in [&mut alice, &mut bob] {
        let result = next_json(ws).await;
        assert_eq!(result["t"], "/topic/public");
        assert_eq!(result["d"]["type"], "TRANSLATION_RESULT");
        assert!(result["d"]["content"].as_str().unwrap().starts_with("ko: "));
    }
}

// ---------------------------------------------------------------------------
// Disconnect
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disconnect_of_joined_user_broadcasts_leave() {
    let (addr, ctx) = start_ws_server().await;
    let (mut alice, alice_id) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;

    send_verb(&mut alice, "add-user", json!({ "sender": "alice" })).await;
    next_json(&mut alice).await;
    next_json(&mut bob).await;

    alice.close(None).await.unwrap();

    let leave = next_json(&mut bob).await;
    assert_eq!(leave["d"]["type"], "LEAVE");
    assert_eq!(leave["d"]["sender"], "alice");
    common::wait_until_gone(&ctx.state, &alice_id).await;
    assert_eq!(ctx.state.registry.len(), 1);
}

#[tokio::test]
async fn peers_see_chat_rename_and_leave_in_send_order() {
    let (addr, _ctx) = start_ws_server().await;
    let (mut alice, _) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;

    send_verb(&mut alice, "add-user", json!({ "sender": "alice", "type": "JOIN" })).await;
    send_verb(&mut alice, "send-message", json!({ "content": "one", "type": "CHAT" })).await;
    send_verb(&mut alice, "add-user", json!({ "sender": "alicia", "type": "JOIN" })).await;
    send_verb(&mut alice, "send-message", json!({ "content": "two", "type": "CHAT" })).await;
    // Let the relay read every frame before the socket goes away.
    for _ in 0..4 {
        next_json(&mut alice).await;
    }
    alice.close(None).await.unwrap();

    let mut seen = Vec::new();
    for _ in 0..5 {
        let frame = next_json(&mut bob).await;
        seen.push(format!(
            "{} {} {}",
            frame["d"]["type"].as_str().unwrap(),
            frame["d"]["sender"].as_str().unwrap(),
            frame["d"]["content"].as_str().unwrap_or_default(),
        ));
    }
    assert_eq!(
        seen,
        vec![
            "JOIN alice ",
            "CHAT alice one",
            "JOIN alicia ",
            "CHAT alicia two",
            "LEAVE alicia ",
        ]
    );
}

#[tokio::test]
async fn disconnect_without_join_is_silent() {
    let (addr, ctx) = start_ws_server().await;
    let (alice, alice_id) = connect(addr).await;
    let (mut bob, _) = connect(addr).await;

    drop(alice);
    common::wait_until_gone(&ctx.state, &alice_id).await;

    assert!(silent_for(&mut bob, 200).await);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read until the server's close frame and return its code.
async fn close_code(ws: &mut common::WsClient) -> u16 {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for close")
            .expect("stream ended before close frame")
            .expect("ws read error");
        if let tungstenite::Message::Close(Some(frame)) = msg {
            return frame.code.into();
        }
    }
}
