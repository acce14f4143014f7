use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use trans_worker::backend::{BackendConfig, GroqBackend, LanguageBackend, TlsConfig};
use trans_worker::error::BackendError;

/// What the stub saw on its last request.
#[derive(Default)]
struct Seen {
    authorization: Option<String>,
    body: Option<Value>,
}

/// Start a stub chat-completions server that replies with `status` and `reply`.
async fn start_stub(status: StatusCode, reply: Value) -> (SocketAddr, Arc<Mutex<Seen>>) {
    let seen = Arc::new(Mutex::new(Seen::default()));
    let recorder = seen.clone();

    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let recorder = recorder.clone();
            let reply = reply.clone();
            async move {
                {
                    let mut seen = recorder.lock().unwrap();
                    seen.authorization = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    seen.body = Some(body);
                }
                (status, Json(reply))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, seen)
}

fn backend_for(addr: SocketAddr) -> GroqBackend {
    GroqBackend::new(&BackendConfig {
        api_url: format!("http://{addr}/v1/chat/completions"),
        api_key: "test-key".into(),
        model: "llama-3.3-70b-versatile".into(),
        timeout: Duration::from_secs(5),
        tls: TlsConfig::default(),
    })
    .expect("build backend")
}

#[tokio::test]
async fn completion_content_is_extracted() {
    let (addr, seen) = start_stub(
        StatusCode::OK,
        json!({ "choices": [{ "message": { "role": "assistant", "content": "안녕하세요" } }] }),
    )
    .await;

    let text = backend_for(addr).complete("translate hello").await.unwrap();
    assert_eq!(text, "안녕하세요");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.authorization.as_deref(), Some("Bearer test-key"));
    let body = seen.body.as_ref().unwrap();
    assert_eq!(body["model"], "llama-3.3-70b-versatile");
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "translate hello");
}

#[tokio::test]
async fn error_status_is_reported() {
    let (addr, _) = start_stub(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "rate limited" } }),
    )
    .await;

    let err = backend_for(addr).complete("hi").await.unwrap_err();
    match err {
        BackendError::Status { status, body } => {
            assert_eq!(status.as_u16(), 429);
            assert!(body.contains("rate limited"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_choices_is_an_error() {
    let (addr, _) = start_stub(StatusCode::OK, json!({ "choices": [] })).await;

    let err = backend_for(addr).complete("hi").await.unwrap_err();
    assert!(matches!(err, BackendError::EmptyCompletion));
}

#[tokio::test]
async fn unreachable_backend_is_an_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = backend_for(addr).complete("hi").await.unwrap_err();
    assert!(matches!(err, BackendError::Http(_)));
}
