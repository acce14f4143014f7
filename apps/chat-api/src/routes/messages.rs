//! Chat history endpoint.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use ligo_common::ChatEvent;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::AppState;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/messages/recent", get(recent_messages))
}

/// `limit` is taken as text so a bad value falls back to the default
/// instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<String>,
}

impl RecentQuery {
    fn limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT)
    }
}

/// One history entry as clients see it.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatMessageResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub sender: String,
    pub content: String,
}

impl From<ChatEvent> for ChatMessageResponse {
    fn from(event: ChatEvent) -> Self {
        Self {
            kind: event.kind.to_string(),
            sender: event.sender,
            content: event.content,
        }
    }
}

// ---------------------------------------------------------------------------
// GET /api/messages/recent
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/messages/recent",
    tag = "Messages",
    params(
        ("limit" = Option<usize>, Query, description = "Number of messages to return (max 100, default 10)"),
    ),
    responses(
        (status = 200, description = "Most recent messages, oldest first", body = Vec<ChatMessageResponse>),
    ),
)]
pub async fn recent_messages(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Json<Vec<ChatMessageResponse>> {
    let events = state.history.recent(query.limit()).await;
    Json(events.into_iter().map(ChatMessageResponse::from).collect())
}
