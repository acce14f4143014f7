pub mod health;
pub mod messages;

use axum::Router;
use utoipa::OpenApi;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(messages::router())
        .merge(crate::gateway::server::router())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        messages::recent_messages,
    ),
    components(
        schemas(
            messages::ChatMessageResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Messages", description = "Chat history"),
    )
)]
pub struct ApiDoc;
