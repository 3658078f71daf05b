mod diagnostics;
mod embeddings;
mod health;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::state::AppState;

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: &'static str,
}

async fn not_found() -> Response {
    let body = Json(ErrorResponse {
        error: "NotFound",
        message: "The requested resource was not found",
    });

    (StatusCode::NOT_FOUND, body).into_response()
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/chat/health/embeddings",
            get(embeddings::embeddings_health_handler),
        )
        .route("/diagnostics/schema", get(diagnostics::schema_diagnostics_handler))
}

/// Full application router: probes at the root, everything else under `/api`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/ready", get(health::ready_handler))
        .nest("/api", api_routes())
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
