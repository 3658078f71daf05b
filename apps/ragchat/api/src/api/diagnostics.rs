use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SchemaDiagnosticsResponse {
    pub status: &'static str,
    pub dimensions: usize,
    pub collections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Re-check every managed collection without modifying the vector store.
pub async fn schema_diagnostics_handler(State(state): State<AppState>) -> Response {
    let collections = state.guardian.collections().to_vec();
    let dimensions = state.gateway.dimensions();

    match state.guardian.verify_collections_and_indexes().await {
        Ok(()) => (
            StatusCode::OK,
            Json(SchemaDiagnosticsResponse {
                status: "ok",
                dimensions,
                collections,
                classification: None,
                message: None,
            }),
        )
            .into_response(),
        Err(err) => {
            warn!(classification = %err.classification(), "Schema diagnostics failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(SchemaDiagnosticsResponse {
                    status: if err.is_fatal() { "mismatch" } else { "unavailable" },
                    dimensions,
                    collections,
                    classification: Some(err.classification().label()),
                    message: Some(err.to_string()),
                }),
            )
                .into_response()
        }
    }
}
