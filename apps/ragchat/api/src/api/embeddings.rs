use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain_vector::{ProviderTier, TierHealth};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EmbeddingsHealthResponse {
    /// `UP`, `DEGRADED` (primary up, a fallback down) or `DOWN` (primary down)
    pub status: &'static str,
    pub primary_tier: ProviderTier,
    pub dimensions: usize,
    pub tiers: Vec<TierHealth>,
}

/// Per-tier embedding reachability. 503 when the primary tier is down.
pub async fn embeddings_health_handler(State(state): State<AppState>) -> Response {
    let primary_tier = state.gateway.primary_tier();
    let tiers = state.gateway.health().await;

    let primary_healthy = tiers
        .iter()
        .any(|t| t.tier == primary_tier && t.healthy);
    let all_healthy = tiers.iter().all(|t| t.healthy);

    let (code, status) = match (primary_healthy, all_healthy) {
        (true, true) => (StatusCode::OK, "UP"),
        (true, false) => (StatusCode::OK, "DEGRADED"),
        (false, _) => (StatusCode::SERVICE_UNAVAILABLE, "DOWN"),
    };

    let response = EmbeddingsHealthResponse {
        status,
        primary_tier,
        dimensions: state.gateway.dimensions(),
        tiers,
    };

    (code, Json(response)).into_response()
}
