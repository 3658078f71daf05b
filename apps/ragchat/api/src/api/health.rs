//! Liveness and readiness handlers.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::future::join_all;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

/// A boxed readiness probe with a string error
pub type ReadinessCheck<'a> = Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'a>>;

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub checks: BTreeMap<&'static str, &'static str>,
}

/// Run probes concurrently; 503 when any of them fails.
pub async fn run_readiness_checks(
    checks: Vec<(&'static str, ReadinessCheck<'_>)>,
) -> (StatusCode, Json<ReadyResponse>) {
    let (names, probes): (Vec<_>, Vec<_>) = checks.into_iter().unzip();
    let results = join_all(probes).await;

    let mut statuses = BTreeMap::new();
    let mut all_ready = true;

    for (name, result) in names.into_iter().zip(results) {
        match result {
            Ok(()) => {
                statuses.insert(name, "connected");
            }
            Err(reason) => {
                tracing::error!(check = name, %reason, "Readiness check failed");
                statuses.insert(name, "disconnected");
                all_ready = false;
            }
        }
    }

    let status = if all_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadyResponse {
            status: if all_ready { "ready" } else { "not ready" },
            checks: statuses,
        }),
    )
}

/// Always 200 while the process is serving.
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let response = HealthResponse {
        status: "healthy",
        name: state.config.app.name,
        version: state.config.app.version,
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Qdrant answers `/readyz` on some candidate and the primary embedding tier
/// is reachable.
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let checks: Vec<(&'static str, ReadinessCheck<'_>)> = vec![
        (
            "qdrant",
            Box::pin(async {
                state
                    .guardian
                    .check_ready()
                    .await
                    .map(|_| ())
                    .map_err(|e| e.classification().label().to_string())
            }),
        ),
        (
            "embeddings",
            Box::pin(async {
                let primary = state.gateway.primary_tier();
                let health = state.gateway.health().await;
                match health.into_iter().find(|h| h.tier == primary) {
                    Some(tier) if tier.healthy => Ok(()),
                    Some(tier) => Err(tier.detail.unwrap_or_else(|| "unhealthy".to_string())),
                    None => Err(format!("primary tier {} not wired", primary)),
                }
            }),
        ),
    ];

    run_readiness_checks(checks).await.into_response()
}
