//! API route handlers for the gateway.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use regwatch_dispatch::Invocation;
use serde::Deserialize;
use std::sync::Arc;

use super::server::AppState;

const DEFAULT_DELIVERY_LIMIT: usize = 50;
const MAX_DELIVERY_LIMIT: usize = 500;

fn failure(status: StatusCode, error: &str, message: String) -> (StatusCode, Json<serde_json::Value>) {
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "error": error,
            "message": message,
        })),
    )
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = state.start_time.elapsed();
    Json(serde_json::json!({
        "status": "ok",
        "service": "regwatch-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime.as_secs(),
    }))
}

/// Run trigger. A run that completes, even degraded, answers 200 with its
/// summary; only a run that cannot start answers 500.
pub async fn trigger_run(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Invocation>, JsonRejection>,
) -> (StatusCode, Json<serde_json::Value>) {
    let Json(invocation) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            tracing::warn!("Rejected trigger payload: {rejection}");
            return failure(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text());
        }
    };

    match state.coordinator.run(&invocation).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "summary": summary,
            })),
        ),
        Err(e) => {
            tracing::error!("Run could not start: {e}");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.kind(), e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeliveriesQuery {
    pub limit: Option<usize>,
}

/// Recent delivery attempts, newest first.
pub async fn list_deliveries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeliveriesQuery>,
) -> (StatusCode, Json<serde_json::Value>) {
    let limit = query.limit.unwrap_or(DEFAULT_DELIVERY_LIMIT).clamp(1, MAX_DELIVERY_LIMIT);
    match state.store.recent_deliveries(limit).await {
        Ok(rows) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "count": rows.len(),
                "deliveries": rows,
            })),
        ),
        Err(e) => failure(StatusCode::INTERNAL_SERVER_ERROR, e.kind(), e.to_string()),
    }
}
