use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::warn;

use super::SignalRecord;
use crate::state::AppState;

/// `GET /health`: store reachability plus the newest stored signal.
pub async fn health_check(State(state): State<AppState>) -> Response {
    if let Err(e) = state.store.ping().await {
        warn!("Health check failed: {}", e);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response();
    }

    let latest = state.store.list_recent(None, 1).await;
    match latest {
        Ok(rows) => Json(json!({
            "ok": true,
            "latest": rows.first().map(SignalRecord::from),
        }))
        .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}
