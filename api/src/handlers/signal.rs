//! Terminal poll and latest-signal endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use shared::{DispatchError, DispatchOutcome, DispatchRequest};
use tracing::{error, warn};

use super::{check_secret, error_response, retryable_response, SignalPayload, SignalRecord};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PollQuery {
    pub key: Option<String>,
    pub chat_id: Option<String>,
    pub symbol: Option<String>,
    /// Terminal name recorded as claimant.
    pub by: Option<String>,
}

/// `GET /api/signal`: claims the most relevant pending signal.
pub async fn poll_signal(State(state): State<AppState>, Query(query): Query<PollQuery>) -> Response {
    if let Err(response) =
        check_secret(state.signal_secret.as_deref(), query.key.as_deref(), "SIGNAL_SECRET")
    {
        return response;
    }

    let request = DispatchRequest {
        channel_id: query.chat_id,
        symbol: query.symbol,
        claimant: query.by,
    };

    match state.dispatch.dispatch(request).await {
        Ok(DispatchOutcome::Claimed(claimed)) => {
            if let Some(e) = &claimed.bookkeeping_error {
                warn!(signal_id = %claimed.instruction.id, "Signal returned without claim audit: {}", e);
            }
            Json(json!({
                "ok": true,
                "signal": SignalPayload::from(&claimed.instruction),
            }))
            .into_response()
        }
        Ok(DispatchOutcome::Empty) => Json(json!({ "ok": true, "empty": true })).into_response(),
        Err(DispatchError::Caller(field)) => {
            error_response(StatusCode::BAD_REQUEST, &format!("missing {field}"))
        }
        Err(DispatchError::Busy { .. }) => retryable_response("busy", None),
        Err(DispatchError::Store(e)) => {
            error!("Signal poll failed: {}", e);
            retryable_response("store_unavailable", Some(e.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub key: Option<String>,
    pub chat_id: Option<String>,
}

/// `GET /api/signal/latest`: read-only, any status.
pub async fn latest_signal(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> Response {
    if let Err(response) =
        check_secret(state.signal_secret.as_deref(), query.key.as_deref(), "SIGNAL_SECRET")
    {
        return response;
    }

    let Some(chat_id) = query.chat_id.as_deref().map(str::trim).filter(|c| !c.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "missing chat_id");
    };

    match state.store.get_latest_by_channel(chat_id).await {
        Ok(signal) => Json(json!({
            "ok": true,
            "signal": signal.as_ref().map(SignalRecord::from),
        }))
        .into_response(),
        Err(e) => {
            error!(chat_id, "Latest signal lookup failed: {}", e);
            retryable_response("store_unavailable", Some(e.to_string()))
        }
    }
}
