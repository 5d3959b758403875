//! Recent signals and audit events, for operators.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;

use super::{check_secret, SignalRecord};
use crate::state::AppState;

const DEFAULT_LIMIT: u64 = 10;
const MAX_SIGNALS: u64 = 50;
const MAX_EVENTS: u64 = 30;

#[derive(Debug, Deserialize)]
pub struct DebugQuery {
    pub key: Option<String>,
    pub chat_id: Option<String>,
    pub limit: Option<String>,
}

fn clamp_limit(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|v| v.clamp(1, MAX_SIGNALS as i64) as u64)
        .unwrap_or(DEFAULT_LIMIT)
}

/// `GET /api/debug/last`. Partial failures are reported per section.
pub async fn debug_last(State(state): State<AppState>, Query(query): Query<DebugQuery>) -> Response {
    let started = Instant::now();
    if let Err(response) =
        check_secret(state.signal_secret.as_deref(), query.key.as_deref(), "SIGNAL_SECRET")
    {
        return response;
    }

    let chat_id = query.chat_id.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let limit = clamp_limit(query.limit.as_deref());

    let signals = state.store.list_recent(chat_id, limit).await;
    let events = state
        .store
        .recent_events(chat_id, limit.min(MAX_EVENTS))
        .await;

    let (signals, signals_error) = match signals {
        Ok(rows) => (rows.iter().map(SignalRecord::from).collect::<Vec<_>>(), None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };
    let (events, events_error) = match events {
        Ok(events) => (events, None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };

    Json(json!({
        "ok": true,
        "ms": started.elapsed().as_millis() as u64,
        "filters": { "chat_id": chat_id, "limit": limit },
        "signals_ok": signals_error.is_none(),
        "signals_error": signals_error,
        "latest_signal": signals.first(),
        "signals": signals,
        "events_ok": events_error.is_none(),
        "events_error": events_error,
        "latest_event": events.first(),
        "events": events,
    }))
    .into_response()
}
