//! Telegram webhook endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};
use chrono::DateTime;
use serde::Deserialize;
use serde_json::json;
use shared::parser::Rejection;
use shared::{IncomingAlert, IngestError, IngestOutcome, SkipReason};
use std::time::Instant;
use tracing::{debug, error, warn};

use super::{check_secret, retryable_response};
use crate::state::AppState;

pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// The subset of a Telegram `Update` this service reads.
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub message: Option<TelegramMessage>,
    pub channel_post: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub message_id: Option<i64>,
    /// Unix seconds.
    pub date: Option<i64>,
    pub chat: Option<TelegramChat>,
    pub text: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: Option<i64>,
}

fn skipped(reason: &str) -> Response {
    Json(json!({ "ok": true, "skipped": true, "reason": reason })).into_response()
}

/// Not-a-trade acknowledgement. Names the price field when one was bad.
fn rejected(rejection: &Rejection) -> Response {
    let mut body = json!({
        "ok": true,
        "skipped": true,
        "reason": rejection.code(),
        "detail": rejection.to_string(),
    });
    if let Rejection::MissingOrInvalidPrice { field } = rejection {
        body["field"] = json!(field.as_str());
    }
    Json(body).into_response()
}

/// Always acknowledges with 200 unless the store is down, in which case
/// a 503 makes Telegram redeliver. Redelivery is safe because of dedup.
pub async fn telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let started = Instant::now();

    let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if let Err(response) = check_secret(state.webhook_secret.as_deref(), provided, "WEBHOOK_SECRET") {
        warn!("Rejected Telegram update with bad secret token");
        return response;
    }

    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            debug!("Unparseable Telegram update: {}", e);
            return skipped("invalid_update");
        }
    };

    let Some(message) = update.message.or(update.channel_post) else {
        return skipped("no_update_object");
    };

    let chat_id = message.chat.as_ref().and_then(|chat| chat.id);
    let text = message
        .text
        .or(message.caption)
        .filter(|text| !text.trim().is_empty());
    let (Some(chat_id), Some(message_id), Some(text)) = (chat_id, message.message_id, text) else {
        return skipped("missing_chat_id_or_message_id_or_text");
    };

    debug!(chat_id, message_id, text_len = text.len(), "Telegram update received");

    let alert = IncomingAlert {
        raw_text: text,
        channel_id: chat_id.to_string(),
        message_id: Some(message_id),
        origin_at: message
            .date
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
    };

    match state.ingestion.ingest(alert).await {
        Ok(IngestOutcome::Created { id, symbol, direction }) => Json(json!({
            "ok": true,
            "saved": true,
            "id": id,
            "ms": started.elapsed().as_millis() as u64,
            "chat_id": chat_id.to_string(),
            "message_id": message_id,
            "symbol": symbol,
            "side": direction.as_str(),
        }))
        .into_response(),
        Ok(IngestOutcome::Skipped(SkipReason::Duplicate { id })) => Json(json!({
            "ok": true,
            "skipped": true,
            "reason": "duplicate",
            "id": id,
        }))
        .into_response(),
        Ok(IngestOutcome::Skipped(SkipReason::Rejected(rejection))) => rejected(&rejection),
        Err(IngestError::Caller(field)) => skipped(&format!("missing_{field}")),
        Err(IngestError::Store(e)) => {
            error!(chat_id, message_id, "Failed to ingest Telegram alert: {}", e);
            retryable_response("store_unavailable", Some(e.to_string()))
        }
    }
}
