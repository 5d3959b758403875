pub mod debug;
pub mod health;
pub mod signal;
pub mod telegram;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use shared::{SignalStatus, TradeInstruction};
use uuid::Uuid;

/// Signal as handed to a terminal.
#[derive(Debug, Serialize)]
pub struct SignalPayload {
    pub id: Uuid,
    pub chat_id: String,
    pub symbol_tv: String,
    pub symbol_mt5: String,
    pub symbol: String,
    pub tf: String,
    pub side: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub entry: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub sl: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub tp: Decimal,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<&TradeInstruction> for SignalPayload {
    fn from(signal: &TradeInstruction) -> Self {
        Self {
            id: signal.id,
            chat_id: signal.channel_id.clone(),
            symbol_tv: signal.symbol.display.clone(),
            symbol_mt5: signal.symbol.execution.clone(),
            symbol: signal.symbol.canonical.clone(),
            tf: signal.timeframe.clone(),
            side: signal.direction.as_str().to_string(),
            entry: signal.entry,
            sl: signal.stop_loss,
            tp: signal.take_profit,
            raw_text: signal.raw_text.clone(),
            created_at: signal.created_at,
        }
    }
}

/// Full stored row for the read-only endpoints.
#[derive(Debug, Serialize)]
pub struct SignalRecord {
    #[serde(flatten)]
    pub signal: SignalPayload,
    pub source: String,
    pub message_id: Option<i64>,
    pub origin_at: DateTime<Utc>,
    pub status: SignalStatus,
    pub claimed_at: Option<DateTime<Utc>>,
    pub claimed_by: Option<String>,
    pub last_error: Option<String>,
}

impl From<&TradeInstruction> for SignalRecord {
    fn from(signal: &TradeInstruction) -> Self {
        Self {
            signal: SignalPayload::from(signal),
            source: signal.source.clone(),
            message_id: signal.message_id,
            origin_at: signal.origin_at,
            status: signal.status,
            claimed_at: signal.claimed_at,
            claimed_by: signal.claimed_by.clone(),
            last_error: signal.last_error.clone(),
        }
    }
}

pub(crate) fn error_response(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "ok": false, "error": error }))).into_response()
}

/// 503 telling the caller the same request may succeed later.
pub(crate) fn retryable_response(error: &str, detail: Option<String>) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "ok": false, "error": error, "detail": detail, "retryable": true })),
    )
        .into_response()
}

/// Shared-secret check. `Err` carries the response to return as is.
pub(crate) fn check_secret(
    expected: Option<&str>,
    provided: Option<&str>,
    setting: &str,
) -> Result<(), Response> {
    let Some(expected) = expected else {
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("{setting} not configured"),
        ));
    };
    if !provided.is_some_and(|provided| secrets_match(expected, provided)) {
        return Err(error_response(StatusCode::UNAUTHORIZED, "unauthorized"));
    }
    Ok(())
}

/// Compares fixed-length digests without short-circuiting, so the time
/// taken does not depend on how much of the secret was guessed.
fn secrets_match(expected: &str, provided: &str) -> bool {
    let expected = Sha256::digest(expected.as_bytes());
    let provided = Sha256::digest(provided.as_bytes());
    expected
        .iter()
        .zip(provided.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
