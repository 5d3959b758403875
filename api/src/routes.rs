use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{debug, health, signal, telegram};
use crate::state::AppState;

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/telegram", post(telegram::telegram_webhook))
        .route("/api/signal", get(signal::poll_signal))
        .route("/api/signal/latest", get(signal::latest_signal))
        .route("/api/debug/last", get(debug::debug_last))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use shared::{Config, MemorySignalStore, SignalStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    const WEBHOOK_SECRET: &str = "hook-secret";
    const SIGNAL_SECRET: &str = "poll-secret";
    const XAU_LONG: &str = "XAUUSD | TF : M5\nENTRY LONG\nEntry: 2350.5\nSL: 2340\nTP: 2365";

    fn test_config() -> Config {
        Config {
            database_url: "memory".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            webhook_secret: Some(WEBHOOK_SECRET.to_string()),
            signal_secret: Some(SIGNAL_SECRET.to_string()),
            bot_token: None,
            public_base_url: None,
            claim_retry_budget: 3,
            store_timeout_ms: 1000,
            default_claimant: "mt5".to_string(),
            execution_symbol_map: Some("XAUUSD=XAUUSD.cm".to_string()),
            execution_symbol_suffix: None,
            run_migrations: false,
        }
    }

    fn app_with(config: Config) -> (Router, Arc<MemorySignalStore>) {
        let store = Arc::new(MemorySignalStore::new());
        let state = AppState::from_config(store.clone(), &config).unwrap();
        (create_router(state), store)
    }

    fn update(chat_id: i64, message_id: i64, text: &str) -> Value {
        json!({
            "update_id": 1,
            "channel_post": {
                "message_id": message_id,
                "date": 1_767_225_600,
                "chat": { "id": chat_id, "type": "channel" },
                "text": text,
            }
        })
    }

    fn webhook(secret: Option<&str>, body: String) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/telegram")
            .header("content-type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header(telegram::SECRET_HEADER, secret);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_webhook_requires_secret() {
        let (app, _) = app_with(test_config());

        let (status, _) = send(&app, webhook(None, update(-1001, 1, XAU_LONG).to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) =
            send(&app, webhook(Some("wrong"), update(-1001, 1, XAU_LONG).to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut config = test_config();
        config.webhook_secret = None;
        let (app, _) = app_with(config);
        let (status, body) =
            send(&app, webhook(Some(WEBHOOK_SECRET), update(-1001, 1, XAU_LONG).to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn test_webhook_saves_then_skips_duplicate() {
        let (app, store) = app_with(test_config());
        let body = update(-1001, 7, XAU_LONG).to_string();

        let (status, first) = send(&app, webhook(Some(WEBHOOK_SECRET), body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["saved"], true);
        assert_eq!(first["chat_id"], "-1001");
        assert_eq!(first["message_id"], 7);
        assert_eq!(first["symbol"], "XAUUSD");
        assert_eq!(first["side"], "BUY");

        let (status, second) = send(&app, webhook(Some(WEBHOOK_SECRET), body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["skipped"], true);
        assert_eq!(second["reason"], "duplicate");
        assert_eq!(second["id"], first["id"]);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_webhook_acknowledges_non_signals() {
        let (app, store) = app_with(test_config());

        let (status, body) = send(
            &app,
            webhook(Some(WEBHOOK_SECRET), update(-1001, 2, "Daily recap: no trades today").to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reason"], "no_entry_marker");
        assert!(body.get("field").is_none());

        let (status, body) = send(
            &app,
            webhook(
                Some(WEBHOOK_SECRET),
                update(-1001, 3, "XAUUSD | TF : M5\nENTRY LONG\nEntry: 2350.5\nSL: 2340").to_string(),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reason"], "missing_or_invalid_price_field");
        assert_eq!(body["field"], "tp");
        assert_eq!(body["detail"], "missing_or_invalid_price_field: tp");

        let (status, body) = send(&app, webhook(Some(WEBHOOK_SECRET), "not json".to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skipped"], true);

        let (_, body) = send(
            &app,
            webhook(Some(WEBHOOK_SECRET), json!({ "update_id": 3 }).to_string()),
        )
        .await;
        assert_eq!(body["reason"], "no_update_object");

        let no_text = json!({
            "update_id": 4,
            "message": { "message_id": 9, "chat": { "id": -1001 } }
        });
        let (_, body) = send(&app, webhook(Some(WEBHOOK_SECRET), no_text.to_string())).await;
        assert_eq!(body["reason"], "missing_chat_id_or_message_id_or_text");

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_webhook_reads_caption() {
        let (app, store) = app_with(test_config());
        let update = json!({
            "update_id": 5,
            "message": {
                "message_id": 11,
                "chat": { "id": -1001 },
                "caption": XAU_LONG,
            }
        });

        let (_, body) = send(&app, webhook(Some(WEBHOOK_SECRET), update.to_string())).await;
        assert_eq!(body["saved"], true);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_poll_claims_once() {
        let (app, _) = app_with(test_config());
        send(&app, webhook(Some(WEBHOOK_SECRET), update(-1001, 7, XAU_LONG).to_string())).await;

        let uri = format!("/api/signal?key={SIGNAL_SECRET}&chat_id=-1001&symbol=xauusd&by=ea-1");
        let (status, body) = send(&app, get_request(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        let signal = &body["signal"];
        assert_eq!(signal["symbol"], "XAUUSD");
        assert_eq!(signal["symbol_tv"], "XAUUSD");
        assert_eq!(signal["symbol_mt5"], "XAUUSD.cm");
        assert_eq!(signal["tf"], "M5");
        assert_eq!(signal["side"], "BUY");
        assert_eq!(signal["chat_id"], "-1001");
        assert_eq!(signal["entry"].as_f64(), Some(2350.5));
        assert_eq!(signal["tp"].as_f64(), Some(2365.0));

        let (status, body) = send(&app, get_request(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["empty"], true);

        let latest = format!("/api/signal/latest?key={SIGNAL_SECRET}&chat_id=-1001");
        let (status, body) = send(&app, get_request(&latest)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["signal"]["status"], "CLAIMED");
        assert_eq!(body["signal"]["claimed_by"], "ea-1");
    }

    #[tokio::test]
    async fn test_poll_status_codes() {
        let (app, _) = app_with(test_config());

        let (status, _) = send(&app, get_request("/api/signal?key=wrong&chat_id=-1001")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(&app, get_request(&format!("/api/signal?key={SIGNAL_SECRET}"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing chat_id");

        let (status, body) =
            send(&app, get_request(&format!("/api/signal?key={SIGNAL_SECRET}&chat_id=-1001"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["empty"], true);

        let mut config = test_config();
        config.signal_secret = None;
        let (app, _) = app_with(config);
        let (status, _) = send(&app, get_request("/api/signal?key=&chat_id=-1001")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_debug_and_health() {
        let (app, store) = app_with(test_config());
        send(&app, webhook(Some(WEBHOOK_SECRET), update(-1001, 7, XAU_LONG).to_string())).await;
        send(
            &app,
            webhook(Some(WEBHOOK_SECRET), update(-1001, 8, "gm everyone").to_string()),
        )
        .await;

        let uri = format!("/api/debug/last?key={SIGNAL_SECRET}&chat_id=-1001&limit=500");
        let (status, body) = send(&app, get_request(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filters"]["limit"], 50);
        assert_eq!(body["signals"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["events"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["latest_signal"]["status"], "PENDING");

        let (status, body) = send(&app, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        let latest = store.list_recent(None, 1).await.unwrap();
        assert_eq!(body["latest"]["id"], latest[0].id.to_string());
    }
}
