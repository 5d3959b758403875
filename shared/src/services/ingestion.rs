//! Alert ingestion: normalize, extract, persist as `PENDING`.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{bounded, DEFAULT_STORE_TIMEOUT};
use crate::aliases::SymbolMapper;
use crate::error::{IngestError, StoreError};
use crate::models::{Direction, EventStage, SignalEvent, SignalStatus, TradeInstruction};
use crate::parser::{self, ExitNotice, Rejection};
use crate::store::SignalStore;

pub const SOURCE_TELEGRAM: &str = "telegram";

/// One alert as delivered by the chat platform.
#[derive(Debug, Clone)]
pub struct IncomingAlert {
    pub raw_text: String,
    pub channel_id: String,
    pub message_id: Option<i64>,
    /// When the alert was posted. Defaults to ingestion time.
    pub origin_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Created {
        id: Uuid,
        symbol: String,
        direction: Direction,
    },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Rejected(Rejection),
    /// The same alert was stored before under `id`.
    Duplicate { id: Uuid },
}

impl SkipReason {
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::Rejected(rejection) => rejection.code(),
            SkipReason::Duplicate { .. } => "duplicate",
        }
    }
}

/// Receives exit notices. Nothing is persisted for them by default.
pub trait ExitObserver: Send + Sync {
    fn on_exit(&self, alert: &IncomingAlert, notice: &ExitNotice);
}

pub struct LogExitObserver;

impl ExitObserver for LogExitObserver {
    fn on_exit(&self, alert: &IncomingAlert, notice: &ExitNotice) {
        info!(
            chat_id = %alert.channel_id,
            message_id = ?alert.message_id,
            marker = %notice.marker,
            symbol = ?notice.symbol,
            timeframe = ?notice.timeframe,
            "Exit notice received, not persisted"
        );
    }
}

/// Fingerprint of an alert: channel, message id when known, normalized text.
pub fn dedup_key(channel_id: &str, message_id: Option<i64>, normalized_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(channel_id.as_bytes());
    hasher.update(b"\n");
    if let Some(message_id) = message_id {
        hasher.update(message_id.to_string().as_bytes());
    }
    hasher.update(b"\n");
    hasher.update(normalized_text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stable signal id, identical for every redelivery of the same alert.
pub fn signal_id(dedup_key: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, dedup_key.as_bytes())
}

pub struct IngestionCoordinator {
    store: Arc<dyn SignalStore>,
    mapper: Arc<dyn SymbolMapper>,
    exit_observer: Arc<dyn ExitObserver>,
    store_timeout: Duration,
}

impl IngestionCoordinator {
    pub fn new(store: Arc<dyn SignalStore>, mapper: Arc<dyn SymbolMapper>) -> Self {
        Self {
            store,
            mapper,
            exit_observer: Arc::new(LogExitObserver),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub fn with_exit_observer(mut self, observer: Arc<dyn ExitObserver>) -> Self {
        self.exit_observer = observer;
        self
    }

    pub async fn ingest(&self, alert: IncomingAlert) -> Result<IngestOutcome, IngestError> {
        if alert.channel_id.trim().is_empty() {
            return Err(IngestError::Caller("channel_id"));
        }

        let text = parser::normalize_text(&alert.raw_text);
        let parsed = match parser::extract(&text) {
            Ok(parsed) => parsed,
            Err(rejection) => {
                if rejection == Rejection::NoEntryMarker {
                    if let Some(notice) = parser::detect_exit(&text) {
                        self.exit_observer.on_exit(&alert, &notice);
                    }
                }
                debug!(
                    chat_id = %alert.channel_id,
                    message_id = ?alert.message_id,
                    reason = rejection.code(),
                    "Alert rejected"
                );
                self.record(
                    SignalEvent::new(EventStage::Ingest, false)
                        .channel(alert.channel_id.as_str(), alert.message_id)
                        .detail(rejection.to_string()),
                )
                .await;
                return Ok(IngestOutcome::Skipped(SkipReason::Rejected(rejection)));
            }
        };

        let dedup_key = dedup_key(&alert.channel_id, alert.message_id, &text);
        let id = signal_id(&dedup_key);
        let now = Utc::now();
        let instruction = TradeInstruction {
            id,
            dedup_key,
            source: SOURCE_TELEGRAM.to_string(),
            channel_id: alert.channel_id.clone(),
            message_id: alert.message_id,
            symbol: self.mapper.resolve(&parsed.symbol),
            timeframe: parsed.timeframe,
            direction: parsed.direction,
            entry: parsed.entry,
            stop_loss: parsed.stop_loss,
            take_profit: parsed.take_profit,
            raw_text: alert.raw_text.clone(),
            created_at: now,
            origin_at: alert.origin_at.unwrap_or(now),
            status: SignalStatus::Pending,
            claimed_at: None,
            claimed_by: None,
            last_error: None,
        };

        match bounded(self.store_timeout, self.store.insert_pending(&instruction)).await {
            Ok(id) => {
                info!(
                    signal_id = %id,
                    chat_id = %instruction.channel_id,
                    message_id = ?instruction.message_id,
                    symbol = %instruction.symbol.canonical,
                    execution_symbol = %instruction.symbol.execution,
                    side = %instruction.direction,
                    "Signal stored as PENDING"
                );
                self.record(
                    SignalEvent::new(EventStage::Ingest, true)
                        .channel(alert.channel_id.as_str(), alert.message_id)
                        .signal(id, instruction.symbol.canonical.as_str())
                        .detail("created"),
                )
                .await;
                Ok(IngestOutcome::Created {
                    id,
                    symbol: instruction.symbol.canonical,
                    direction: instruction.direction,
                })
            }
            Err(StoreError::DuplicateKey(_)) => {
                info!(signal_id = %id, chat_id = %alert.channel_id, "Duplicate alert skipped");
                self.record(
                    SignalEvent::new(EventStage::Ingest, true)
                        .channel(alert.channel_id.as_str(), alert.message_id)
                        .signal(id, instruction.symbol.canonical.as_str())
                        .detail("duplicate"),
                )
                .await;
                Ok(IngestOutcome::Skipped(SkipReason::Duplicate { id }))
            }
            Err(err) => {
                warn!(signal_id = %id, chat_id = %alert.channel_id, error = %err, "Failed to store signal");
                self.record(
                    SignalEvent::new(EventStage::Ingest, false)
                        .channel(alert.channel_id.as_str(), alert.message_id)
                        .detail(err.to_string()),
                )
                .await;
                Err(IngestError::Store(err))
            }
        }
    }

    /// Best-effort audit write.
    async fn record(&self, event: SignalEvent) {
        if let Err(err) = bounded(self.store_timeout, self.store.append_event(&event)).await {
            warn!(error = %err, stage = event.stage.as_str(), "Failed to append signal event");
        }
    }
}
