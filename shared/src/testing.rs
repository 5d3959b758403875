//! Fixtures shared by the unit tests of this crate.

use chrono::{DateTime, Utc};
use migration::{Migrator, MigratorTrait};
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Direction, SignalStatus, SymbolAliases, TradeInstruction};
use crate::repositories::SeaOrmSignalStore;

/// A pending BUY instruction with a unique dedup key.
pub fn instruction(channel_id: &str, symbol: &str, origin_at: DateTime<Utc>) -> TradeInstruction {
    let dedup_key = format!("{channel_id}:{symbol}:{}", Uuid::new_v4().simple());
    TradeInstruction {
        id: Uuid::new_v5(&Uuid::NAMESPACE_OID, dedup_key.as_bytes()),
        dedup_key,
        source: "telegram".to_string(),
        channel_id: channel_id.to_string(),
        message_id: Some(42),
        symbol: SymbolAliases::canonical(symbol),
        timeframe: "M5".to_string(),
        direction: Direction::Buy,
        entry: dec!(2350.5),
        stop_loss: dec!(2340),
        take_profit: dec!(2365),
        raw_text: format!("{symbol} | TF : M5\nENTRY LONG"),
        created_at: Utc::now(),
        origin_at,
        status: SignalStatus::Pending,
        claimed_at: None,
        claimed_by: None,
        last_error: None,
    }
}

/// Fresh in-memory SQLite database with the schema applied. A single
/// connection keeps every query on the same database.
pub async fn sqlite_store() -> SeaOrmSignalStore {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("sqlite connect");
    Migrator::up(&db, None).await.expect("migrations");
    SeaOrmSignalStore::new(Arc::new(db))
}
