//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;
use rust_decimal::Decimal;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "trade_signals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String, // UUIDv5 of dedup_key
    #[sea_orm(unique)]
    pub dedup_key: String,
    pub source: String, // "telegram"
    pub chat_id: String,
    #[sea_orm(column_type = "BigInteger", nullable)]
    pub message_id: Option<i64>,
    pub symbol: String,
    pub symbol_display: String,
    pub symbol_execution: String, // venue alias, e.g. "XAUUSD.cm"
    pub timeframe: String,
    pub side: String, // "BUY" or "SELL"
    #[sea_orm(column_type = "Decimal(Some((16, 8)))")]
    pub entry: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 8)))")]
    pub sl: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 8)))")]
    pub tp: Decimal,
    #[sea_orm(column_type = "Text")]
    pub raw_text: String,
    pub status: String, // "PENDING", "CLAIMED"
    pub created_at: DateTimeUtc,
    pub origin_at: DateTimeUtc, // when the alert was posted
    pub claimed_at: Option<DateTimeUtc>,
    pub claimed_by: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub last_error: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
