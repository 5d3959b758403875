//! `SeaORM` Entity, @generated manually

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "signal_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub created_at: DateTimeUtc,
    pub stage: String, // "ingest" or "dispatch"
    pub ok: bool,
    pub chat_id: Option<String>,
    #[sea_orm(column_type = "BigInteger", nullable)]
    pub message_id: Option<i64>,
    pub signal_id: Option<String>,
    pub symbol: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub detail: Option<String>, // rejection code, claimant or error text
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
