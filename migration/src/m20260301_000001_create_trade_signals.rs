use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TradeSignals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TradeSignals::Id).string_len(36).not_null().primary_key()) // UUIDv5
                    .col(ColumnDef::new(TradeSignals::DedupKey).string_len(64).not_null().unique_key()) // sha256 hex
                    .col(ColumnDef::new(TradeSignals::Source).string_len(32).not_null())
                    .col(ColumnDef::new(TradeSignals::ChatId).string_len(64).not_null())
                    .col(ColumnDef::new(TradeSignals::MessageId).big_integer().null())
                    .col(ColumnDef::new(TradeSignals::Symbol).string_len(32).not_null())
                    .col(ColumnDef::new(TradeSignals::SymbolDisplay).string_len(32).not_null())
                    .col(ColumnDef::new(TradeSignals::SymbolExecution).string_len(48).not_null())
                    .col(ColumnDef::new(TradeSignals::Timeframe).string_len(16).not_null())
                    .col(ColumnDef::new(TradeSignals::Side).string_len(8).not_null()) // "BUY" or "SELL"
                    // SQLite caps decimal precision at 16.
                    .col(ColumnDef::new(TradeSignals::Entry).decimal_len(16, 8).not_null())
                    .col(ColumnDef::new(TradeSignals::Sl).decimal_len(16, 8).not_null())
                    .col(ColumnDef::new(TradeSignals::Tp).decimal_len(16, 8).not_null())
                    .col(ColumnDef::new(TradeSignals::RawText).text().not_null())
                    .col(ColumnDef::new(TradeSignals::Status).string_len(16).not_null().default("PENDING"))
                    .col(ColumnDef::new(TradeSignals::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(TradeSignals::OriginAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(TradeSignals::ClaimedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(TradeSignals::ClaimedBy).string_len(64).null())
                    .col(ColumnDef::new(TradeSignals::LastError).text().null())
                    .to_owned(),
            )
            .await?;

        // Poll path: chat + status, newest origin first.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_trade_signals_chat_status_origin")
                    .table(TradeSignals::Table)
                    .col(TradeSignals::ChatId)
                    .col(TradeSignals::Status)
                    .col(TradeSignals::OriginAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_trade_signals_created")
                    .table(TradeSignals::Table)
                    .col(TradeSignals::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TradeSignals::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TradeSignals {
    Table,
    Id,
    DedupKey,
    Source,
    ChatId,
    MessageId,
    Symbol,
    SymbolDisplay,
    SymbolExecution,
    Timeframe,
    Side,
    Entry,
    Sl,
    Tp,
    RawText,
    Status,
    CreatedAt,
    OriginAt,
    ClaimedAt,
    ClaimedBy,
    LastError,
}
