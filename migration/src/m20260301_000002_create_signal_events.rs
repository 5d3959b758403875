use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SignalEvents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SignalEvents::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(SignalEvents::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(SignalEvents::Stage).string_len(16).not_null()) // "ingest" or "dispatch"
                    .col(ColumnDef::new(SignalEvents::Ok).boolean().not_null().default(false))
                    .col(ColumnDef::new(SignalEvents::ChatId).string_len(64).null())
                    .col(ColumnDef::new(SignalEvents::MessageId).big_integer().null())
                    .col(ColumnDef::new(SignalEvents::SignalId).string_len(36).null())
                    .col(ColumnDef::new(SignalEvents::Symbol).string_len(32).null())
                    .col(ColumnDef::new(SignalEvents::Detail).text().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_signal_events_created")
                    .table(SignalEvents::Table)
                    .col(SignalEvents::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SignalEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SignalEvents {
    Table,
    Id,
    CreatedAt,
    Stage,
    Ok,
    ChatId,
    MessageId,
    SignalId,
    Symbol,
    Detail,
}
