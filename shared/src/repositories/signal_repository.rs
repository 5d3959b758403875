use async_trait::async_trait;
use sea_orm::prelude::*;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{ActiveValue, Condition, QueryOrder, QuerySelect, SqlErr};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::entity::{signal_events, trade_signals};
use crate::error::StoreError;
use crate::models::{
    Claim, Direction, EventStage, SignalEvent, SignalFilter, SignalStatus, SymbolAliases,
    TradeInstruction,
};
use crate::store::SignalStore;

/// [`SignalStore`] over a Sea-ORM connection (MySQL in production, SQLite in tests).
pub struct SeaOrmSignalStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmSignalStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SignalStore for SeaOrmSignalStore {
    async fn insert_pending(&self, instruction: &TradeInstruction) -> Result<Uuid, StoreError> {
        let model = pending_active_model(instruction);
        match trade_signals::Entity::insert(model)
            .exec_without_returning(self.db.as_ref())
            .await
        {
            Ok(_) => Ok(instruction.id),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(StoreError::DuplicateKey(instruction.dedup_key.clone()))
                }
                _ => Err(err.into()),
            },
        }
    }

    async fn find_latest_pending(
        &self,
        filter: &SignalFilter,
    ) -> Result<Option<TradeInstruction>, StoreError> {
        let mut query = trade_signals::Entity::find()
            .filter(trade_signals::Column::ChatId.eq(filter.channel_id.as_str()))
            .filter(trade_signals::Column::Status.eq(SignalStatus::Pending.as_str()));

        if let Some(symbol) = filter.symbol.as_deref() {
            let prefix = LikeExpr::new(format!("{}%", escape_like(symbol))).escape('\\');
            query = query.filter(
                Condition::any()
                    .add(trade_signals::Column::Symbol.eq(symbol))
                    .add(trade_signals::Column::SymbolDisplay.eq(symbol))
                    .add(trade_signals::Column::SymbolExecution.like(prefix)),
            );
        }

        let row = query
            .order_by_desc(trade_signals::Column::OriginAt)
            .order_by_desc(trade_signals::Column::CreatedAt)
            .one(self.db.as_ref())
            .await?;

        row.map(TradeInstruction::try_from).transpose()
    }

    async fn try_claim(&self, id: Uuid, claim: &Claim) -> Result<bool, StoreError> {
        let result = trade_signals::Entity::update_many()
            .col_expr(
                trade_signals::Column::Status,
                Expr::value(SignalStatus::Claimed.as_str()),
            )
            .col_expr(trade_signals::Column::ClaimedBy, Expr::value(claim.claimant.clone()))
            .col_expr(trade_signals::Column::ClaimedAt, Expr::value(claim.claimed_at))
            .filter(trade_signals::Column::Id.eq(id.to_string()))
            .filter(trade_signals::Column::Status.eq(SignalStatus::Pending.as_str()))
            .exec(self.db.as_ref())
            .await?;

        debug!(
            signal_id = %id,
            claimant = %claim.claimant,
            rows_affected = result.rows_affected,
            "conditional claim executed"
        );
        Ok(result.rows_affected == 1)
    }

    async fn get_latest_by_channel(
        &self,
        channel_id: &str,
    ) -> Result<Option<TradeInstruction>, StoreError> {
        let row = trade_signals::Entity::find()
            .filter(trade_signals::Column::ChatId.eq(channel_id))
            .order_by_desc(trade_signals::Column::OriginAt)
            .order_by_desc(trade_signals::Column::CreatedAt)
            .one(self.db.as_ref())
            .await?;

        row.map(TradeInstruction::try_from).transpose()
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<TradeInstruction>, StoreError> {
        let row = trade_signals::Entity::find_by_id(id.to_string())
            .one(self.db.as_ref())
            .await?;

        row.map(TradeInstruction::try_from).transpose()
    }

    async fn list_recent(
        &self,
        channel_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<TradeInstruction>, StoreError> {
        let mut query = trade_signals::Entity::find();
        if let Some(channel_id) = channel_id {
            query = query.filter(trade_signals::Column::ChatId.eq(channel_id));
        }

        query
            .order_by_desc(trade_signals::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(TradeInstruction::try_from)
            .collect()
    }

    async fn append_event(&self, event: &SignalEvent) -> Result<(), StoreError> {
        let model = signal_events::ActiveModel {
            id: ActiveValue::NotSet,
            created_at: ActiveValue::Set(event.created_at),
            stage: ActiveValue::Set(event.stage.as_str().to_string()),
            ok: ActiveValue::Set(event.ok),
            chat_id: ActiveValue::Set(event.channel_id.clone()),
            message_id: ActiveValue::Set(event.message_id),
            signal_id: ActiveValue::Set(event.signal_id.map(|id| id.to_string())),
            symbol: ActiveValue::Set(event.symbol.clone()),
            detail: ActiveValue::Set(event.detail.clone()),
        };

        signal_events::Entity::insert(model)
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn recent_events(
        &self,
        channel_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<SignalEvent>, StoreError> {
        let mut query = signal_events::Entity::find();
        if let Some(channel_id) = channel_id {
            query = query.filter(signal_events::Column::ChatId.eq(channel_id));
        }

        query
            .order_by_desc(signal_events::Column::CreatedAt)
            .order_by_desc(signal_events::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(SignalEvent::try_from)
            .collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.ping().await?;
        Ok(())
    }
}

/// Insert model for a new row. Status and claim columns are forced to
/// their pending values whatever the caller passed.
fn pending_active_model(instruction: &TradeInstruction) -> trade_signals::ActiveModel {
    trade_signals::ActiveModel {
        id: ActiveValue::Set(instruction.id.to_string()),
        dedup_key: ActiveValue::Set(instruction.dedup_key.clone()),
        source: ActiveValue::Set(instruction.source.clone()),
        chat_id: ActiveValue::Set(instruction.channel_id.clone()),
        message_id: ActiveValue::Set(instruction.message_id),
        symbol: ActiveValue::Set(instruction.symbol.canonical.clone()),
        symbol_display: ActiveValue::Set(instruction.symbol.display.clone()),
        symbol_execution: ActiveValue::Set(instruction.symbol.execution.clone()),
        timeframe: ActiveValue::Set(instruction.timeframe.clone()),
        side: ActiveValue::Set(instruction.direction.as_str().to_string()),
        entry: ActiveValue::Set(instruction.entry),
        sl: ActiveValue::Set(instruction.stop_loss),
        tp: ActiveValue::Set(instruction.take_profit),
        raw_text: ActiveValue::Set(instruction.raw_text.clone()),
        status: ActiveValue::Set(SignalStatus::Pending.as_str().to_string()),
        created_at: ActiveValue::Set(instruction.created_at),
        origin_at: ActiveValue::Set(instruction.origin_at),
        claimed_at: ActiveValue::Set(None),
        claimed_by: ActiveValue::Set(None),
        last_error: ActiveValue::Set(instruction.last_error.clone()),
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn corrupt(id: &str, reason: impl Into<String>) -> StoreError {
    StoreError::CorruptRow {
        id: id.to_string(),
        reason: reason.into(),
    }
}

impl TryFrom<trade_signals::Model> for TradeInstruction {
    type Error = StoreError;

    fn try_from(model: trade_signals::Model) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&model.id).map_err(|e| corrupt(&model.id, format!("id: {e}")))?;
        let direction = Direction::from_str(&model.side).map_err(|e| corrupt(&model.id, e))?;
        let status = SignalStatus::from_str(&model.status).map_err(|e| corrupt(&model.id, e))?;

        Ok(TradeInstruction {
            id,
            dedup_key: model.dedup_key,
            source: model.source,
            channel_id: model.chat_id,
            message_id: model.message_id,
            symbol: SymbolAliases {
                canonical: model.symbol,
                display: model.symbol_display,
                execution: model.symbol_execution,
            },
            timeframe: model.timeframe,
            direction,
            entry: model.entry,
            stop_loss: model.sl,
            take_profit: model.tp,
            raw_text: model.raw_text,
            created_at: model.created_at,
            origin_at: model.origin_at,
            status,
            claimed_at: model.claimed_at,
            claimed_by: model.claimed_by,
            last_error: model.last_error,
        })
    }
}

impl TryFrom<signal_events::Model> for SignalEvent {
    type Error = StoreError;

    fn try_from(model: signal_events::Model) -> Result<Self, Self::Error> {
        let row_id = model.id.to_string();
        let stage = EventStage::from_str(&model.stage).map_err(|e| corrupt(&row_id, e))?;
        let signal_id = model
            .signal_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| corrupt(&row_id, format!("signal_id: {e}")))?;

        Ok(SignalEvent {
            created_at: model.created_at,
            stage,
            ok: model.ok,
            channel_id: model.chat_id,
            message_id: model.message_id,
            signal_id,
            symbol: model.symbol,
            detail: model.detail,
        })
    }
}
