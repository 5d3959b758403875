use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Claim, SignalEvent, SignalFilter, SignalStatus, TradeInstruction};
use crate::store::SignalStore;

/// Audit events kept in memory. Older ones are dropped first.
pub const MAX_EVENTS: usize = 500;

#[derive(Default)]
struct Inner {
    signals: HashMap<Uuid, TradeInstruction>,
    dedup_keys: HashMap<String, Uuid>,
    events: VecDeque<SignalEvent>,
}

/// In-process [`SignalStore`]. Each operation takes the lock once, which
/// gives it the same atomicity as a single SQL statement.
#[derive(Default)]
pub struct MemorySignalStore {
    inner: RwLock<Inner>,
}

impl MemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.signals.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn newest_first(a: &TradeInstruction, b: &TradeInstruction) -> std::cmp::Ordering {
    (b.origin_at, b.created_at).cmp(&(a.origin_at, a.created_at))
}

#[async_trait]
impl SignalStore for MemorySignalStore {
    async fn insert_pending(&self, instruction: &TradeInstruction) -> Result<Uuid, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.dedup_keys.contains_key(&instruction.dedup_key)
            || inner.signals.contains_key(&instruction.id)
        {
            return Err(StoreError::DuplicateKey(instruction.dedup_key.clone()));
        }

        let row = TradeInstruction {
            status: SignalStatus::Pending,
            claimed_at: None,
            claimed_by: None,
            ..instruction.clone()
        };
        inner
            .dedup_keys
            .insert(instruction.dedup_key.clone(), instruction.id);
        inner.signals.insert(instruction.id, row);
        Ok(instruction.id)
    }

    async fn find_latest_pending(
        &self,
        filter: &SignalFilter,
    ) -> Result<Option<TradeInstruction>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .signals
            .values()
            .filter(|s| s.is_pending() && filter.matches(s))
            .min_by(|a, b| newest_first(a, b))
            .cloned())
    }

    async fn try_claim(&self, id: Uuid, claim: &Claim) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.signals.get_mut(&id) {
            Some(signal) if signal.status.can_transition_to(SignalStatus::Claimed) => {
                signal.status = SignalStatus::Claimed;
                signal.claimed_at = Some(claim.claimed_at);
                signal.claimed_by = Some(claim.claimant.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_latest_by_channel(
        &self,
        channel_id: &str,
    ) -> Result<Option<TradeInstruction>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .signals
            .values()
            .filter(|s| s.channel_id == channel_id)
            .min_by(|a, b| newest_first(a, b))
            .cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<TradeInstruction>, StoreError> {
        Ok(self.inner.read().await.signals.get(&id).cloned())
    }

    async fn list_recent(
        &self,
        channel_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<TradeInstruction>, StoreError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<TradeInstruction> = inner
            .signals
            .values()
            .filter(|s| channel_id.map_or(true, |c| s.channel_id == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn append_event(&self, event: &SignalEvent) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.events.len() >= MAX_EVENTS {
            inner.events.pop_front();
        }
        inner.events.push_back(event.clone());
        Ok(())
    }

    async fn recent_events(
        &self,
        channel_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<SignalEvent>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .events
            .iter()
            .rev()
            .filter(|e| channel_id.map_or(true, |c| e.channel_id.as_deref() == Some(c)))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
