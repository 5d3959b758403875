//! Persistence interface for signals.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Claim, SignalEvent, SignalFilter, TradeInstruction};

/// Result of one claim attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimAttempt {
    /// This caller won the `PENDING -> CLAIMED` transition.
    Claimed(TradeInstruction),
    /// No pending row matches the filter.
    NotFound,
    /// A candidate was found but another caller claimed it first.
    Conflict { id: Uuid },
}

/// Shared signal storage. Every method is atomic on its own; claim
/// exclusivity and dedup are enforced here, never by in-process locks
/// held by callers.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Writes `instruction` as `PENDING` with no claim metadata.
    /// Fails with [`StoreError::DuplicateKey`] when its id or dedup key exists.
    async fn insert_pending(&self, instruction: &TradeInstruction) -> Result<Uuid, StoreError>;

    /// Most relevant pending row: latest origin time first, then latest insert.
    async fn find_latest_pending(
        &self,
        filter: &SignalFilter,
    ) -> Result<Option<TradeInstruction>, StoreError>;

    /// Compare-and-swap `PENDING -> CLAIMED` on `id`, writing the claim
    /// metadata in the same update. `false` means the row was not pending.
    async fn try_claim(&self, id: Uuid, claim: &Claim) -> Result<bool, StoreError>;

    /// Selects and claims in one call.
    async fn claim_latest_pending(
        &self,
        filter: &SignalFilter,
        claim: &Claim,
    ) -> Result<ClaimAttempt, StoreError> {
        let Some(candidate) = self.find_latest_pending(filter).await? else {
            return Ok(ClaimAttempt::NotFound);
        };
        if self.try_claim(candidate.id, claim).await? {
            Ok(ClaimAttempt::Claimed(candidate.claimed_with(claim)))
        } else {
            Ok(ClaimAttempt::Conflict { id: candidate.id })
        }
    }

    /// Latest signal of a channel regardless of status.
    async fn get_latest_by_channel(
        &self,
        channel_id: &str,
    ) -> Result<Option<TradeInstruction>, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<TradeInstruction>, StoreError>;

    /// Newest first by insert time.
    async fn list_recent(
        &self,
        channel_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<TradeInstruction>, StoreError>;

    async fn append_event(&self, event: &SignalEvent) -> Result<(), StoreError>;

    /// Newest first.
    async fn recent_events(
        &self,
        channel_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<SignalEvent>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
