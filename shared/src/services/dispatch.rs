//! Terminal polling: select the most relevant pending signal and claim it.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{bounded, DEFAULT_STORE_TIMEOUT};
use crate::error::DispatchError;
use crate::models::{Claim, EventStage, SignalEvent, SignalFilter, TradeInstruction};
use crate::store::{ClaimAttempt, SignalStore};

pub const DEFAULT_CLAIMANT: &str = "mt5";
pub const DEFAULT_RETRY_BUDGET: u32 = 3;

/// A poll as received from a terminal. Fields are raw query values.
#[derive(Debug, Clone, Default)]
pub struct DispatchRequest {
    pub channel_id: Option<String>,
    pub symbol: Option<String>,
    pub claimant: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Claimed(ClaimedSignal),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedSignal {
    pub instruction: TradeInstruction,
    /// Claim attempts used, including the winning one.
    pub attempts: u32,
    /// Set when the claim succeeded but its audit write did not.
    pub bookkeeping_error: Option<String>,
}

pub struct DispatchCoordinator {
    store: Arc<dyn SignalStore>,
    retry_budget: u32,
    default_claimant: String,
    store_timeout: Duration,
}

impl DispatchCoordinator {
    pub fn new(store: Arc<dyn SignalStore>) -> Self {
        Self {
            store,
            retry_budget: DEFAULT_RETRY_BUDGET,
            default_claimant: DEFAULT_CLAIMANT.to_string(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Budget of conditional claims per poll. Never below one.
    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget.max(1);
        self
    }

    pub fn with_default_claimant(mut self, claimant: impl Into<String>) -> Self {
        self.default_claimant = claimant.into();
        self
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome, DispatchError> {
        let channel_id = request
            .channel_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(DispatchError::Caller("chat_id"))?;

        let mut filter = SignalFilter::new(channel_id);
        if let Some(symbol) = request.symbol.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            filter = filter.with_symbol(symbol);
        }
        let claimant = request
            .claimant
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(self.default_claimant.as_str());

        for attempt in 1..=self.retry_budget {
            let claim = Claim::now(claimant);
            let result = bounded(
                self.store_timeout,
                self.store.claim_latest_pending(&filter, &claim),
            )
            .await?;

            match result {
                ClaimAttempt::NotFound => {
                    debug!(chat_id = %filter.channel_id, symbol = ?filter.symbol, "No pending signal");
                    return Ok(DispatchOutcome::Empty);
                }
                ClaimAttempt::Conflict { id } => {
                    debug!(signal_id = %id, attempt, "Claim lost to another poller, reselecting");
                }
                ClaimAttempt::Claimed(instruction) => {
                    info!(
                        signal_id = %instruction.id,
                        chat_id = %instruction.channel_id,
                        symbol = %instruction.symbol.canonical,
                        claimant = %claim.claimant,
                        attempt,
                        "Signal claimed"
                    );
                    let bookkeeping_error = self.record_claim(&instruction, &claim).await;
                    return Ok(DispatchOutcome::Claimed(ClaimedSignal {
                        instruction,
                        attempts: attempt,
                        bookkeeping_error,
                    }));
                }
            }
        }

        warn!(
            chat_id = %filter.channel_id,
            symbol = ?filter.symbol,
            attempts = self.retry_budget,
            "Claim contention exhausted retry budget"
        );
        Err(DispatchError::Busy {
            attempts: self.retry_budget,
        })
    }

    /// Advisory write after a won claim. Its failure never undoes the claim.
    async fn record_claim(&self, instruction: &TradeInstruction, claim: &Claim) -> Option<String> {
        let event = SignalEvent::new(EventStage::Dispatch, true)
            .channel(instruction.channel_id.as_str(), instruction.message_id)
            .signal(instruction.id, instruction.symbol.canonical.as_str())
            .detail(claim.claimant.as_str());

        match bounded(self.store_timeout, self.store.append_event(&event)).await {
            Ok(()) => None,
            Err(err) => {
                warn!(signal_id = %instruction.id, error = %err, "Claim bookkeeping failed, returning signal anyway");
                Some(err.to_string())
            }
        }
    }
}
