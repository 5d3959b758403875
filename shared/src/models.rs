use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Trade side carried by an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
    /// Exit notice. Informational only, never persisted as a signal.
    Close,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::Close => "CLOSE",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Direction::Buy),
            "SELL" => Ok(Direction::Sell),
            "CLOSE" => Ok(Direction::Close),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// Lifecycle of a stored signal. `Pending -> Claimed` is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalStatus {
    Pending,
    Claimed,
}

impl SignalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Pending => "PENDING",
            SignalStatus::Claimed => "CLAIMED",
        }
    }

    pub fn can_transition_to(&self, next: SignalStatus) -> bool {
        matches!((self, next), (SignalStatus::Pending, SignalStatus::Claimed))
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SignalStatus::Pending),
            "CLAIMED" => Ok(SignalStatus::Claimed),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Names a symbol goes by: as parsed, as shown on charts, and as traded on the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolAliases {
    pub canonical: String,
    pub display: String,
    pub execution: String,
}

impl SymbolAliases {
    /// Display and execution alias both default to the canonical symbol.
    pub fn canonical(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            display: symbol.clone(),
            execution: symbol.clone(),
            canonical: symbol,
        }
    }

    /// Exact match on canonical/display, prefix match on the execution alias
    /// so `XAUUSD` finds `XAUUSD.cm`. Comparison ignores ASCII case.
    pub fn matches(&self, symbol: &str) -> bool {
        let wanted = symbol.to_ascii_uppercase();
        self.canonical.eq_ignore_ascii_case(&wanted)
            || self.display.eq_ignore_ascii_case(&wanted)
            || self.execution.to_ascii_uppercase().starts_with(&wanted)
    }
}

/// A structured trade directive derived from one alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeInstruction {
    pub id: Uuid,
    pub dedup_key: String,
    pub source: String,
    pub channel_id: String,
    pub message_id: Option<i64>,
    pub symbol: SymbolAliases,
    pub timeframe: String,
    pub direction: Direction,
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
    pub origin_at: DateTime<Utc>,
    pub status: SignalStatus,
    pub claimed_at: Option<DateTime<Utc>>,
    pub claimed_by: Option<String>,
    pub last_error: Option<String>,
}

impl TradeInstruction {
    pub fn is_pending(&self) -> bool {
        self.status == SignalStatus::Pending
    }

    /// Copy of this instruction as seen right after `claim` won.
    pub fn claimed_with(&self, claim: &Claim) -> TradeInstruction {
        TradeInstruction {
            status: SignalStatus::Claimed,
            claimed_at: Some(claim.claimed_at),
            claimed_by: Some(claim.claimant.clone()),
            ..self.clone()
        }
    }
}

/// Selection criteria for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalFilter {
    pub channel_id: String,
    pub symbol: Option<String>,
}

impl SignalFilter {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            symbol: None,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into().to_ascii_uppercase());
        self
    }

    /// Channel and symbol match only; status is the store's concern.
    pub fn matches(&self, instruction: &TradeInstruction) -> bool {
        instruction.channel_id == self.channel_id
            && self
                .symbol
                .as_deref()
                .map_or(true, |symbol| instruction.symbol.matches(symbol))
    }
}

/// Who claims a signal and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub claimant: String,
    pub claimed_at: DateTime<Utc>,
}

impl Claim {
    pub fn now(claimant: impl Into<String>) -> Self {
        Self {
            claimant: claimant.into(),
            claimed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStage {
    Ingest,
    Dispatch,
}

impl EventStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStage::Ingest => "ingest",
            EventStage::Dispatch => "dispatch",
        }
    }
}

impl FromStr for EventStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ingest" => Ok(EventStage::Ingest),
            "dispatch" => Ok(EventStage::Dispatch),
            other => Err(format!("unknown event stage: {other}")),
        }
    }
}

/// Audit record for the debug endpoint. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub created_at: DateTime<Utc>,
    pub stage: EventStage,
    pub ok: bool,
    pub channel_id: Option<String>,
    pub message_id: Option<i64>,
    pub signal_id: Option<Uuid>,
    pub symbol: Option<String>,
    pub detail: Option<String>,
}

impl SignalEvent {
    pub fn new(stage: EventStage, ok: bool) -> Self {
        Self {
            created_at: Utc::now(),
            stage,
            ok,
            channel_id: None,
            message_id: None,
            signal_id: None,
            symbol: None,
            detail: None,
        }
    }

    pub fn channel(mut self, channel_id: impl Into<String>, message_id: Option<i64>) -> Self {
        self.channel_id = Some(channel_id.into());
        self.message_id = message_id;
        self
    }

    pub fn signal(mut self, id: Uuid, symbol: impl Into<String>) -> Self {
        self.signal_id = Some(id);
        self.symbol = Some(symbol.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
