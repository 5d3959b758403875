//! Venue symbol mapping.

use std::collections::HashMap;

use crate::models::SymbolAliases;

/// Mapping table from a parsed symbol to the name a trading venue uses.
pub trait SymbolMapper: Send + Sync {
    /// Venue-specific name for `canonical`, if the table knows one.
    fn execution_alias(&self, canonical: &str) -> Option<String>;

    /// Full alias set. The execution alias falls back to the canonical symbol.
    fn resolve(&self, canonical: &str) -> SymbolAliases {
        let mut aliases = SymbolAliases::canonical(canonical);
        if let Some(alias) = self
            .execution_alias(canonical)
            .map(|alias| alias.trim().to_string())
            .filter(|alias| !alias.is_empty())
        {
            aliases.execution = alias;
        }
        aliases
    }
}

/// Table loaded from configuration, with an optional suffix for unmapped symbols.
#[derive(Debug, Clone, Default)]
pub struct StaticSymbolMap {
    entries: HashMap<String, String>,
    suffix: Option<String>,
}

impl StaticSymbolMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `XAUUSD=XAUUSD.cm,BTCUSD=BTCUSDm`.
    pub fn parse(table: &str) -> Result<Self, anyhow::Error> {
        let mut map = Self::new();
        for pair in table.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (canonical, execution) = pair
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("Invalid symbol mapping entry: {}", pair))?;
            let (canonical, execution) = (canonical.trim(), execution.trim());
            if canonical.is_empty() || execution.is_empty() {
                anyhow::bail!("Invalid symbol mapping entry: {}", pair);
            }
            map = map.with_entry(canonical, execution);
        }
        Ok(map)
    }

    pub fn with_entry(mut self, canonical: &str, execution: &str) -> Self {
        self.entries
            .insert(canonical.to_ascii_uppercase(), execution.to_string());
        self
    }

    /// Appended to symbols without an explicit entry, e.g. `.cm`.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.suffix = if suffix.trim().is_empty() { None } else { Some(suffix) };
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.suffix.is_none()
    }
}

impl SymbolMapper for StaticSymbolMap {
    fn execution_alias(&self, canonical: &str) -> Option<String> {
        self.entries
            .get(&canonical.to_ascii_uppercase())
            .cloned()
            .or_else(|| self.suffix.as_ref().map(|suffix| format!("{canonical}{suffix}")))
    }
}
