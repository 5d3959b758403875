//! Alert text extraction.
//!
//! Turns chat alerts such as
//!
//! ```text
//! XAUUSD | TF : M5
//! 🟢 ENTRY LONG
//! Entry: 2350.5
//! SL: 2340
//! TP: 2365
//! ```
//!
//! into a [`ParsedSignal`], or explains why the text is not a trade entry.
//! Every function here is pure.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::Direction;

static ENTRY_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bENTRY[\s:_\-]*(LONG|SHORT)\b").expect("valid entry marker regex"));

static EXIT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(EXIT|CLOSE)(?:[\s:_\-]*(LONG|SHORT|BUY|SELL|ALL))?\b")
        .expect("valid exit marker regex")
});

static SYMBOL_TIMEFRAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([A-Z0-9._\-]+)\s*\|\s*TF\s*[:：=]\s*([A-Z0-9]+)").expect("valid symbol regex")
});

static ENTRY_PRICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bEntry\s*[:：]\s*([0-9][0-9.,]*)").expect("valid entry regex"));

static STOP_LOSS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bSL\s*[:：]\s*([0-9][0-9.,]*)").expect("valid sl regex"));

static TAKE_PROFIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bTP\s*[:：]\s*([0-9][0-9.,]*)").expect("valid tp regex"));

/// Labelled price fields of an entry alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    Entry,
    StopLoss,
    TakeProfit,
}

impl PriceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Entry => "entry",
            PriceField::StopLoss => "sl",
            PriceField::TakeProfit => "tp",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            PriceField::Entry => &ENTRY_PRICE,
            PriceField::StopLoss => &STOP_LOSS,
            PriceField::TakeProfit => &TAKE_PROFIT,
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a text is not a trade entry. Expected for most chat traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no_entry_marker")]
    NoEntryMarker,

    #[error("missing_symbol_or_timeframe")]
    MissingSymbolOrTimeframe,

    #[error("missing_or_invalid_price_field: {field}")]
    MissingOrInvalidPrice { field: PriceField },
}

impl Rejection {
    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::NoEntryMarker => "no_entry_marker",
            Rejection::MissingSymbolOrTimeframe => "missing_symbol_or_timeframe",
            Rejection::MissingOrInvalidPrice { .. } => "missing_or_invalid_price_field",
        }
    }
}

/// Structured fields of an entry alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSignal {
    pub symbol: String,
    pub timeframe: String,
    pub direction: Direction,
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

/// An exit/close notice found in a text without an entry marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitNotice {
    pub direction: Direction,
    pub marker: String,
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
}

/// Extracts an entry instruction from alert text.
///
/// Checks run in a fixed order: entry marker, symbol/timeframe, then the
/// `Entry`, `SL` and `TP` fields. The first failure is reported.
pub fn extract(text: &str) -> Result<ParsedSignal, Rejection> {
    let direction = entry_direction(text).ok_or(Rejection::NoEntryMarker)?;
    let (symbol, timeframe) = symbol_and_timeframe(text).ok_or(Rejection::MissingSymbolOrTimeframe)?;

    let entry = price_field(text, PriceField::Entry)?;
    let stop_loss = price_field(text, PriceField::StopLoss)?;
    let take_profit = price_field(text, PriceField::TakeProfit)?;

    Ok(ParsedSignal {
        symbol,
        timeframe,
        direction,
        entry,
        stop_loss,
        take_profit,
    })
}

/// Finds an exit/close marker. `None` whenever an entry marker is present.
pub fn detect_exit(text: &str) -> Option<ExitNotice> {
    if entry_direction(text).is_some() {
        return None;
    }
    let marker = EXIT_MARKER.find(text)?;
    let (symbol, timeframe) = match symbol_and_timeframe(text) {
        Some((symbol, timeframe)) => (Some(symbol), Some(timeframe)),
        None => (None, None),
    };

    Some(ExitNotice {
        direction: Direction::Close,
        marker: marker.as_str().to_ascii_uppercase(),
        symbol,
        timeframe,
    })
}

fn entry_direction(text: &str) -> Option<Direction> {
    let caps = ENTRY_MARKER.captures(text)?;
    if caps[1].eq_ignore_ascii_case("LONG") {
        Some(Direction::Buy)
    } else {
        Some(Direction::Sell)
    }
}

fn symbol_and_timeframe(text: &str) -> Option<(String, String)> {
    let caps = SYMBOL_TIMEFRAME.captures(text)?;
    let symbol = caps.get(1)?.as_str().to_ascii_uppercase();
    let timeframe = caps.get(2)?.as_str().to_ascii_uppercase();
    // A bare run of separators is not a symbol.
    if !symbol.chars().any(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some((symbol, timeframe))
}

fn price_field(text: &str, field: PriceField) -> Result<Decimal, Rejection> {
    field
        .pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|raw| parse_price(raw.as_str()))
        .ok_or(Rejection::MissingOrInvalidPrice { field })
}

/// Parses a price written with `.` or `,` as decimal separator.
///
/// A single `,` with no `.` is the decimal point (`5067,49`). In any other
/// shape commas are thousands separators (`1,234,567.5`). Only strictly
/// positive values are accepted.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim().trim_end_matches(|c| c == '.' || c == ',');
    if trimmed.is_empty() {
        return None;
    }

    let commas = trimmed.matches(',').count();
    let dots = trimmed.matches('.').count();
    let cleaned = if commas == 1 && dots == 0 {
        trimmed.replace(',', ".")
    } else {
        trimmed.replace(',', "")
    };

    let value = Decimal::from_str(&cleaned).ok()?;
    if value <= Decimal::ZERO {
        return None;
    }
    Some(value.normalize())
}

/// Canonical form of alert text used for extraction and dedup.
///
/// Line endings become `\n`, runs of horizontal whitespace become a single
/// space, every line is trimmed and blank lines are dropped.
pub fn normalize_text(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    const XAU_LONG: &str = "XAUUSD | TF : M5\nENTRY LONG\nEntry: 2350.5\nSL: 2340\nTP: 2365";

    #[test]
    fn test_extract_long_scenario() {
        let parsed = extract(XAU_LONG).unwrap();
        assert_eq!(parsed.symbol, "XAUUSD");
        assert_eq!(parsed.timeframe, "M5");
        assert_eq!(parsed.direction, Direction::Buy);
        assert_eq!(parsed.entry, dec!(2350.5));
        assert_eq!(parsed.stop_loss, dec!(2340));
        assert_eq!(parsed.take_profit, dec!(2365));
    }

    #[test]
    fn test_extract_short_with_comma_decimals_and_emoji() {
        let text = "🔴 btcusd | tf：h1 🔴\n🚨ENTRY SHORT🚨\nentry: 67050,25\nsl: 67400,5\ntp: 66000";
        let parsed = extract(text).unwrap();
        assert_eq!(parsed.symbol, "BTCUSD");
        assert_eq!(parsed.timeframe, "H1");
        assert_eq!(parsed.direction, Direction::Sell);
        assert_eq!(parsed.entry, dec!(67050.25));
        assert_eq!(parsed.stop_loss, dec!(67400.5));
        assert_eq!(parsed.take_profit, dec!(66000));
    }

    #[test]
    fn test_extract_thousands_separators() {
        let text = "US30 | TF = M15 ENTRY: LONG Entry: 39,125.5 SL: 39,010 TP: 39,400.0.";
        let parsed = extract(text).unwrap();
        assert_eq!(parsed.direction, Direction::Buy);
        assert_eq!(parsed.entry, dec!(39125.5));
        // Single comma and no dot reads as a decimal comma.
        assert_eq!(parsed.stop_loss, dec!(39.010));
        assert_eq!(parsed.take_profit, dec!(39400));
    }

    #[test]
    fn test_first_entry_marker_decides_direction() {
        let text = "EURUSD | TF : M1\nENTRY SHORT (was ENTRY LONG)\nEntry: 1.0850\nSL: 1.0870\nTP: 1.0800";
        assert_eq!(extract(text).unwrap().direction, Direction::Sell);
    }

    #[test]
    fn test_no_entry_marker() {
        assert_eq!(extract("Daily recap: no trades today"), Err(Rejection::NoEntryMarker));
        assert_eq!(extract(""), Err(Rejection::NoEntryMarker));
        assert_eq!(
            extract("XAUUSD | TF : M5\nTP HIT ✅ +150 pips"),
            Err(Rejection::NoEntryMarker)
        );
    }

    #[test]
    fn test_missing_symbol_or_timeframe() {
        let text = "ENTRY LONG\nEntry: 2350.5\nSL: 2340\nTP: 2365";
        assert_eq!(extract(text), Err(Rejection::MissingSymbolOrTimeframe));
        let text = "XAUUSD | M5\nENTRY LONG\nEntry: 2350.5\nSL: 2340\nTP: 2365";
        assert_eq!(extract(text), Err(Rejection::MissingSymbolOrTimeframe));
    }

    #[test]
    fn test_price_field_failures_name_the_field() {
        let missing_tp = "XAUUSD | TF : M5\nENTRY LONG\nEntry: 2350.5\nSL: 2340";
        assert_eq!(
            extract(missing_tp),
            Err(Rejection::MissingOrInvalidPrice { field: PriceField::TakeProfit })
        );

        let bad_sl = "XAUUSD | TF : M5\nENTRY LONG\nEntry: 2350.5\nSL: 23.40.1\nTP: 2365";
        let rejection = extract(bad_sl).unwrap_err();
        assert_eq!(rejection, Rejection::MissingOrInvalidPrice { field: PriceField::StopLoss });
        assert_eq!(rejection.code(), "missing_or_invalid_price_field");
        assert_eq!(rejection.to_string(), "missing_or_invalid_price_field: sl");

        let zero_entry = "XAUUSD | TF : M5\nENTRY LONG\nEntry: 0\nSL: 2340\nTP: 2365";
        assert_eq!(
            extract(zero_entry),
            Err(Rejection::MissingOrInvalidPrice { field: PriceField::Entry })
        );
    }

    #[test]
    fn test_entry_label_is_not_the_marker() {
        // "ENTRY: LONG" is the marker; the price comes from the later numeric field.
        let text = "GBPJPY | TF : M30\nENTRY: LONG\nEntry: 191,25\nSL: 190,75\nTP: 192,5";
        let parsed = extract(text).unwrap();
        assert_eq!(parsed.entry, dec!(191.25));
        assert_eq!(parsed.stop_loss, dec!(190.75));
        assert_eq!(parsed.take_profit, dec!(192.5));
    }

    #[test]
    fn test_parse_price_rules() {
        assert_eq!(parse_price("5067,49"), Some(dec!(5067.49)));
        assert_eq!(parse_price("1,234,567"), Some(dec!(1234567)));
        assert_eq!(parse_price("1,234.50"), Some(dec!(1234.5)));
        assert_eq!(parse_price("2365."), Some(dec!(2365)));
        assert_eq!(parse_price("1.2.3"), None);
        assert_eq!(parse_price(","), None);
        assert_eq!(parse_price("0.000"), None);
        assert_eq!(parse_price("abc"), None);
    }

    #[test]
    fn test_parse_price_never_negative_zero() {
        let value = parse_price("0,5").unwrap();
        assert!(value.is_sign_positive());
        assert_eq!(value.to_string(), "0.5");
    }

    #[test]
    fn test_detect_exit() {
        let notice = detect_exit("XAUUSD | TF : M5\n⚠️ CLOSE LONG now").unwrap();
        assert_eq!(notice.direction, Direction::Close);
        assert_eq!(notice.marker, "CLOSE LONG");
        assert_eq!(notice.symbol.as_deref(), Some("XAUUSD"));
        assert_eq!(notice.timeframe.as_deref(), Some("M5"));

        assert!(detect_exit("exit all positions").unwrap().symbol.is_none());
        assert!(detect_exit(XAU_LONG).is_none());
        assert!(detect_exit("Daily recap: no trades today").is_none());
    }

    #[test]
    fn test_normalize_text() {
        let raw = "  XAUUSD  |\tTF : M5 \r\n\r\n ENTRY\u{a0}LONG \n";
        assert_eq!(normalize_text(raw), "XAUUSD | TF : M5\nENTRY LONG");
        assert_eq!(normalize_text(" \n\t "), "");
    }

    proptest! {
        #[test]
        fn prop_text_without_marker_is_rejected(text in "\\PC{0,200}") {
            prop_assume!(!text.to_ascii_uppercase().contains("ENTRY"));
            prop_assert_eq!(extract(&text), Err(Rejection::NoEntryMarker));
        }

        #[test]
        fn prop_extract_is_deterministic(text in "\\PC{0,200}") {
            prop_assert_eq!(extract(&text), extract(&text));
        }

        #[test]
        fn prop_well_formed_alert_round_trips(
            long in any::<bool>(),
            entry_int in 1u32..100_000,
            entry_frac in 0u32..100,
            sl_int in 1u32..100_000,
            tp_int in 1u32..100_000,
            comma_decimal in any::<bool>(),
        ) {
            let sep = if comma_decimal { "," } else { "." };
            let marker = if long { "ENTRY LONG" } else { "ENTRY SHORT" };
            let text = format!(
                "XAUUSD | TF : M5\n{marker}\nEntry: {entry_int}{sep}{entry_frac:02}\nSL: {sl_int}\nTP: {tp_int}"
            );
            let parsed = extract(&text).unwrap();
            let expected_entry = Decimal::from_str(&format!("{entry_int}.{entry_frac:02}")).unwrap();
            prop_assert_eq!(parsed.direction, if long { Direction::Buy } else { Direction::Sell });
            prop_assert_eq!(parsed.entry, expected_entry);
            prop_assert_eq!(parsed.stop_loss, Decimal::from(sl_int));
            prop_assert_eq!(parsed.take_profit, Decimal::from(tp_int));
        }
    }
}
