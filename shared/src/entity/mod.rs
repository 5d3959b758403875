pub mod signal_events;
pub mod trade_signals;
