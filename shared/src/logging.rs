//! Tracing subscriber setup shared by the `api` and `bot` binaries.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the level is `info`, or `debug` when
/// `DEBUG_LOG=true`. `LOG_FORMAT=json` switches to one JSON object per line.
pub fn init_tracing() {
    let debug = std::env::var("DEBUG_LOG")
        .map(|v| v == "true")
        .unwrap_or(false);
    let default_directive = if debug { "debug" } else { "info" };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_current_span(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
