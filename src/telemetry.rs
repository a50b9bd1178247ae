//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,session=debug,sync=debug,tower_http=info").
//! - LOG_FORMAT selects "pretty" (default), "compact" or "json".
//!
//! Targets used by this crate: `reflex` (startup, store), `bank` (generation and
//! loading), `sync`, and `session` (per-connection quiz flow).

use tracing_subscriber::EnvFilter;

/// Filter used when LOG_LEVEL is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info,reflex=debug,bank=info,sync=info,session=info,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    /// Unknown values fall back to `Pretty`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            Some("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Each format is its own subscriber type.
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.init(),
    }
}
