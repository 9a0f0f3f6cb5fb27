// src/logging.rs

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `fmt` subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .try_init();
}
