//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Route every diagnostic to stderr
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - stdout is reserved for the banner, access lines and shutdown notices
//! - Log level configurable via config and `RUST_LOG`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directives(level: &str) -> String {
    let level = level.to_ascii_lowercase();
    format!("hello_responder={level},tower_http={level}")
}

/// Install the global subscriber. Must be called once, before anything logs.
pub fn init(config: &ObservabilityConfig) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(&config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
