//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured filter

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Resolve the filter: environment first, then config.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(config: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(build_filter(config));
    if config.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
