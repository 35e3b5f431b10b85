//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → [settings] table seeds store.rs (runtime key/value settings)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; routes are bound once at startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuthConfig, LimitsConfig, ListenerConfig, LoggingConfig, ObservabilityConfig, ServerConfig,
    TimeoutConfig,
};
pub use store::{MemoryStore, SettingsStore};

/// Registry key of the shared [`SettingsStore`].
pub const SETTINGS_KEY: &str = "config";

/// Registry key of the [`AuthConfig`] used by the auth routes.
pub const AUTH_CONFIG_KEY: &str = "auth";
