//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Token and login settings.
    pub auth: AuthConfig,

    /// Log filter and format.
    pub logging: LoggingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Initial contents of the settings store.
    pub settings: BTreeMap<String, serde_json::Value>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for the whole pipeline of one request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum buffered body size for body routes, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Token service and login configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for issued tokens.
    pub token_secret: String,

    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,

    /// Cookie carrying the access token.
    pub cookie_name: String,

    /// Password accepted by the login route.
    pub login_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: "change-me".to_string(),
            token_ttl_secs: 3600,
            cookie_name: "accessToken".to_string(),
            login_password: "supersecret".to_string(),
        }
    }
}

/// Logging configuration. `RUST_LOG` takes precedence over `filter`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,

    /// Emit JSON lines instead of the human-readable format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "routegate=debug,tower_http=debug".to_string(),
            json: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Expose a Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Address of the scrape endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
