//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be > 0"));
    }

    if config.auth.token_secret.is_empty() {
        errors.push(ValidationError::new("auth.token_secret", "must not be empty"));
    }

    if config.auth.token_ttl_secs == 0 {
        errors.push(ValidationError::new("auth.token_ttl_secs", "must be > 0"));
    }

    if config.auth.cookie_name.is_empty() || config.auth.cookie_name.contains(['=', ';', ' ']) {
        errors.push(ValidationError::new(
            "auth.cookie_name",
            "must be a non-empty cookie token",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.auth.token_secret.clear();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["listener.bind_address", "timeouts.request_secs", "auth.token_secret"]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ServerConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
