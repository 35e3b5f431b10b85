//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the dependency registry from configuration
//! - Register global middleware and the built-in routers
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The registry is complete before the first router is mounted

use std::sync::Arc;
use std::time::Duration;

use crate::config::{MemoryStore, ServerConfig, SettingsStore, AUTH_CONFIG_KEY, SETTINGS_KEY};
use crate::http::middleware::{LoggerMiddleware, RequestIdMiddleware};
use crate::http::ServerManager;
use crate::pipeline::DependencyRegistry;
use crate::routes;
use crate::security::{JwtTokenService, TokenService, TOKEN_SERVICE_KEY};

/// Shared services handlers reach through the registry.
pub fn build_registry(config: &ServerConfig) -> DependencyRegistry {
    let mut registry = DependencyRegistry::new();

    let store: Arc<dyn SettingsStore> = Arc::new(MemoryStore::from_settings(&config.settings));
    registry.set::<dyn SettingsStore>(SETTINGS_KEY, store);

    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(
        &config.auth.token_secret,
        Duration::from_secs(config.auth.token_ttl_secs),
    ));
    registry.set::<dyn TokenService>(TOKEN_SERVICE_KEY, tokens);

    registry.set(AUTH_CONFIG_KEY, Arc::new(config.auth.clone()));

    tracing::debug!(dependencies = registry.len(), "Dependency registry built");
    registry
}

/// A server with request-id and logging middleware and every built-in router.
pub fn build_server(config: ServerConfig) -> ServerManager {
    let registry = build_registry(&config);
    let routers = routes::all_routers(&config);

    let mut server = ServerManager::new(config, registry);
    server
        .use_middleware(Arc::new(RequestIdMiddleware))
        .use_middleware(Arc::new(LoggerMiddleware));
    for router in routers {
        server.add_router(router);
    }
    server
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;

    #[test]
    fn test_registry_has_builtin_services() {
        let registry = build_registry(&ServerConfig::default());
        assert!(registry.get::<dyn SettingsStore>(SETTINGS_KEY).is_some());
        assert!(registry.get::<dyn TokenService>(TOKEN_SERVICE_KEY).is_some());
        assert_eq!(
            registry.get::<AuthConfig>(AUTH_CONFIG_KEY).unwrap().cookie_name,
            "accessToken"
        );
    }

    #[test]
    fn test_settings_seeded_from_config() {
        let mut config = ServerConfig::default();
        config
            .settings
            .insert("isReady".into(), serde_json::Value::Bool(true));
        let registry = build_registry(&config);
        let store = registry.get::<dyn SettingsStore>(SETTINGS_KEY).unwrap();
        assert_eq!(store.get("isReady"), Some(serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_server_mounts_builtin_routers() {
        let server = build_server(ServerConfig::default());
        let paths: Vec<&str> = server
            .routers()
            .iter()
            .flat_map(|r| r.routes())
            .map(|r| r.path())
            .collect();
        assert!(paths.contains(&"/v1/info"));
        assert!(paths.contains(&"/auth/login"));
        assert!(paths.contains(&"/status/wizard"));
    }
}
