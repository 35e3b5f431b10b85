//! Built-in routers.
//!
//! Each module exposes a `router` constructor returning a [`Router`] ready to
//! be mounted with [`ServerManager::add_router`](crate::http::ServerManager::add_router).

pub mod auth;
pub mod info;
pub mod status;

use crate::config::ServerConfig;
use crate::pipeline::Router;

/// Every built-in router, in mount order.
pub fn all_routers(config: &ServerConfig) -> Vec<Router> {
    vec![
        info::router(),
        auth::router(&config.auth.cookie_name),
        status::router(&config.auth.cookie_name),
    ]
}
