//! Routegate: a request pipeline for small embedded-style HTTP APIs.
//!
//! Routers group routes under a base path; every request runs through global
//! middleware, then router guards, then route guards, then its handler, and
//! always comes back as a JSON envelope.

// Core subsystems
pub mod config;
pub mod http;
pub mod pipeline;
pub mod routes;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ServerConfig;
pub use http::ServerManager;
pub use lifecycle::Shutdown;
pub use pipeline::{DependencyRegistry, Envelope, PipelineError, Router};
