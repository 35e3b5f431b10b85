//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → auth_guard.rs (Bearer header or access-token cookie)
//!     → token.rs (signature + expiry check via the registered TokenService)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing or unverifiable token is always 401
//! - The token service is looked up in the dependency registry, never captured
//!   at construction

pub mod auth_guard;
pub mod token;

pub use auth_guard::AuthGuard;
pub use token::{Claims, JwtTokenService, TokenError, TokenService};

/// Registry key of the shared [`TokenService`].
pub const TOKEN_SERVICE_KEY: &str = "token";
