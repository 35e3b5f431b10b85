//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → axum/hyper (HTTP parsing, body reassembly)
//!     → server.rs (route binding, per-request pipeline)
//!     → middleware/ (request ID, logging)
//!     → pipeline guards and handler
//!     → Envelope serialized back through axum
//! ```

pub mod middleware;
pub mod server;

pub use middleware::{LoggerMiddleware, RequestId, RequestIdExt, RequestIdMiddleware, X_REQUEST_ID};
pub use server::{DispatchError, ServerManager};
