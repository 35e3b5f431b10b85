//! Request-dispatch pipeline.
//!
//! # Data Flow
//! ```text
//! transport delivers request
//!     → middleware.rs (stages in registration order, each calls Next)
//!     → body routes buffer the full body (size limit applies)
//!     → guard.rs (router guards, then route guards; first rejection wins)
//!     → handler.rs (returns Envelope or PipelineError)
//!     → envelope.rs (serialize to { "ok": ..., "data" | "error": ... })
//!     → transport sends exactly one response
//! ```
//!
//! # Design Decisions
//! - Routes, guards and middleware are fixed once the dispatcher binds
//! - Shared services come from a typed registry, never from globals
//! - Handlers return `Result<Envelope, PipelineError>`; nothing unwinds on purpose

pub mod envelope;
pub mod error;
pub mod guard;
pub mod handler;
pub mod middleware;
pub mod registry;
pub mod request;
pub mod router;

pub use envelope::{Envelope, Payload};
pub use error::PipelineError;
pub use guard::{Guard, SharedGuard};
pub use handler::{parse_json, HandlerResult, RouteHandler};
pub use middleware::{Endpoint, Middleware, Next, SharedMiddleware};
pub use registry::DependencyRegistry;
pub use request::RequestContext;
pub use router::{Route, RouteMethod, Router};
