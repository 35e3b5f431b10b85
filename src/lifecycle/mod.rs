//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Dependency registry → ServerManager (middleware + routers)
//!
//! Shutdown (shutdown.rs):
//!     Trigger → broadcast to subscribers → server stops accepting → drain
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then dependencies, then routes
//! - Listener binds last (traffic only when routes are bound)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
pub use startup::{build_registry, build_server};
