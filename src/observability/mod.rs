//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through logs via the request-id middleware
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
