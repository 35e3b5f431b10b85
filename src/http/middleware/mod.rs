//! Built-in pipeline middleware.

pub mod logger;
pub mod request_id;

pub use logger::LoggerMiddleware;
pub use request_id::{RequestId, RequestIdExt, RequestIdMiddleware, X_REQUEST_ID};
