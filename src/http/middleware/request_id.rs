//! Request ID propagation.
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied `x-request-id` is kept; otherwise a UUID v4 is generated
//! - The ID is echoed on the response

use async_trait::async_trait;
use axum::{http::HeaderValue, response::Response};
use uuid::Uuid;

use crate::pipeline::{Middleware, Next, RequestContext};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID stored in the context extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Access the request ID attached by [`RequestIdMiddleware`].
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl RequestIdExt for RequestContext {
    fn request_id(&self) -> Option<&str> {
        self.extensions().get::<RequestId>().map(|id| id.0.as_str())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RequestIdMiddleware;

#[async_trait]
impl Middleware for RequestIdMiddleware {
    async fn handle(&self, mut ctx: RequestContext, next: Next) -> Response {
        let id = ctx
            .header(X_REQUEST_ID)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        ctx.extensions_mut().insert(RequestId(id.clone()));

        let mut response = next.run(ctx).await;
        if let Ok(value) = HeaderValue::from_str(&id) {
            response.headers_mut().insert(X_REQUEST_ID, value);
        }
        response
    }
}
