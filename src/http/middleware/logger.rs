//! Request logging middleware.

use std::time::Instant;

use async_trait::async_trait;
use axum::response::Response;

use crate::http::middleware::request_id::RequestIdExt;
use crate::pipeline::{Middleware, Next, RequestContext};

/// Logs every request URL, then its status and latency once the rest of the
/// pipeline has answered.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggerMiddleware;

#[async_trait]
impl Middleware for LoggerMiddleware {
    async fn handle(&self, ctx: RequestContext, next: Next) -> Response {
        let start = Instant::now();
        let method = ctx.method().clone();
        let url = ctx.uri().to_string();
        let request_id = ctx.request_id().unwrap_or("unknown").to_string();

        tracing::info!(
            request_id = %request_id,
            method = %method,
            url = %url,
            "Request received"
        );

        let response = next.run(ctx).await;

        tracing::info!(
            request_id = %request_id,
            method = %method,
            url = %url,
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }
}
