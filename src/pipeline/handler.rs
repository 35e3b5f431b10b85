//! Route handler types.
//!
//! Handlers return `Result<Envelope, PipelineError>`. Body handlers receive the
//! fully buffered request body alongside the context; the transport has
//! already reassembled any chunking.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;

use crate::pipeline::envelope::Envelope;
use crate::pipeline::error::PipelineError;
use crate::pipeline::request::RequestContext;

/// What every handler produces.
pub type HandlerResult = Result<Envelope, PipelineError>;

/// Handler for routes that do not consume the request body.
pub type RequestHandler =
    Arc<dyn Fn(RequestContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Handler for routes that run once the full body has arrived.
pub type BodyHandler =
    Arc<dyn Fn(RequestContext, Bytes) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// The handler attached to a route. Exactly one kind per route.
#[derive(Clone)]
pub enum RouteHandler {
    Full(RequestHandler),
    Body(BodyHandler),
}

impl RouteHandler {
    pub fn full<F, Fut>(f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::Full(Arc::new(move |ctx| Box::pin(f(ctx))))
    }

    pub fn body<F, Fut>(f: F) -> Self
    where
        F: Fn(RequestContext, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::Body(Arc::new(move |ctx, body| Box::pin(f(ctx, body))))
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Self::Body(_))
    }

    pub fn invoke(&self, mut ctx: RequestContext) -> BoxFuture<'static, HandlerResult> {
        match self {
            Self::Full(handler) => handler(ctx),
            Self::Body(handler) => {
                let body = ctx.take_body();
                handler(ctx, body)
            }
        }
    }
}

impl std::fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full(_) => f.write_str("RouteHandler::Full"),
            Self::Body(_) => f.write_str("RouteHandler::Body"),
        }
    }
}

/// Decode a JSON request body. Malformed input is a 400 "Invalid JSON body".
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, PipelineError> {
    Ok(serde_json::from_slice(body)?)
}
