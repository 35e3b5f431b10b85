//! Continuation-driven middleware chain.
//!
//! # Data Flow
//! ```text
//! Next { index: 0 } → stages[0].handle(ctx, Next { index: 1 })
//!                   → stages[1].handle(ctx, Next { index: 2 })
//!                   → ...
//!                   → endpoint.call(ctx)   (guards, then handler)
//! ```
//!
//! A middleware proceeds by awaiting `next.run(ctx)`. Returning without
//! calling it short-circuits the request; the returned response is the one
//! sent, and no later middleware, guard or handler runs.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;

use crate::pipeline::request::RequestContext;

/// A processing step run before guards.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, ctx: RequestContext, next: Next) -> Response;
}

/// Shared middleware handle.
pub type SharedMiddleware = Arc<dyn Middleware>;

/// The stage reached once every middleware has called its continuation.
#[async_trait]
pub trait Endpoint: Send + Sync {
    async fn call(&self, ctx: RequestContext) -> Response;
}

/// Continuation for "the remainder of the pipeline".
#[derive(Clone)]
pub struct Next {
    index: usize,
    stages: Arc<[SharedMiddleware]>,
    endpoint: Arc<dyn Endpoint>,
}

impl Next {
    /// Continuation positioned at the first stage.
    pub fn new(stages: Arc<[SharedMiddleware]>, endpoint: Arc<dyn Endpoint>) -> Self {
        Self {
            index: 0,
            stages,
            endpoint,
        }
    }

    /// Number of middleware stages not yet entered.
    pub fn remaining(&self) -> usize {
        self.stages.len().saturating_sub(self.index)
    }

    /// Run the stage at the current index, or the endpoint past the end.
    pub async fn run(self, ctx: RequestContext) -> Response {
        match self.stages.get(self.index).cloned() {
            Some(stage) => {
                let next = Self {
                    index: self.index + 1,
                    stages: self.stages,
                    endpoint: self.endpoint,
                };
                stage.handle(ctx, next).await
            }
            None => self.endpoint.call(ctx).await,
        }
    }
}

/// Middleware backed by an async closure.
pub struct FnMiddleware<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(RequestContext, Next) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send + 'static,
{
    async fn handle(&self, ctx: RequestContext, next: Next) -> Response {
        (self.f)(ctx, next).await
    }
}

/// Wrap an async closure as a shared middleware.
pub fn from_fn<F, Fut>(f: F) -> SharedMiddleware
where
    F: Fn(RequestContext, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(FnMiddleware { f })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::envelope::Envelope;
    use crate::pipeline::registry::DependencyRegistry;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder(Log);

    #[async_trait]
    impl Endpoint for Recorder {
        async fn call(&self, _ctx: RequestContext) -> Response {
            self.0.lock().unwrap().push("endpoint".into());
            Envelope::text("done").into_response()
        }
    }

    fn context() -> RequestContext {
        let (parts, _) = Request::builder().uri("/x").body(()).unwrap().into_parts();
        RequestContext::new(parts, Arc::from("/x"), Arc::new(DependencyRegistry::new()))
    }

    fn passing(log: &Log, name: &'static str) -> SharedMiddleware {
        let log = log.clone();
        from_fn(move |ctx, next: Next| {
            log.lock().unwrap().push(name.to_string());
            next.run(ctx)
        })
    }

    #[tokio::test]
    async fn test_runs_in_order_then_endpoint() {
        let log: Log = Arc::default();
        let stages: Arc<[SharedMiddleware]> = vec![passing(&log, "m1"), passing(&log, "m2")].into();
        let response = Next::new(stages, Arc::new(Recorder(log.clone())))
            .run(context())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*log.lock().unwrap(), vec!["m1", "m2", "endpoint"]);
    }

    #[tokio::test]
    async fn test_short_circuit_stops_chain() {
        let log: Log = Arc::default();
        let blocker = {
            let log = log.clone();
            from_fn(move |_ctx, _next| {
                log.lock().unwrap().push("blocker".into());
                async { Envelope::failure(StatusCode::SERVICE_UNAVAILABLE, "Busy").into_response() }
            })
        };
        let stages: Arc<[SharedMiddleware]> = vec![blocker, passing(&log, "m2")].into();
        let response = Next::new(stages, Arc::new(Recorder(log.clone())))
            .run(context())
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(*log.lock().unwrap(), vec!["blocker"]);
    }

    #[tokio::test]
    async fn test_empty_chain_reaches_endpoint() {
        let log: Log = Arc::default();
        let next = Next::new(Arc::from(Vec::new()), Arc::new(Recorder(log.clone())));
        assert_eq!(next.remaining(), 0);
        next.run(context()).await;
        assert_eq!(*log.lock().unwrap(), vec!["endpoint"]);
    }
}
