//! Dispatcher: binds routes onto axum and runs the per-request pipeline.
//!
//! # Responsibilities
//! - Collect global middleware and routers during startup
//! - Attach the dependency registry to every mounted router
//! - Bind each (method, path) onto the axum router exactly once, as a literal path
//! - Run middleware → body buffering → router guards → route guards → handler
//! - Turn every outcome (envelope, error, panic, timeout) into one response

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes, HttpBody},
    extract::Request,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Router as AxumRouter,
};
use futures_util::FutureExt;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::observability::metrics;
use crate::pipeline::{
    guard::check_guards, DependencyRegistry, Endpoint, Envelope, Next, PipelineError,
    RequestContext, Route, RouteMethod, Router, SharedGuard, SharedMiddleware,
};

/// Errors raised while binding or serving.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("route path must start with '/': {method} '{path}'")]
    InvalidPath { method: RouteMethod, path: String },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Owns middleware, routers and the dependency registry until bind time.
pub struct ServerManager {
    config: ServerConfig,
    dependencies: Arc<DependencyRegistry>,
    middlewares: Vec<SharedMiddleware>,
    routers: Vec<Router>,
}

impl ServerManager {
    /// The registry is frozen from here on: it is only reachable through `Arc`.
    pub fn new(config: ServerConfig, dependencies: DependencyRegistry) -> Self {
        Self {
            config,
            dependencies: Arc::new(dependencies),
            middlewares: Vec::new(),
            routers: Vec::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn dependencies(&self) -> &DependencyRegistry {
        &self.dependencies
    }

    /// Append a global middleware. Runs for every route, in registration order.
    pub fn use_middleware(&mut self, middleware: SharedMiddleware) -> &mut Self {
        self.middlewares.push(middleware);
        tracing::info!(count = self.middlewares.len(), "Middleware added");
        self
    }

    /// Mount a router. Its routes are bound when the manager is turned into a router.
    pub fn add_router(&mut self, mut router: Router) -> &mut Self {
        router.attach(self.dependencies.clone());
        tracing::info!(
            base_path = %router.base_path(),
            routes = router.routes().len(),
            guards = router.guards().len(),
            "Router mounted"
        );
        for route in router.routes() {
            tracing::info!(method = %route.method(), path = %route.path(), "  route");
        }
        self.routers.push(router);
        self
    }

    pub fn routers(&self) -> &[Router] {
        &self.routers
    }

    /// Bind every route. Consumes the manager, so nothing can be added afterwards.
    pub fn into_router(self) -> Result<AxumRouter, DispatchError> {
        let settings = Arc::new(DispatchSettings {
            dependencies: self.dependencies,
            max_body_bytes: self.config.limits.max_body_bytes,
            request_timeout: Duration::from_secs(self.config.timeouts.request_secs),
        });
        let stages: Arc<[SharedMiddleware]> = self.middlewares.into();

        let mut table: Vec<Arc<RouteEndpoint>> = Vec::new();
        for router in self.routers {
            let (routes, guards) = router.into_parts();
            let router_guards: Arc<[SharedGuard]> = guards.into();
            for route in routes {
                if !route.path().starts_with('/') {
                    return Err(DispatchError::InvalidPath {
                        method: route.method(),
                        path: route.path().to_string(),
                    });
                }
                let endpoint = Arc::new(RouteEndpoint::new(
                    route,
                    router_guards.clone(),
                    settings.max_body_bytes,
                ));
                match table.iter_mut().find(|e| e.same_binding(&endpoint)) {
                    Some(slot) => {
                        tracing::warn!(
                            method = %endpoint.route.method(),
                            path = %endpoint.route.path(),
                            "Duplicate route, last registration wins"
                        );
                        *slot = endpoint;
                    }
                    None => table.push(endpoint),
                }
            }
        }

        let mut bindings: Vec<(String, Vec<Pipeline>)> = Vec::new();
        for endpoint in table {
            let path = endpoint.route.path().to_string();
            let pipeline = Pipeline {
                stages: stages.clone(),
                endpoint,
                settings: settings.clone(),
            };
            match bindings.iter_mut().find(|(p, _)| *p == path) {
                Some((_, pipelines)) => pipelines.push(pipeline),
                None => bindings.push((path, vec![pipeline])),
            }
        }

        let mut app = AxumRouter::new().without_v07_checks();
        for (path, pipelines) in bindings {
            let mut method_router = MethodRouter::new();
            for pipeline in pipelines {
                let filter = pipeline.endpoint.route.method().filter();
                method_router = method_router.on(filter, move |request: Request| {
                    let pipeline = pipeline.clone();
                    async move { pipeline.dispatch(request).await }
                });
            }
            tracing::debug!(path = %path, "Route bound");
            app = app.route(&literal_path(&path), method_router.fallback(method_not_allowed));
        }

        Ok(app.fallback(not_found).layer(TraceLayer::new_for_http()))
    }

    /// Bind routes and serve until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), DispatchError> {
        let addr = listener.local_addr()?;
        let app = self.into_router()?;

        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Values every bound route needs at request time.
struct DispatchSettings {
    dependencies: Arc<DependencyRegistry>,
    max_body_bytes: usize,
    request_timeout: Duration,
}

/// Body buffering, guards and handler for one bound route.
struct RouteEndpoint {
    route: Route,
    path: Arc<str>,
    router_guards: Arc<[SharedGuard]>,
    max_body_bytes: usize,
}

impl RouteEndpoint {
    fn new(route: Route, router_guards: Arc<[SharedGuard]>, max_body_bytes: usize) -> Self {
        Self {
            path: Arc::from(route.path()),
            route,
            router_guards,
            max_body_bytes,
        }
    }

    async fn run(&self, mut ctx: RequestContext) -> Result<Envelope, PipelineError> {
        if self.route.is_body_route() {
            let body = ctx.take_pending_body().unwrap_or_else(Body::empty);
            let bytes = read_body(&ctx, body, self.max_body_bytes).await?;
            ctx.set_body(bytes);
        }

        let guarded = match check_guards(&self.router_guards, &ctx).await {
            Ok(()) => check_guards(self.route.route_guards(), &ctx).await,
            Err(err) => Err(err),
        };
        if let Err(err) = guarded {
            metrics::record_guard_rejection(&self.path);
            return Err(err);
        }

        self.route.handler().invoke(ctx).await
    }

    fn same_binding(&self, other: &RouteEndpoint) -> bool {
        self.route.method() == other.route.method() && self.route.path() == other.route.path()
    }
}

#[async_trait]
impl Endpoint for RouteEndpoint {
    async fn call(&self, ctx: RequestContext) -> Response {
        match self.run(ctx).await {
            Ok(envelope) => envelope.into_response(),
            Err(err) => {
                tracing::debug!(
                    route = %self.path,
                    status = %err.status(),
                    error = %err.message(),
                    "Request failed"
                );
                err.into_envelope().into_response()
            }
        }
    }
}

/// Per-binding state captured by the axum handler closure.
#[derive(Clone)]
struct Pipeline {
    stages: Arc<[SharedMiddleware]>,
    endpoint: Arc<RouteEndpoint>,
    settings: Arc<DispatchSettings>,
}

impl Pipeline {
    async fn dispatch(self, request: Request) -> Response {
        let start = Instant::now();
        let method = self.endpoint.route.method();
        let route = self.endpoint.path.clone();

        let (parts, body) = request.into_parts();
        let mut ctx = RequestContext::new(parts, route.clone(), self.settings.dependencies.clone());
        if self.endpoint.route.is_body_route() {
            ctx.set_pending_body(body);
        }

        let endpoint: Arc<dyn Endpoint> = self.endpoint;
        let chain = std::panic::AssertUnwindSafe(Next::new(self.stages, endpoint).run(ctx));

        let timeout = self.settings.request_timeout;
        let response = match tokio::time::timeout(timeout, chain.catch_unwind()).await {
            Ok(Ok(response)) => response,
            Ok(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(route = %route, panic = %message, "Handler panicked");
                PipelineError::internal(message).into_envelope().into_response()
            }
            Err(_) => {
                tracing::warn!(route = %route, timeout = ?timeout, "Request timed out");
                Envelope::failure(StatusCode::REQUEST_TIMEOUT, "Request timeout").into_response()
            }
        };

        metrics::record_request(method.as_str(), &route, response.status().as_u16(), start);
        response
    }
}

/// Buffer the complete body; chunk boundaries are invisible past this point.
///
/// A body known to exceed `limit` up front, from `Content-Length` or the
/// body's own size hint, is answered with 413. Overflow discovered while
/// streaming is a read failure (400).
async fn read_body(ctx: &RequestContext, body: Body, limit: usize) -> Result<Bytes, PipelineError> {
    let declared = ctx
        .header(header::CONTENT_LENGTH.as_str())
        .and_then(|v| v.parse::<u64>().ok());
    let known = declared.unwrap_or(0).max(body.size_hint().lower());
    if known > limit as u64 {
        return Err(PipelineError::validation(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Payload too large",
        ));
    }

    axum::body::to_bytes(body, limit).await.map_err(|e| {
        tracing::debug!(route = %ctx.route(), error = %e, "Failed to read request body");
        PipelineError::bad_request("Failed to read request body")
    })
}

/// Escape `{` and `}` so axum binds the path verbatim instead of as a capture.
fn literal_path(path: &str) -> String {
    path.replace('{', "{{").replace('}', "}}")
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown error".to_string()
    }
}

async fn not_found() -> Envelope {
    Envelope::failure(StatusCode::NOT_FOUND, "Not found")
}

async fn method_not_allowed() -> Envelope {
    Envelope::failure(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "Unknown error");
    }

    #[test]
    fn test_relative_path_is_rejected() {
        let mut router = Router::new("");
        router.get("info", |_ctx| async { Ok(Envelope::text("x")) });

        let mut server = ServerManager::new(ServerConfig::default(), DependencyRegistry::new());
        server.add_router(router);
        let err = server.into_router().unwrap_err();
        assert!(matches!(err, DispatchError::InvalidPath { .. }));
    }

    #[test]
    fn test_literal_path_escapes_braces() {
        assert_eq!(literal_path("/files/{name}"), "/files/{{name}}");
        assert_eq!(literal_path("/a/:id"), "/a/:id");
        assert_eq!(literal_path("/a/*"), "/a/*");
    }

    #[test]
    fn test_legacy_capture_syntax_binds() {
        let router = Router::build("/a", |r| {
            r.get("/:id", |_ctx| async { Ok(Envelope::text("colon")) });
            r.get("/*", |_ctx| async { Ok(Envelope::text("star")) });
            r.get("/{id}", |_ctx| async { Ok(Envelope::text("brace")) });
        });
        let mut server = ServerManager::new(ServerConfig::default(), DependencyRegistry::new());
        server.add_router(router);
        assert!(server.into_router().is_ok());
    }

    #[test]
    fn test_add_router_attaches_registry() {
        let mut registry = DependencyRegistry::new();
        registry.set("answer", Arc::new(42u32));
        let mut server = ServerManager::new(ServerConfig::default(), registry);
        server.add_router(Router::new("/v1"));
        assert_eq!(*server.routers()[0].use_dependency::<u32>("answer").unwrap(), 42);
    }
}
