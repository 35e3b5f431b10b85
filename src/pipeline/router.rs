//! Route table scoped under a base path.
//!
//! # Responsibilities
//! - Record routes as `base_path + path` (plain concatenation)
//! - Hold router-level guards applied to every route at dispatch time
//! - Give handlers access to the dependency registry once mounted
//!
//! # Design Decisions
//! - No path normalization: `/v1` + `/info` is `/v1/info`, `/v1/` + `/info` is `/v1//info`
//! - Duplicate (method, path) pairs are not rejected here; the dispatcher keeps the last one
//! - Immutable once handed to the dispatcher

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::routing::MethodFilter;

use crate::pipeline::guard::SharedGuard;
use crate::pipeline::handler::{HandlerResult, RouteHandler};
use crate::pipeline::registry::DependencyRegistry;
use crate::pipeline::request::RequestContext;

/// HTTP methods a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
}

impl RouteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }

    pub(crate) fn filter(&self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
        }
    }
}

impl std::fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (method, path) binding to a handler plus its own guards.
#[derive(Clone)]
pub struct Route {
    method: RouteMethod,
    path: String,
    handler: RouteHandler,
    guards: Vec<SharedGuard>,
}

impl Route {
    fn new(method: RouteMethod, path: String, handler: RouteHandler) -> Self {
        Self {
            method,
            path,
            handler,
            guards: Vec::new(),
        }
    }

    /// Append a route-level guard.
    pub fn guard(&mut self, guard: SharedGuard) -> &mut Self {
        self.guards.push(guard);
        self
    }

    /// Append several route-level guards, keeping their order.
    pub fn guards(&mut self, guards: impl IntoIterator<Item = SharedGuard>) -> &mut Self {
        self.guards.extend(guards);
        self
    }

    pub fn method(&self) -> RouteMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler(&self) -> &RouteHandler {
        &self.handler
    }

    pub fn route_guards(&self) -> &[SharedGuard] {
        &self.guards
    }

    pub fn is_body_route(&self) -> bool {
        self.handler.is_body()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("handler", &self.handler)
            .field("guards", &self.guards.len())
            .finish()
    }
}

/// Ordered collection of routes under a common base path.
#[derive(Default)]
pub struct Router {
    base_path: String,
    routes: Vec<Route>,
    guards: Vec<SharedGuard>,
    dependencies: Option<Arc<DependencyRegistry>>,
}

impl Router {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Create a router and run `setup` against it to register routes.
    pub fn build(base_path: impl Into<String>, setup: impl FnOnce(&mut Router)) -> Self {
        let mut router = Self::new(base_path);
        setup(&mut router);
        router
    }

    pub fn get<F, Fut>(&mut self, path: &str, handler: F) -> &mut Route
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.push(RouteMethod::Get, path, RouteHandler::full(handler))
    }

    pub fn post<F, Fut>(&mut self, path: &str, handler: F) -> &mut Route
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.push(RouteMethod::Post, path, RouteHandler::full(handler))
    }

    /// POST route whose handler runs once with the complete request body.
    pub fn post_with_body<F, Fut>(&mut self, path: &str, handler: F) -> &mut Route
    where
        F: Fn(RequestContext, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.push(RouteMethod::Post, path, RouteHandler::body(handler))
    }

    /// Register a prebuilt handler for `method`.
    pub fn route(&mut self, method: RouteMethod, path: &str, handler: RouteHandler) -> &mut Route {
        self.push(method, path, handler)
    }

    /// Append router-level guards. They apply to every route of this router,
    /// including ones registered earlier.
    pub fn use_guards(&mut self, guards: impl IntoIterator<Item = SharedGuard>) -> &mut Self {
        self.guards.extend(guards);
        self
    }

    fn push(&mut self, method: RouteMethod, path: &str, handler: RouteHandler) -> &mut Route {
        let full_path = format!("{}{}", self.base_path, path);
        self.routes.push(Route::new(method, full_path, handler));
        let last = self.routes.len() - 1;
        &mut self.routes[last]
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn guards(&self) -> &[SharedGuard] {
        &self.guards
    }

    /// Registry attached when the router is mounted on a dispatcher.
    pub fn dependencies(&self) -> Option<&Arc<DependencyRegistry>> {
        self.dependencies.as_ref()
    }

    /// Typed lookup through the attached registry.
    pub fn use_dependency<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.dependencies.as_ref()?.get::<T>(key)
    }

    pub(crate) fn attach(&mut self, dependencies: Arc<DependencyRegistry>) {
        self.dependencies = Some(dependencies);
    }

    pub(crate) fn into_parts(self) -> (Vec<Route>, Vec<SharedGuard>) {
        (self.routes, self.guards)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("base_path", &self.base_path)
            .field("routes", &self.routes)
            .field("guards", &self.guards.len())
            .finish()
    }
}
