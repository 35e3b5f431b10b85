//! Per-request context handed through middleware, guards and handlers.
//!
//! # Responsibilities
//! - Expose method, URL, headers, query parameters and cookies
//! - Carry the matched route path for logging and metrics
//! - Give read-only access to the dependency registry
//! - Hold typed extensions so middleware can pass values downstream

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    body::{Body, Bytes},
    extract::Query,
    http::{request::Parts, Extensions, HeaderMap, Method, Uri},
};

use crate::pipeline::registry::DependencyRegistry;

/// Everything the pipeline knows about an inbound request.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    query: HashMap<String, String>,
    route: Arc<str>,
    dependencies: Arc<DependencyRegistry>,
    extensions: Extensions,
    body: Bytes,
    pending: Mutex<Option<Body>>,
}

impl RequestContext {
    /// Build a context from request parts delivered by the transport.
    pub fn new(parts: Parts, route: Arc<str>, dependencies: Arc<DependencyRegistry>) -> Self {
        let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default();

        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            query,
            route,
            dependencies,
            extensions: parts.extensions,
            body: Bytes::new(),
            pending: Mutex::new(None),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// The registered route pattern this request was dispatched to.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Header value as a string. Non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Value of the cookie `name` from the `Cookie` header.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(axum::http::header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Token from an `Authorization: Bearer <token>` header.
    pub fn bearer_token(&self) -> Option<&str> {
        self.header("authorization")
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Buffered body. Empty unless the route consumes the body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }

    pub fn take_body(&mut self) -> Bytes {
        std::mem::take(&mut self.body)
    }

    /// Park the unread transport body until the endpoint buffers it.
    pub(crate) fn set_pending_body(&mut self, body: Body) {
        if let Ok(slot) = self.pending.get_mut() {
            *slot = Some(body);
        }
    }

    pub(crate) fn take_pending_body(&mut self) -> Option<Body> {
        self.pending.get_mut().ok().and_then(Option::take)
    }

    pub fn dependencies(&self) -> &DependencyRegistry {
        &self.dependencies
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}
