//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router as AxumRouter,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

use routegate::config::ServerConfig;
use routegate::lifecycle::{build_server, Shutdown};
use routegate::{DependencyRegistry, Router, ServerManager};

/// Bind `routers` onto a fresh app with an empty registry.
pub fn app_with(routers: Vec<Router>) -> AxumRouter {
    app_with_registry(ServerConfig::default(), DependencyRegistry::new(), routers)
}

pub fn app_with_registry(
    config: ServerConfig,
    registry: DependencyRegistry,
    routers: Vec<Router>,
) -> AxumRouter {
    let mut server = ServerManager::new(config, registry);
    for router in routers {
        server.add_router(router);
    }
    server.into_router().unwrap()
}

/// Drive one request through `app` and decode the envelope.
pub async fn send(app: AxumRouter, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Serve the built-in server on an ephemeral port.
pub async fn start_server(config: ServerConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();

    tokio::spawn(async move {
        build_server(config).serve(listener, receiver).await.unwrap();
    });

    (addr, shutdown)
}
