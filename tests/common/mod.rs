//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use server_runner::{RunnerConfig, ServerRunner, Shutdown};
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Send one request through `router` and decode the JSON body.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Config for tests: loopback listener, small body limit.
pub fn test_config() -> RunnerConfig {
    let mut config = RunnerConfig::default();
    config.listener.bind_addresses = vec!["127.0.0.1:0".to_string()];
    config.limits.max_body_bytes = 64 * 1024;
    config
}

/// Serve `runner` on `count` ephemeral ports; returns their addresses.
pub async fn spawn_runner(runner: ServerRunner, count: usize, shutdown: Shutdown) -> Vec<SocketAddr> {
    let mut listeners = Vec::new();
    let mut addrs = Vec::new();
    for _ in 0..count {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        addrs.push(listener.local_addr().unwrap());
        listeners.push(listener);
    }

    tokio::spawn(async move {
        let _ = runner.serve(listeners, shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    addrs
}

/// A client that never reuses connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
