// Common test utilities for integration tests
// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Once};

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use log::{info, LevelFilter};
use serde_json::Value;
use tower::ServiceExt;

use duochat::models::Message;
use duochat::server::{build_router, AppState};
use duochat::store::{Clock, MemoryStore, MessageStore};

pub const TEST_ORIGIN: &str = "http://localhost:5173";

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .init();
    });
}

pub fn ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid RFC 3339 timestamp")
        .with_timezone(&Utc)
}

pub fn fixed_clock(raw: &str) -> Clock {
    let fixed = ts(raw);
    Arc::new(move || fixed)
}

pub fn msg(id: u64, sender: &str, timestamp: &str) -> Message {
    Message {
        id,
        text: format!("message {}", id),
        sender: sender.to_string(),
        timestamp: ts(timestamp),
    }
}

/// Router over a fresh in-memory store
pub fn test_router() -> Router {
    setup_logging();
    build_router(AppState::in_memory(TEST_ORIGIN))
}

pub fn router_with_store(store: Arc<dyn MessageStore>) -> Router {
    setup_logging();
    build_router(AppState::new(store, TEST_ORIGIN))
}

pub fn router_with_clock(clock: Clock) -> Router {
    router_with_store(Arc::new(MemoryStore::with_clock(clock)))
}

/// Drive one request through the router and decode the JSON body (Null when empty)
pub async fn call(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is JSON")
    };
    (status, headers, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn messages_of(body: &Value) -> Vec<Message> {
    serde_json::from_value(body.clone()).expect("body is a message array")
}

/// Serve a fresh app on an ephemeral port and return the API base URL
pub async fn spawn_server() -> (SocketAddr, String) {
    let app = test_router();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    info!("Test server listening on {}", addr);
    (addr, format!("http://{}/api", addr))
}
