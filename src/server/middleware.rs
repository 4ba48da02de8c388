use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use log::info;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use super::handlers::ApiError;

pub const ALLOWED_METHODS: &str = "GET,POST,OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type,Authorization";

/// Cross-origin policy: exactly one origin, credentials allowed.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origin: String,
}

impl CorsPolicy {
    pub fn new(allowed_origin: &str) -> Self {
        CorsPolicy {
            allowed_origin: allowed_origin.trim_end_matches('/').to_string(),
        }
    }

    pub fn allows(&self, origin: &HeaderValue) -> bool {
        origin.as_bytes() == self.allowed_origin.as_bytes()
    }

    fn apply(&self, headers: &mut HeaderMap, origin: HeaderValue, preflight: bool) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        if preflight {
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS));
        }
    }
}

pub async fn cors(State(policy): State<Arc<CorsPolicy>>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(ORIGIN)
        .filter(|origin| policy.allows(origin))
        .cloned();

    // Preflights are answered here and never reach the router
    let preflight = request.method() == Method::OPTIONS;
    let mut response = if preflight {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    if let Some(origin) = origin {
        policy.apply(response.headers_mut(), origin, preflight);
    }
    response.headers_mut().append(VARY, HeaderValue::from_static("Origin"));
    response
}

pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

/// Turns a panicking handler into the generic 500 response.
pub async fn catch_panic(request: Request, next: Next) -> Response {
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let detail = format!("request handler panicked: {}", panic_message(panic.as_ref()));
            ApiError::Internal(detail).into_response()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
