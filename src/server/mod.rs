//! HTTP surface of the chat backend.
//!
//! `build_router` is what tests drive directly; `serve` binds the configured
//! address and runs until Ctrl-C.

pub mod config;
pub mod handlers;
pub mod middleware;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use axum::Router;
use log::info;
use std::sync::Arc;

pub use config::ServerConfig;
pub use middleware::CorsPolicy;

use crate::store::{MemoryStore, MessageStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MessageStore>,
    pub cors: Arc<CorsPolicy>,
}

impl AppState {
    pub fn new(store: Arc<dyn MessageStore>, allowed_origin: &str) -> Self {
        AppState {
            store,
            cors: Arc::new(CorsPolicy::new(allowed_origin)),
        }
    }

    /// Fresh in-memory store with the given CORS origin
    pub fn in_memory(allowed_origin: &str) -> Self {
        Self::new(Arc::new(MemoryStore::new()), allowed_origin)
    }
}

pub fn build_router(state: AppState) -> Router {
    let chat_routes = Router::new().route(
        "/messages",
        get(handlers::list_messages).post(handlers::post_message),
    );

    // Layers run outermost-last: logging, then CORS, then panic capture
    Router::new()
        .route("/api/health", get(handlers::health))
        .nest("/api/chat", chat_routes)
        .fallback(handlers::not_found)
        .layer(from_fn(middleware::catch_panic))
        .layer(from_fn_with_state(state.cors.clone(), middleware::cors))
        .layer(from_fn(middleware::log_requests))
        .with_state(state)
}

pub async fn serve(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;

    info!("Server is running on http://{}", local);
    info!("API available at http://{}/api", local);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
}
