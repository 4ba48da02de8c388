use anyhow::Result;
use clap::Parser;
use log::info;

use duochat::server::{self, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    env_logger::Builder::new()
        .filter_level(config.log_level)
        .parse_default_env()
        .init();

    let state = AppState::in_memory(&config.allowed_origin);
    info!("CORS allowed origin: {}", config.allowed_origin);

    if !config.auto_listen() {
        // Test harnesses drive the router themselves
        info!(
            "DUOCHAT_ENV={}, not listening on {}",
            config.environment,
            config.addr()
        );
        let _router = server::build_router(state);
        return Ok(());
    }

    server::serve(&config, state).await?;
    info!("Server stopped");
    Ok(())
}
