use clap::Parser;
use log::LevelFilter;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";
/// Value of `DUOCHAT_ENV` that keeps the server from binding a port
pub const TEST_ENVIRONMENT: &str = "test";

/// Command line and environment configuration for the chat server
#[derive(Parser, Debug, Clone)]
#[command(
    name = "duochat-server",
    version,
    about = "In-memory HTTP backend for the duochat demo."
)]
pub struct ServerConfig {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "DUOCHAT_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// The only origin allowed to call the API with credentials
    #[arg(long, env = "DUOCHAT_ALLOWED_ORIGIN", default_value = DEFAULT_ALLOWED_ORIGIN)]
    pub allowed_origin: String,

    #[arg(long, env = "DUOCHAT_LOG", default_value = "info")]
    pub log_level: LevelFilter,

    /// Deployment environment; "test" suppresses auto-listen
    #[arg(long, env = "DUOCHAT_ENV", default_value = "development")]
    pub environment: String,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn auto_listen(&self) -> bool {
        self.environment != TEST_ENVIRONMENT
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: DEFAULT_PORT,
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            log_level: LevelFilter::Info,
            environment: "development".to_string(),
        }
    }
}
