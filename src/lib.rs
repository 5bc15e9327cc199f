pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod error;
pub mod jwt;
pub mod revocation;
pub mod server_config;
pub mod upload;
pub mod validation;

use api::create_api_router;
use auth::AuthBackend;
use axum::Router;
use revocation::{InMemoryRevocations, SessionRevocation};
use server_config::AuthSettings;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Prefix for every API route.
pub const API_PREFIX: &str = "/api/v1";

pub struct ServerConfig {
    /// Token, cookie and environment settings
    pub settings: AuthSettings,
    /// Store of spent and logged-out refresh tokens
    pub revocations: Arc<dyn SessionRevocation>,
}

impl ServerConfig {
    /// Config with a process-local revocation store.
    pub fn new(settings: AuthSettings) -> Self {
        Self {
            settings,
            revocations: Arc::new(InMemoryRevocations::new()),
        }
    }
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let auth = Arc::new(AuthBackend::new(
        &config.settings,
        config.revocations.clone(),
    ));

    Router::new().nest(API_PREFIX, create_api_router(auth))
}

/// Run cleanup once and spawn the background scheduler.
/// Call this before starting the server.
pub fn init_cleanup(revocations: &Arc<dyn SessionRevocation>) {
    cleanup::run_cleanup(revocations.as_ref());
    cleanup::spawn_cleanup_scheduler(revocations.clone());
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to run cleanup on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
