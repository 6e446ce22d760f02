//! HTTP entrypoint for the shiftplan solver service.
//!
//! Run with: cargo run -p shiftplan-service
//! Configuration is read from shiftplan.toml when present.

use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod api;
mod config;


use config::ServiceConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::load("shiftplan.toml").unwrap_or_default();

    // CORS for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router().layer(cors);

    tracing::info!(addr = %config.bind, service = api::SERVICE_NAME, "listening");
    let listener = tokio::net::TcpListener::bind(config.bind).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
