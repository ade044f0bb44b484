//! Request-handling process binary: HTTP surface, request coordinator,
//! cleanup loop (§4.E, §5).

use std::net::SocketAddr;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use thumbcache_api::cleanup::CleanupLoop;
use thumbcache_api::config::bind_address;
use thumbcache_api::{create_router, metrics, AppState};
use thumbcache_config::AppConfig;

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);
    let env_filter =
        EnvFilter::from_default_env().add_directive("thumbcache=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    info!("starting thumbcache-api");

    let app_config = match AppConfig::load(None) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let addr: SocketAddr = match bind_address(&app_config) {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = %e, "invalid bind address");
            std::process::exit(1);
        }
    };

    let state = match AppState::new(app_config.clone()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to build application state");
            std::process::exit(1);
        }
    };

    let metrics_handle = Some(metrics::init_metrics());
    info!("Prometheus metrics enabled at /metrics");

    let cleanup_loop = CleanupLoop::new(
        state.storage.clone(),
        state.coordinator.clone(),
        app_config.thumbnail_storage.clone(),
    );
    tokio::spawn(cleanup_loop.run());

    let app = create_router(state, metrics_handle);

    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    info!("server shutdown complete");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C handler");
    info!("received shutdown signal");
}
