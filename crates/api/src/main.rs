//! Trivia CRUD server: `/games` lobby management and the caller's profile,
//! plus the realtime WebSocket endpoint mounted alongside it so both
//! surfaces share one in-process Room Hub — a REST `join_game` call and an
//! already-connected WebSocket session both reach the same per-game actor.

use std::net::SocketAddr;

use tokio::signal;
use tower_http::cors::CorsLayer;

mod auth;
mod config;
mod error;
mod logging;
mod middleware;
mod routes;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let is_production = logging::is_production();
    logging::init_logging(is_production);

    tracing::info!(production = is_production, "starting trivia API server");

    let config = Config::from_env()?;
    tracing::info!("configuration loaded");

    let state = AppState::new(&config).await?;
    let cors = build_cors_layer(&config);

    let realtime_state = trivia_realtime::AppState {
        db: state.db.clone(),
        config: config.realtime_config(),
        hub: state.hub.clone(),
    };

    let app = routes::create_router(state, cors)
        .merge(trivia_realtime::ws_router().with_state(realtime_state));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "trivia API server listening");
    tracing::info!("API docs available at /docs");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("trivia API server shut down gracefully");
    Ok(())
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    use http::{HeaderValue, Method, header};
    use std::time::Duration;

    let origin = config.frontend_url.parse::<HeaderValue>().expect("invalid frontend URL for CORS");

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, starting graceful shutdown"),
        _ = terminate => tracing::info!("received SIGTERM, starting graceful shutdown"),
    }
}
