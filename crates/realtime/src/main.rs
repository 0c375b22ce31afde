//! Standalone realtime server binary: boots the per-game Round Orchestrator
//! actors, the Room Hub, and the single WebSocket endpoint on their own,
//! without the CRUD surface. `trivia-api`'s own `main` mounts the same
//! library pieces (`trivia_realtime::ws_router`) alongside its REST routes
//! instead of running this binary, so the two surfaces share one Room Hub;
//! this binary exists for running the WebSocket server in isolation.

use std::net::SocketAddr;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trivia_realtime::{Config, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trivia_realtime=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let db = trivia_db::create_pool(&config.database_url).await?;
    tracing::info!("connected to database");

    let state = AppState::new(db, config.clone());

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(trivia_realtime::ws_router())
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("realtime server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

/// Waits for either Ctrl-C or SIGTERM so in-flight connections get a chance
/// to finish instead of being cut off mid-round.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
