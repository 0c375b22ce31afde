//! The CRUD surface's routes.

use axum::Router;
use axum::middleware as axum_middleware;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::middleware::{RateLimitLayer, rate_limit, security_headers};
use crate::state::AppState;

pub mod games;
pub mod health;
pub mod profile;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        profile::get_profile,
        games::create_game,
        games::list_open_games,
        games::recent_states,
        games::join_game,
        games::unjoin_game,
        games::delete_game,
    ),
    components(schemas(
        health::HealthResponse,
        trivia_protocol::rest::ProfileResponse,
        trivia_protocol::rest::CreateGameRequest,
        trivia_protocol::rest::GameSummary,
        trivia_protocol::rest::GameListResponse,
        trivia_protocol::rest::MessageResponse,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "profile", description = "Caller profile"),
        (name = "games", description = "Game lobby and membership"),
    ),
    info(title = "Trivia API", version = "0.1.0", description = "Trivia game CRUD surface")
)]
pub struct ApiDoc;

pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    let api_routes = Router::new().nest("/games", games::router()).route(
        "/profile",
        axum::routing::get(profile::get_profile),
    );

    let app = Router::new()
        .route("/health", axum::routing::get(health::health_check))
        .nest("/api/v1", api_routes)
        .with_state(state)
        .layer(axum_middleware::from_fn(security_headers));

    let docs = Scalar::with_url("/docs", ApiDoc::openapi());

    let rate_limiter = RateLimitLayer::new(120);

    app.merge(docs)
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(rate_limit))
        .layer(axum::Extension(rate_limiter))
        .layer(cors)
}
