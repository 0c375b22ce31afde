//! Rate limiting middleware, in-process via `governor` rather than Redis —
//! this server owns the whole Room Hub in one process, so there's no shared
//! counter to keep consistent across instances (mirrors the same tradeoff
//! `trivia-realtime`'s own rate limiter makes for WebSocket actions).

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Extension;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::middleware::client_ip::{ClientIpConfig, extract_client_ip};

type IpLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared across every request; requests aren't partitioned by IP (a keyed
/// limiter would need its own eviction policy, overkill at this surface's
/// scale).
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<IpLimiter>,
}

impl RateLimitLayer {
    pub fn new(requests_per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap());
        Self { limiter: Arc::new(RateLimiter::direct(quota)) }
    }
}

pub async fn rate_limit(Extension(layer): Extension<RateLimitLayer>, request: Request<Body>, next: Next) -> Response {
    let config = ClientIpConfig::default();
    let ip = extract_client_ip(&request, &config);

    if layer.limiter.check().is_err() {
        tracing::warn!(ip = %ip, path = %request.uri().path(), "rate limit exceeded");
        return rate_limit_response();
    }

    next.run(request).await
}

fn rate_limit_response() -> Response {
    let body = serde_json::json!({ "error": "Too many requests, please slow down" });
    (StatusCode::TOO_MANY_REQUESTS, axum::Json(body)).into_response()
}
