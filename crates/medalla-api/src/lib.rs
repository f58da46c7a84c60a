//! # medalla-api: HTTP Service for the Medalla Brewery
//!
//! Public catalog (beers, kegs, partner locator, events) and the admin back
//! office (customers, keg rentals) behind one Axum router.
//!
//! ## API Surface
//!
//! | Prefix             | Module                 | Access                      |
//! |--------------------|------------------------|-----------------------------|
//! | `/api/beers/*`     | [`routes::beers`]      | public reads, admin writes  |
//! | `/api/kegs/*`      | [`routes::kegs`]       | public reads, admin writes  |
//! | `/api/partners/*`  | [`routes::partners`]   | public reads, admin writes  |
//! | `/api/events/*`    | [`routes::events`]     | public reads, admin writes  |
//! | `/api/customers/*` | [`routes::customers`]  | admin                       |
//! | `/api/rentals/*`   | [`routes::rentals`]    | admin                       |
//! | `/health/*`, `/metrics` | this module       | public, not rate limited    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! Cors → Trace → AuthMiddleware → RateLimitMiddleware → Metrics (per route) → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Generated by utoipa derive macros, served at `/openapi.json`.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use crate::routes::MessageResponse;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and `/metrics` are mounted outside the auth and rate limit
/// middleware so probes and scrapers never need credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let limiter = RateLimiter::new(RateLimitConfig {
        max_requests: state.config.rate_limit_per_minute,
        window: Duration::from_secs(60),
        ..RateLimitConfig::default()
    });

    let api = Router::new()
        .route("/", get(root))
        .merge(routes::beers::router())
        .merge(routes::kegs::router())
        .merge(routes::partners::router())
        .merge(routes::events::router())
        .merge(routes::customers::router())
        .merge(routes::rentals::router())
        .merge(openapi::router())
        .route_layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(limiter));

    let ops = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(middleware::metrics::metrics_handler));

    Router::new()
        .merge(ops)
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /: Banner.
async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Medalla API is running"))
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 503 while the configured database does not answer.
async fn readiness(State(state): State<AppState>) -> Response {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = db::ping(pool).await {
            tracing::warn!(error = %e, "readiness check failed: database unreachable");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unavailable").into_response();
        }
    }
    "ready".into_response()
}
