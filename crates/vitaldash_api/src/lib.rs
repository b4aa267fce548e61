//! HTTP surface for the vitaldash health engine.
//!
//! The router is a thin layer over [`vitaldash_engine`]: identity comes from
//! the gateway-injected `x-user-id` header, query parameters are coerced to
//! defaults, and every store failure maps to one generic 500.

use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tower_http::timeout::TimeoutLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use config::Config;
pub use state::AppState;

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/dashboard/overview", get(handlers::overview))
        .route("/api/dashboard/body-metrics", get(handlers::body_metrics))
        .route("/api/dashboard/health-trends", get(handlers::health_trends))
        .route(
            "/api/dashboard/nutrition-stats",
            get(handlers::nutrition_stats),
        )
        .route("/api/dashboard/update", post(handlers::update_snapshot))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
