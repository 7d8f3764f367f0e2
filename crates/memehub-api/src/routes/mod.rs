//! API routes

mod auth;
mod health;
pub mod metrics;
mod types;
mod users;

use axum::{Router, response::IntoResponse, routing::get};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::{AppState, MetricsHandle};

pub use auth::{RequireAdmin, RequireAuth};

/// GET /
async fn banner() -> &'static str {
    "Meme Project API"
}

/// Any route nobody registered
async fn not_found() -> impl IntoResponse {
    ApiError::NotFound("Route does not exist".to_string())
}

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        .route("/", get(banner))
        // Health check
        .merge(health::routes())
        // Identity API
        .merge(auth::routes())
        .merge(users::routes())
        .with_state(state);

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router.fallback(not_found)
}
