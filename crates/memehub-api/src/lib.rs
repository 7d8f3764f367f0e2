//! Memehub REST API
//!
//! This crate provides the Axum-based HTTP API for Memehub: the
//! `/api/v1/users` identity routes, health checks and the Prometheus
//! metrics endpoint.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
