//! Service counters and their Prometheus exposition
//!
//! Handlers emit through the `metrics` facade using the names below; this
//! module attaches help text to them and serves the text exposition.

use axum::{Router, extract::State, http::header, response::IntoResponse, routing::get};
use metrics::{Unit, describe_counter};
use std::sync::Arc;

use crate::state::MetricsHandle;

/// Accounts created through register
pub(crate) const REGISTRATIONS: &str = "memehub_registrations_total";
/// Login attempts, labelled `outcome` = `success` | `failure`
pub(crate) const LOGINS: &str = "memehub_logins_total";
/// Verification requests and submissions, labelled `outcome`
pub(crate) const EMAIL_VERIFICATIONS: &str = "memehub_email_verifications_total";
/// Reset workflow steps, labelled `stage` = `requested` | `completed`
pub(crate) const PASSWORD_RESETS: &str = "memehub_password_resets_total";
pub(crate) const HEALTH_CHECKS: &str = "memehub_health_checks_total";

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Register help text for every counter on the installed recorder
pub fn describe() {
    describe_counter!(REGISTRATIONS, Unit::Count, "Accounts created");
    describe_counter!(LOGINS, Unit::Count, "Login attempts by outcome");
    describe_counter!(
        EMAIL_VERIFICATIONS,
        Unit::Count,
        "Email verification requests and submissions by outcome"
    );
    describe_counter!(PASSWORD_RESETS, Unit::Count, "Password reset steps by stage");
    describe_counter!(HEALTH_CHECKS, Unit::Count, "Health check requests");
}

/// Create the `/metrics` route over an installed Prometheus recorder
pub fn routes(handle: Arc<MetricsHandle>) -> Router {
    describe();

    Router::new()
        .route("/metrics", get(scrape))
        .with_state(handle)
}

/// GET /metrics
async fn scrape(State(handle): State<Arc<MetricsHandle>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        handle.render(),
    )
}
