//! Application state

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use memehub_auth::{Authenticator, JwtManager};
use memehub_core::{IdentityService, PasswordResetService, VerificationService};
use memehub_db::UserStore;
use std::sync::Arc;

/// Prometheus handle rendered by `GET /metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub identities: Arc<IdentityService>,
    pub verification: Arc<VerificationService>,
    pub resets: Arc<PasswordResetService>,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn UserStore>,
        jwt: Arc<JwtManager>,
        cookie_key: Key,
        reset_token_ttl: chrono::Duration,
    ) -> Self {
        Self {
            identities: Arc::new(IdentityService::new(store.clone(), jwt.clone())),
            verification: Arc::new(VerificationService::new(store.clone())),
            resets: Arc::new(PasswordResetService::new(store.clone(), reset_token_ttl)),
            auth: Arc::new(Authenticator::new(store.clone(), jwt, cookie_key)),
            store,
        }
    }
}

// Lets handlers take a `SignedCookieJar` directly
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.auth.cookie_key().clone()
    }
}
