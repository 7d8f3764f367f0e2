//! Authentication extractors and routes

use axum::{
    Json, Router,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, request::Parts},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SignedCookieJar};
use memehub_auth::{AuthUser, SESSION_COOKIE, require_role};
use memehub_core::Session;
use memehub_db::UserRole;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

use super::metrics::{LOGINS, REGISTRATIONS};
use super::types::{
    ApiJson, LoginRequest, MeResponse, MessageResponse, RegisterRequest, RegisterResponse, field,
};

// ==================== Auth Extractors ====================

/// Extractor for authenticated user (required)
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let user = app_state.auth.authenticate_headers(&parts.headers).await?;
        Ok(RequireAuth(user))
    }
}

/// Extractor for admin user (required)
pub struct RequireAdmin(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        require_role(&user, &[UserRole::Admin])?;
        Ok(RequireAdmin(user))
    }
}

// ==================== Session Cookie ====================

/// Build the `user` cookie carrying a session's token
fn session_cookie(session: &Session) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, session.token.clone()))
        .http_only(true)
        .path("/");

    if let Some(max_age) = session.max_age {
        cookie = cookie.max_age(time::Duration::seconds(max_age.num_seconds()));
    }

    cookie.build()
}

// ==================== Auth Routes ====================

/// POST /api/v1/users/register
async fn register(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, SignedCookieJar, Json<RegisterResponse>), ApiError> {
    let session = state
        .identities
        .register(
            field(&request.username),
            field(&request.email),
            field(&request.password),
        )
        .await?;

    metrics::counter!(REGISTRATIONS).increment(1);

    let jar = jar.add(session_cookie(&session));
    Ok((
        StatusCode::CREATED,
        jar,
        Json(RegisterResponse {
            name: session.user.username,
            email: session.user.email,
            msg: "User Created Successfully".to_string(),
        }),
    ))
}

/// POST /api/v1/users/login
async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(SignedCookieJar, Json<MessageResponse>), ApiError> {
    let result = state
        .identities
        .login(field(&request.email), field(&request.password))
        .await;

    let outcome = if result.is_ok() { "success" } else { "failure" };
    metrics::counter!(LOGINS, "outcome" => outcome).increment(1);

    let session = result?;
    Ok((
        jar.add(session_cookie(&session)),
        Json(MessageResponse::new("Success")),
    ))
}

/// GET /api/v1/users/logout
///
/// Always overwrites the cookie, whether or not the request carried one.
async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let expired = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .max_age(time::Duration::ZERO);

    (jar.add(expired), Json(MessageResponse::new("Success")))
}

/// GET /api/v1/users/me
async fn me(RequireAuth(user): RequireAuth) -> Result<Json<MeResponse>, Json<MessageResponse>> {
    if user.email.is_empty() || user.username.is_empty() {
        debug!("Session resolved to an identity without email or username");
        return Err(Json(MessageResponse::new("Not connected")));
    }

    Ok(Json(MeResponse {
        email: user.email,
        username: user.username,
    }))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/users/register", post(register))
        .route("/api/v1/users/login", post(login))
        .route("/api/v1/users/logout", get(logout))
        .route("/api/v1/users/me", get(me))
}
