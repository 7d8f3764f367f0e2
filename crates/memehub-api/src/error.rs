//! API error types

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use memehub_auth::AuthError;
use memehub_core::CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Message sent for every failure the client cannot act on
const INTERNAL_MESSAGE: &str = "Something went wrong, try again later";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn auth_parts(e: &AuthError) -> (StatusCode, &'static str, String) {
    match e {
        e if e.is_unauthenticated() => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHENTICATED",
            AuthError::Unauthenticated.to_string(),
        ),
        AuthError::InsufficientPermissions => (
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Not authorized to access this route".to_string(),
        ),
        _ => internal(e),
    }
}

fn internal(e: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    error!("Request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone()),
            ApiError::Core(e) => match e {
                CoreError::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
                CoreError::InvalidCredential(msg) => {
                    (StatusCode::BAD_REQUEST, "INVALID_CREDENTIAL", msg.clone())
                }
                CoreError::Auth(e) => auth_parts(e),
                CoreError::Database(e) => internal(e),
            },
            ApiError::Auth(e) => auth_parts(e),
        };

        let body = axum::Json(json!({
            "msg": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
