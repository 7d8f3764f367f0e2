//! Request/Response DTOs for the users API
//!
//! Request fields are all optional so that a missing field reaches the
//! handler and is reported with the same message as an empty one.

use axum::extract::FromRequest;
use memehub_db::{User, UserRole};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// JSON body extractor whose rejections use the API error format
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Plain `{msg}` response
#[derive(Serialize)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: &str) -> Self {
        Self {
            msg: msg.to_string(),
        }
    }
}

// ==================== Auth Types ====================

/// Register request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Register response
#[derive(Serialize)]
pub struct RegisterResponse {
    pub name: String,
    pub email: String,
    pub msg: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Who-am-I response
#[derive(Serialize)]
pub struct MeResponse {
    pub email: String,
    pub username: String,
}

// ==================== Workflow Types ====================

/// Verification code submission
#[derive(Deserialize)]
pub struct VerifyRequest {
    pub otp: Option<String>,
}

/// Password reset request
#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub email: Option<String>,
}

/// Password reset completion
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteResetRequest {
    pub email: Option<String>,
    pub token: Option<String>,
    pub new_password: Option<String>,
}

// ==================== User Types ====================

/// `GET /{id}` projection
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_verified: bool,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            is_verified: user.is_verified,
        }
    }
}

/// Single user response
#[derive(Serialize)]
pub struct UserResponse {
    pub user: UserSummary,
}

/// List response
#[derive(Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub n: usize,
}

/// Who was deleted
#[derive(Serialize)]
pub struct DeletedUser {
    pub name: String,
    pub email: String,
}

/// Delete response
#[derive(Serialize)]
pub struct DeleteResponse {
    pub user: DeletedUser,
    pub msg: String,
}

/// Profile update response
#[derive(Serialize)]
pub struct UpdateResponse {
    pub user: User,
    pub msg: String,
}

/// Turn an absent field into the empty string the services validate against
pub fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}
