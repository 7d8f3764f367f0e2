//! User management and credential workflow routes

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use memehub_core::{CodeRequest, ProfileUpdate};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::{RequireAdmin, RequireAuth};
use super::metrics::{EMAIL_VERIFICATIONS, PASSWORD_RESETS};
use super::types::{
    ApiJson, CompleteResetRequest, DeleteResponse, DeletedUser, MessageResponse,
    PasswordResetRequest, UpdateResponse, UserListResponse, UserResponse, VerifyRequest, field,
};

// ==================== User Routes ====================

/// GET /api/v1/users (Admin only)
async fn list_users(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, ApiError> {
    let users = state.identities.list().await?;
    debug!("Listing {} users for {}", users.len(), admin.email);

    Ok(Json(UserListResponse {
        n: users.len(),
        users,
    }))
}

/// GET /api/v1/users/{id}
async fn get_user(
    _user: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.identities.get(&id).await?;

    Ok(Json(UserResponse { user: user.into() }))
}

/// DELETE /api/v1/users/{id}
async fn delete_user(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    debug!("User {} deleting user: {}", caller.email, id);

    let deleted = state.identities.delete(&caller, &id).await?;

    Ok(Json(DeleteResponse {
        user: DeletedUser {
            name: deleted.username,
            email: deleted.email,
        },
        msg: "Deleted Successfully.".to_string(),
    }))
}

/// POST /api/v1/users/update/{id}
async fn update_user(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let user = state.identities.update_profile(&caller, &id, update).await?;

    Ok(Json(UpdateResponse {
        user,
        msg: "Updated Successfully.".to_string(),
    }))
}

// ==================== Email Verification ====================

/// GET /api/v1/users/verify
///
/// The code is stored for out-of-band delivery and never echoed back.
async fn request_verification(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let msg = match state.verification.request_code(&caller).await? {
        CodeRequest::AlreadyVerified => {
            metrics::counter!(EMAIL_VERIFICATIONS, "outcome" => "already_verified").increment(1);
            "User is already verified."
        }
        CodeRequest::Issued { .. } => {
            metrics::counter!(EMAIL_VERIFICATIONS, "outcome" => "issued").increment(1);
            "Verification code issued."
        }
    };

    Ok(Json(MessageResponse::new(msg)))
}

/// POST /api/v1/users/verify
async fn submit_verification(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let result = state
        .verification
        .consume_code(&caller, field(&request.otp))
        .await;

    let outcome = if result.is_ok() { "verified" } else { "rejected" };
    metrics::counter!(EMAIL_VERIFICATIONS, "outcome" => outcome).increment(1);

    result?;
    Ok(Json(MessageResponse::new("Email Verified Successfully")))
}

// ==================== Password Reset ====================

/// POST /api/v1/users/password
///
/// Answers the same way whether or not the email belongs to anyone.
async fn request_password_reset(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.resets.request_reset(field(&request.email)).await?.is_some() {
        metrics::counter!(PASSWORD_RESETS, "stage" => "requested").increment(1);
    }

    Ok(Json(MessageResponse::new("Check your email!")))
}

/// POST /api/v1/users/reset-password
async fn complete_password_reset(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CompleteResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .resets
        .complete_reset(
            field(&request.email),
            field(&request.token),
            field(&request.new_password),
        )
        .await?;

    metrics::counter!(PASSWORD_RESETS, "stage" => "completed").increment(1);
    Ok(Json(MessageResponse::new("Success")))
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/users", get(list_users))
        .route("/api/v1/users/", get(list_users))
        .route("/api/v1/users/password", post(request_password_reset))
        .route("/api/v1/users/reset-password", post(complete_password_reset))
        .route(
            "/api/v1/users/verify",
            get(request_verification).post(submit_verification),
        )
        .route("/api/v1/users/update/{id}", post(update_user))
        .route("/api/v1/users/{id}", get(get_user).delete(delete_user))
}
