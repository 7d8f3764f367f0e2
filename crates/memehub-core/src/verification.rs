//! Email verification workflow
//!
//! Per user: unverified → code issued → verified. Issuing a new code replaces
//! the previous one; a verified user never gets a new code. Delivering the
//! code to the user's mailbox is somebody else's job.

use memehub_auth::AuthUser;
use memehub_db::UserStore;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::CoreError;

/// Outcome of a verification code request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeRequest {
    /// The user was verified already; nothing changed
    AlreadyVerified,
    /// A new code was stored and awaits delivery
    Issued { code: String },
}

/// Generate a five digit verification code
fn generate_code() -> String {
    rand::rng().random_range(10_000..100_000).to_string()
}

/// Email verification service
pub struct VerificationService {
    store: Arc<dyn UserStore>,
}

impl VerificationService {
    /// Create a new verification service
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Issue a verification code for the caller
    pub async fn request_code(&self, caller: &AuthUser) -> Result<CodeRequest, CoreError> {
        let user = self
            .store
            .get_user_by_email(&caller.email)
            .await?
            .ok_or_else(|| CoreError::not_found("User does not exist."))?;

        if user.is_verified {
            debug!("User {} is already verified", user.email);
            return Ok(CodeRequest::AlreadyVerified);
        }

        let code = generate_code();
        if !self.store.set_verification_code(&user.id, &code).await? {
            return Err(CoreError::not_found("User does not exist."));
        }

        info!("Issued email verification code for {}", user.email);
        Ok(CodeRequest::Issued { code })
    }

    /// Consume a verification code, marking the caller verified
    pub async fn consume_code(&self, caller: &AuthUser, code: &str) -> Result<(), CoreError> {
        if code.is_empty() {
            return Err(CoreError::invalid_input("Provide OTP"));
        }

        let user = self
            .store
            .get_user_by_email(&caller.email)
            .await?
            .ok_or_else(|| CoreError::not_found("User not found"))?;

        if !self.store.consume_verification_code(&user.id, code).await? {
            warn!("Wrong verification code for {}", user.email);
            return Err(CoreError::InvalidCredential("Wrong OTP.".to_string()));
        }

        info!("Email verified for {}", user.email);
        Ok(())
    }
}
