//! Memehub Core Business Logic
//!
//! This crate provides the identity lifecycle (register, login, fetch, delete,
//! profile update), the email verification workflow and the password reset
//! workflow, on top of the credential store and session token service.

pub mod error;
pub mod identity;
pub mod password_reset;
pub mod verification;

pub use error::CoreError;
pub use identity::{
    IdentityService, LOGIN_SESSION_SECS, MAX_PASSWORD_LENGTH, ProfileUpdate, Session,
};
pub use password_reset::{PasswordResetService, PendingReset};
pub use verification::{CodeRequest, VerificationService};
