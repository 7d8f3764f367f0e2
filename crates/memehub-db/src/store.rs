//! Credential store trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::models::{NewUser, User, UserProfile};

/// Credential store
///
/// Implementations persist user records. Each method is atomic for a single
/// record; nothing here spans several records. The `consume_*` methods are
/// conditional compare-and-clear writes, so of several concurrent callers
/// holding the same code or token exactly one observes `true`.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user; fails with `DbError::Duplicate` if the email is taken
    async fn insert_user(&self, user: NewUser) -> Result<User, DbError>;

    /// Count all users
    async fn count_users(&self) -> Result<i64, DbError>;

    /// List all users in creation order
    async fn list_users(&self) -> Result<Vec<User>, DbError>;

    /// Get a user by ID
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, DbError>;

    /// Get a user by email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

    /// Overwrite only the profile fields of a user and return the updated
    /// record, or `None` if it no longer exists
    async fn update_profile(&self, id: &str, profile: &UserProfile) -> Result<Option<User>, DbError>;

    /// Delete a user by ID
    async fn delete_user(&self, id: &str) -> Result<bool, DbError>;

    /// Delete a user by ID and return the removed record
    async fn remove_user(&self, id: &str) -> Result<Option<User>, DbError>;

    /// Store a fresh email verification code, replacing any pending one
    async fn set_verification_code(&self, id: &str, code: &str) -> Result<bool, DbError>;

    /// Mark the user verified and clear the code, only if `code` is the pending one
    async fn consume_verification_code(&self, id: &str, code: &str) -> Result<bool, DbError>;

    /// Store a password reset token with its deadline, replacing any pending one
    async fn set_password_reset(
        &self,
        id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, DbError>;

    /// Replace the password hash and clear the reset token, only if `token` is
    /// pending and its deadline is not before `now`
    async fn consume_password_reset(
        &self,
        id: &str,
        token: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<bool, DbError>;
}
