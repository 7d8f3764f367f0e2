//! Identity lifecycle operations

use chrono::Duration;
use memehub_auth::{AuthUser, JwtManager, hash_password, verify_password_or_dummy};
use memehub_db::{DbError, NewUser, User, UserRole, UserStore};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::CoreError;

/// Lifetime of a login session, for both the token and the cookie (one week)
pub const LOGIN_SESSION_SECS: i64 = 7 * 24 * 60 * 60;

/// Deliberately identical for unknown emails and wrong passwords
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Maximum accepted password length, checked before any Argon2 work
pub const MAX_PASSWORD_LENGTH: usize = 256;

/// Reject passwords longer than `MAX_PASSWORD_LENGTH`
pub(crate) fn check_password_length(password: &str) -> Result<(), CoreError> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(CoreError::invalid_input(&format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
    /// How long the carrier should keep the token; `None` for a browser session
    pub max_age: Option<Duration>,
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub portfolio: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
}

/// Identity lifecycle service
pub struct IdentityService {
    store: Arc<dyn UserStore>,
    jwt: Arc<JwtManager>,
}

impl IdentityService {
    /// Create a new identity service
    pub fn new(store: Arc<dyn UserStore>, jwt: Arc<JwtManager>) -> Self {
        Self { store, jwt }
    }

    /// Register a new user
    ///
    /// The very first user becomes admin. Counting and inserting are two
    /// separate store calls, so two concurrent first registrations can both
    /// end up admin.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, CoreError> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(CoreError::invalid_input("Provide email, password, and username"));
        }

        check_password_length(password)?;

        debug!("Registering user: {}", email);

        // Hash first so the count-then-insert window stays short
        let password_hash = hash_password(password)?;

        let role = if self.store.count_users().await? == 0 {
            info!("No users yet, {} becomes the bootstrap admin", email);
            UserRole::Admin
        } else {
            UserRole::Member
        };

        let user = self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                DbError::Duplicate(_) => {
                    CoreError::invalid_input("Duplicate value entered for email field")
                }
                other => CoreError::Database(other),
            })?;

        let token = self.jwt.generate_token(&user.id, &user.email, &user.username)?;

        info!("Registered user {} as {}", user.email, user.role.as_str());
        Ok(Session {
            user,
            token,
            max_age: None,
        })
    }

    /// Log in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, CoreError> {
        if email.is_empty() || password.is_empty() {
            return Err(CoreError::invalid_input("Provide email and password"));
        }
        check_password_length(password)?;

        debug!("Login attempt for user: {}", email);

        // Unknown emails still pay for one hash verification
        let user = self.store.get_user_by_email(email).await?;
        let password_valid =
            verify_password_or_dummy(password, user.as_ref().map(|u| u.password_hash.as_str()))?;

        let user = match (user, password_valid) {
            (Some(u), true) => u,
            _ => {
                warn!("Failed login for {}", email);
                return Err(CoreError::not_found(INVALID_CREDENTIALS));
            }
        };

        let max_age = Duration::seconds(LOGIN_SESSION_SECS);
        let token = self.jwt.generate_token_with_validity(
            &user.id,
            &user.email,
            &user.username,
            Some(max_age),
        )?;

        info!("User {} logged in successfully", user.email);
        Ok(Session {
            user,
            token,
            max_age: Some(max_age),
        })
    }

    /// List all users
    pub async fn list(&self) -> Result<Vec<User>, CoreError> {
        Ok(self.store.list_users().await?)
    }

    /// Get a user by ID
    pub async fn get(&self, id: &str) -> Result<User, CoreError> {
        if id.is_empty() {
            return Err(CoreError::invalid_input("Provide user's id"));
        }

        self.store
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("User not found"))
    }

    /// Delete a user on behalf of `caller`
    ///
    /// Admins delete any user. For everyone else the target is looked up by
    /// `id` and deleted if its id equals `id`; that check never compares
    /// against the caller's own id, so a member can delete any existing user.
    pub async fn delete(&self, caller: &AuthUser, id: &str) -> Result<User, CoreError> {
        let not_found = || CoreError::not_found("User not found.");

        let caller_user = self
            .store
            .get_user_by_email(&caller.email)
            .await?
            .ok_or_else(not_found)?;

        let deleted = if caller_user.role.is_admin() {
            self.store.remove_user(id).await?
        } else {
            match self.store.get_user_by_id(id).await? {
                Some(target) if target.id == id => {
                    self.store.delete_user(id).await?;
                    Some(target)
                }
                other => other,
            }
        };

        let deleted = deleted.ok_or_else(not_found)?;
        info!("User {} deleted user {}", caller_user.email, deleted.email);
        Ok(deleted)
    }

    /// Update a user's profile; allowed for the user themself and for admins
    pub async fn update_profile(
        &self,
        caller: &AuthUser,
        id: &str,
        update: ProfileUpdate,
    ) -> Result<User, CoreError> {
        if caller.id != id && !caller.role.is_admin() {
            return Err(CoreError::Forbidden(
                "Not allowed to update this user.".to_string(),
            ));
        }

        let current = self
            .store
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("User not found"))?;

        let mut profile = current.profile();
        if let Some(username) = update.username {
            if username.is_empty() {
                return Err(CoreError::invalid_input("Username cannot be empty"));
            }
            profile.username = username;
        }
        if let Some(avatar) = update.avatar {
            profile.avatar = avatar;
        }
        if let Some(portfolio) = update.portfolio {
            profile.portfolio = portfolio;
        }
        if let Some(description) = update.description {
            profile.description = description;
        }
        if let Some(short_description) = update.short_description {
            profile.short_description = short_description;
        }

        let user = self
            .store
            .update_profile(id, &profile)
            .await?
            .ok_or_else(|| CoreError::not_found("User not found"))?;

        info!("Updated profile of {}", user.email);
        Ok(user)
    }
}
