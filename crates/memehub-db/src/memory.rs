//! In-memory credential store
//!
//! Holds users in a process-local vector behind a lock. Used for tests and for
//! throwaway deployments (`database.backend = "memory"`); nothing survives a
//! restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NewUser, User, UserProfile};
use crate::store::UserStore;

/// Credential store backed by process memory
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `f` to the user with `id` under the write lock
    fn update<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut User) -> bool,
    {
        let mut users = self.users.write();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                let changed = f(user);
                if changed {
                    user.updated_at = Utc::now();
                }
                changed
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let mut users = self.users.write();
        if users.iter().any(|u| u.email == user.email) {
            return Err(DbError::Duplicate(format!("email '{}' already registered", user.email)));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4().to_string(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            is_verified: false,
            otp_verify_email: String::new(),
            password_change_token: String::new(),
            password_change_token_expires: None,
            avatar: String::new(),
            portfolio: String::new(),
            following: vec![],
            followers: vec![],
            description: String::new(),
            short_description: String::new(),
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn count_users(&self) -> Result<i64, DbError> {
        Ok(self.users.read().len() as i64)
    }

    async fn list_users(&self) -> Result<Vec<User>, DbError> {
        Ok(self.users.read().clone())
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
        Ok(self.users.read().iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        Ok(self.users.read().iter().find(|u| u.email == email).cloned())
    }

    async fn update_profile(&self, id: &str, profile: &UserProfile) -> Result<Option<User>, DbError> {
        let mut users = self.users.write();
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            user.username = profile.username.clone();
            user.avatar = profile.avatar.clone();
            user.portfolio = profile.portfolio.clone();
            user.description = profile.description.clone();
            user.short_description = profile.short_description.clone();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete_user(&self, id: &str) -> Result<bool, DbError> {
        Ok(self.remove_user(id).await?.is_some())
    }

    async fn remove_user(&self, id: &str) -> Result<Option<User>, DbError> {
        let mut users = self.users.write();
        Ok(users
            .iter()
            .position(|u| u.id == id)
            .map(|idx| users.remove(idx)))
    }

    async fn set_verification_code(&self, id: &str, code: &str) -> Result<bool, DbError> {
        Ok(self.update(id, |user| {
            user.otp_verify_email = code.to_string();
            true
        }))
    }

    async fn consume_verification_code(&self, id: &str, code: &str) -> Result<bool, DbError> {
        Ok(self.update(id, |user| {
            if !user.verification_code_matches(code) {
                return false;
            }
            user.is_verified = true;
            user.otp_verify_email.clear();
            true
        }))
    }

    async fn set_password_reset(
        &self,
        id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        Ok(self.update(id, |user| {
            user.password_change_token = token.to_string();
            user.password_change_token_expires = Some(expires_at);
            true
        }))
    }

    async fn consume_password_reset(
        &self,
        id: &str,
        token: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<bool, DbError> {
        Ok(self.update(id, |user| {
            if !user.reset_token_matches(token, now) {
                return false;
            }
            user.password_hash = password_hash.to_string();
            user.password_change_token.clear();
            user.password_change_token_expires = None;
            true
        }))
    }
}
