//! Password reset workflow
//!
//! A reset token is 16 random bytes, hex encoded, valid for a limited time and
//! good for exactly one password change. Requests for unknown emails are
//! answered like any other so the endpoint cannot be used to enumerate accounts.

use chrono::{DateTime, Duration, Utc};
use memehub_auth::hash_password;
use memehub_db::UserStore;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::identity::check_password_length;

const INVALID_TOKEN: &str = "Invalid password token";

/// A stored, not yet consumed reset token
#[derive(Debug, Clone)]
pub struct PendingReset {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

/// Password reset service
pub struct PasswordResetService {
    store: Arc<dyn UserStore>,
    token_ttl: Duration,
}

impl PasswordResetService {
    /// Create a new password reset service
    pub fn new(store: Arc<dyn UserStore>, token_ttl: Duration) -> Self {
        Self { store, token_ttl }
    }

    /// Start a reset for `email`
    ///
    /// Returns `None` when no such user exists; callers must not let that
    /// difference reach the client.
    pub async fn request_reset(&self, email: &str) -> Result<Option<PendingReset>, CoreError> {
        if email.is_empty() {
            return Err(CoreError::invalid_input("Provide an Email"));
        }

        let Some(user) = self.store.get_user_by_email(email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        let pending = PendingReset {
            token: generate_token(),
            expires_at: Utc::now() + self.token_ttl,
        };
        if !self
            .store
            .set_password_reset(&user.id, &pending.token, pending.expires_at)
            .await?
        {
            return Ok(None);
        }

        info!("Issued password reset token for {}", user.email);
        Ok(Some(pending))
    }

    /// Finish a reset: replace the password if `token` is pending and unexpired
    pub async fn complete_reset(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), CoreError> {
        if email.is_empty() || token.is_empty() || new_password.is_empty() {
            return Err(CoreError::invalid_input("Provide email, token and new password"));
        }
        check_password_length(new_password)?;

        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| CoreError::not_found("User not Found!"))?;

        let now = Utc::now();
        // Cheap rejection before paying for a hash; the store re-checks atomically
        if !user.reset_token_matches(token, now) {
            warn!("Rejected password reset token for {}", user.email);
            return Err(CoreError::invalid_input(INVALID_TOKEN));
        }

        let password_hash = hash_password(new_password)?;
        if !self
            .store
            .consume_password_reset(&user.id, token, now, &password_hash)
            .await?
        {
            warn!("Password reset token for {} was consumed concurrently", user.email);
            return Err(CoreError::invalid_input(INVALID_TOKEN));
        }

        info!("Password reset completed for {}", user.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::tests::harness;
    use tokio::sync::Barrier;

    fn service(h: &crate::identity::tests::Harness) -> PasswordResetService {
        PasswordResetService::new(h.store.clone(), Duration::hours(1))
    }

    #[test]
    fn test_tokens_are_32_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[tokio::test]
    async fn test_unknown_email_changes_nothing() {
        let h = harness();
        let resets = service(&h);
        h.identities.register("a", "a@x.com", "p").await.unwrap();
        let before = h.store.list_users().await.unwrap();

        assert!(resets.request_reset("nobody@x.com").await.unwrap().is_none());

        let after = h.store.list_users().await.unwrap();
        assert_eq!(before.len(), after.len());
        assert_eq!(before[0].updated_at, after[0].updated_at);
        assert!(after[0].password_change_token.is_empty());
    }

    #[tokio::test]
    async fn test_full_reset() {
        let h = harness();
        let resets = service(&h);
        h.identities.register("a", "a@x.com", "old").await.unwrap();

        let pending = resets.request_reset("a@x.com").await.unwrap().unwrap();
        let ttl = pending.expires_at - Utc::now();
        assert!(ttl > Duration::minutes(59) && ttl <= Duration::hours(1));

        let err = resets.complete_reset("a@x.com", "not-it", "new").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(ref m) if m == INVALID_TOKEN));

        resets.complete_reset("a@x.com", &pending.token, "new").await.unwrap();
        assert!(h.identities.login("a@x.com", "new").await.is_ok());
        assert!(h.identities.login("a@x.com", "old").await.is_err());

        // Single use
        let err = resets
            .complete_reset("a@x.com", &pending.token, "newer")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let h = harness();
        let resets = service(&h);
        let session = h.identities.register("a", "a@x.com", "old").await.unwrap();

        h.store
            .set_password_reset(&session.user.id, "cafebabe", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();

        let err = resets
            .complete_reset("a@x.com", "cafebabe", "new")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert!(h.identities.login("a@x.com", "old").await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_completions_have_one_winner() {
        let h = harness();
        let resets = Arc::new(service(&h));
        h.identities.register("a", "a@x.com", "old").await.unwrap();
        let pending = resets.request_reset("a@x.com").await.unwrap().unwrap();

        let barrier = Arc::new(Barrier::new(4));
        let tasks: Vec<_> = (0..4)
            .map(|i| {
                let resets = resets.clone();
                let barrier = barrier.clone();
                let token = pending.token.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    resets
                        .complete_reset("a@x.com", &token, &format!("new-{i}"))
                        .await
                        .is_ok()
                })
            })
            .collect();

        let mut winners = Vec::new();
        for (i, task) in tasks.into_iter().enumerate() {
            if task.await.unwrap() {
                winners.push(i);
            }
        }
        assert_eq!(winners.len(), 1);
        let password = format!("new-{}", winners[0]);
        assert!(h.identities.login("a@x.com", &password).await.is_ok());
    }

    #[tokio::test]
    async fn test_input_validation() {
        let h = harness();
        let resets = service(&h);

        assert!(matches!(resets.request_reset("").await, Err(CoreError::InvalidInput(_))));
        assert!(matches!(
            resets.complete_reset("a@x.com", "", "new").await,
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            resets.complete_reset("a@x.com", "tok", "new").await,
            Err(CoreError::NotFound(_))
        ));

        h.identities.register("a", "a@x.com", "old").await.unwrap();
        let pending = resets.request_reset("a@x.com").await.unwrap().unwrap();
        let long = "x".repeat(crate::MAX_PASSWORD_LENGTH + 1);
        assert!(matches!(
            resets.complete_reset("a@x.com", &pending.token, &long).await,
            Err(CoreError::InvalidInput(_))
        ));
        // The token survives a rejected attempt
        resets.complete_reset("a@x.com", &pending.token, "new").await.unwrap();
    }
}
