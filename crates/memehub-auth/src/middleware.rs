//! Authentication gate
//!
//! Resolves the session token carried by a request into an [`AuthUser`].
//! The token is looked for in the signed `user` cookie, then the plain `user`
//! cookie, then an `Authorization: Bearer` header. Identity fields that matter
//! for access decisions (id, role, profile) are always read from the store,
//! never from the token payload, so a role change applies on the next request.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::cookie::{CookieJar, Key, SignedCookieJar};
use memehub_db::{User, UserRole, UserStore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::jwt::{Claims, JwtManager};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "user";

/// Verified-identity context attached to an authenticated request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub email: String,
    pub username: String,
    pub issued_at: i64,
    pub expires_at: Option<i64>,
    pub id: String,
    pub role: UserRole,
    pub avatar: String,
    pub portfolio: String,
    pub following: Vec<String>,
    pub followers: Vec<String>,
    pub description: String,
    pub short_description: String,
}

impl AuthUser {
    /// Combine verified claims with the live user record
    pub fn from_parts(claims: Claims, user: User) -> Self {
        Self {
            email: claims.email,
            username: claims.username,
            issued_at: claims.iat,
            expires_at: claims.exp,
            id: user.id,
            role: user.role,
            avatar: user.avatar,
            portfolio: user.portfolio,
            following: user.following,
            followers: user.followers,
            description: user.description,
            short_description: user.short_description,
        }
    }
}

/// Derive the cookie signing key from the configured secret
pub fn cookie_key(secret: &str) -> Key {
    Key::from(Sha512::digest(secret.as_bytes()).as_slice())
}

/// Extract bearer token from authorization header
fn extract_bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

/// Authentication gate shared by all protected routes
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn UserStore>,
    jwt: Arc<JwtManager>,
    cookie_key: Key,
}

impl Authenticator {
    /// Create a new authenticator
    pub fn new(store: Arc<dyn UserStore>, jwt: Arc<JwtManager>, cookie_key: Key) -> Self {
        Self {
            store,
            jwt,
            cookie_key,
        }
    }

    /// Key used to sign and verify the session cookie
    pub fn cookie_key(&self) -> &Key {
        &self.cookie_key
    }

    /// Find the session token carried by a request
    pub fn extract_token(&self, headers: &HeaderMap) -> Option<String> {
        let signed = SignedCookieJar::from_headers(headers, self.cookie_key.clone());
        if let Some(cookie) = signed.get(SESSION_COOKIE) {
            return Some(cookie.value().to_string());
        }

        let plain = CookieJar::from_headers(headers);
        if let Some(cookie) = plain.get(SESSION_COOKIE) {
            return Some(cookie.value().to_string());
        }

        headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(extract_bearer_token)
            .map(str::to_string)
    }

    /// Authenticate a request from its headers
    pub async fn authenticate_headers(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        let token = self.extract_token(headers);
        self.authenticate(token.as_deref()).await
    }

    /// Resolve a session token into a verified identity
    ///
    /// Every token problem collapses into `Unauthenticated`; only store
    /// failures come back as something else.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<AuthUser, AuthError> {
        let token = token.ok_or(AuthError::Unauthenticated)?;

        let claims = self.jwt.validate_token(token).map_err(|e| {
            debug!("Session token rejected: {}", e);
            AuthError::Unauthenticated
        })?;

        let user = self
            .store
            .get_user_by_email(&claims.email)
            .await?
            .ok_or_else(|| {
                debug!("Session token names an unknown user: {}", claims.email);
                AuthError::Unauthenticated
            })?;

        let auth_user = AuthUser::from_parts(claims, user);
        debug!(
            "Authenticated user: {} ({})",
            auth_user.email,
            auth_user.role.as_str()
        );
        Ok(auth_user)
    }
}

/// Require the verified identity to hold one of `allowed`
pub fn require_role(user: &AuthUser, allowed: &[UserRole]) -> Result<(), AuthError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        debug!("User {} lacks any of {:?}", user.email, allowed);
        Err(AuthError::InsufficientPermissions)
    }
}
