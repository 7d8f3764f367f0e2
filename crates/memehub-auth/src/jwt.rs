//! JWT session token management

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Email the session was issued for
    pub email: String,
    /// Username at issuance time
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp), absent for open-ended tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// JWT manager for token generation and validation
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_expiry_hours: i64,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(secret: &str, token_expiry_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is checked when present but not required
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_expiry_hours,
        }
    }

    /// Default lifetime of issued tokens
    pub fn token_lifetime(&self) -> Duration {
        Duration::hours(self.token_expiry_hours)
    }

    /// Generate a token with the default lifetime
    pub fn generate_token(
        &self,
        user_id: &str,
        email: &str,
        username: &str,
    ) -> Result<String, AuthError> {
        self.generate_token_with_validity(user_id, email, username, Some(self.token_lifetime()))
    }

    /// Generate a token valid for `validity`, or without expiry when `None`
    pub fn generate_token_with_validity(
        &self,
        user_id: &str,
        email: &str,
        username: &str,
        validity: Option<Duration>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: validity.map(|v| (now + v).timestamp()),
        };

        debug!("Generating token for user: {}", email);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Validate a JWT token and return claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => {
                        debug!("Rejected token: {}", e);
                        AuthError::InvalidToken
                    }
                }
            })?;

        Ok(token_data.claims)
    }
}
