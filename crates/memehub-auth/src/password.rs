//! Password hashing

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::LazyLock;

use crate::error::AuthError;

/// Hash verified when a login names an unknown account, so that both paths
/// cost one Argon2 verification
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("memehub-timing-equaliser").unwrap_or_default());

/// Hash a password using Argon2id with a random salt (PHC string format)
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Verify against `hash`, or against a dummy hash when there is none
///
/// Always returns `false` in the dummy case.
pub fn verify_password_or_dummy(password: &str, hash: Option<&str>) -> Result<bool, AuthError> {
    match hash {
        Some(hash) => verify_password(password, hash),
        None => {
            if !DUMMY_HASH.is_empty() {
                verify_password(password, &DUMMY_HASH)?;
            }
            Ok(false)
        }
    }
}
