//! Memehub Authentication and Authorization
//!
//! This crate provides JWT session tokens, Argon2 password hashing, the
//! cookie-based authentication gate and role-based access checks.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use error::AuthError;
pub use jwt::{Claims, JwtManager};
pub use middleware::{AuthUser, Authenticator, SESSION_COOKIE, cookie_key, require_role};
pub use password::{hash_password, verify_password, verify_password_or_dummy};
