//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing or malformed input the caller can correct
    #[error("{0}")]
    InvalidInput(String),

    /// Valid identity without the rights for the operation
    #[error("{0}")]
    Forbidden(String),

    /// Referenced identity does not exist; also used for failed logins
    #[error("{0}")]
    NotFound(String),

    /// Wrong one-time code
    #[error("{0}")]
    InvalidCredential(String),

    #[error("Database error: {0}")]
    Database(#[from] memehub_db::DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] memehub_auth::AuthError),
}

impl CoreError {
    pub(crate) fn invalid_input(msg: &str) -> Self {
        CoreError::InvalidInput(msg.to_string())
    }

    pub(crate) fn not_found(msg: &str) -> Self {
        CoreError::NotFound(msg.to_string())
    }
}
