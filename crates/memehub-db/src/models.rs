//! Database models

use crate::utils::{datetime_from_unix, parse_datetime_or_now};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidUserRole(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidUserRole(s) => write!(f, "Invalid user role: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// User role
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Member => "member",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "member" => Ok(UserRole::Member),
            _ => Err(ParseError::InvalidUserRole(s.to_string())),
        }
    }
}

/// User model
///
/// Credential fields are skipped on serialization so a `User` can never leak
/// its hash, pending OTP or reset token through a response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub is_verified: bool,
    /// Pending email verification code, empty when none is issued
    #[serde(skip_serializing)]
    pub otp_verify_email: String,
    /// Pending password reset token, empty when no reset is pending
    #[serde(skip_serializing)]
    pub password_change_token: String,
    #[serde(skip_serializing)]
    pub password_change_token_expires: Option<DateTime<Utc>>,
    pub avatar: String,
    pub portfolio: String,
    pub following: Vec<String>,
    pub followers: Vec<String>,
    pub description: String,
    pub short_description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether `code` consumes the pending verification code
    pub fn verification_code_matches(&self, code: &str) -> bool {
        !self.otp_verify_email.is_empty() && self.otp_verify_email == code
    }

    /// Whether `token` consumes the pending password reset at `now`
    pub fn reset_token_matches(&self, token: &str, now: DateTime<Utc>) -> bool {
        if self.password_change_token.is_empty() || self.password_change_token != token {
            return false;
        }
        matches!(self.password_change_token_expires, Some(expires) if expires >= now)
    }
}

/// The user-editable part of a record
///
/// Writing a profile never touches credentials, role or verification state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub avatar: String,
    pub portfolio: String,
    pub description: String,
    pub short_description: String,
}

impl User {
    /// Current profile fields
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            avatar: self.avatar.clone(),
            portfolio: self.portfolio.clone(),
            description: self.description.clone(),
            short_description: self.short_description.clone(),
        }
    }
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let role_str: String = row.try_get("role")?;
        let following: String = row.try_get("following")?;
        let followers: String = row.try_get("followers")?;
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role: UserRole::from_str(&role_str).unwrap_or_default(),
            is_verified: row.try_get("is_verified")?,
            otp_verify_email: row.try_get("otp_verify_email")?,
            password_change_token: row.try_get("password_change_token")?,
            password_change_token_expires: datetime_from_unix(
                row.try_get("password_change_token_expires")?,
            ),
            avatar: row.try_get("avatar")?,
            portfolio: row.try_get("portfolio")?,
            following: serde_json::from_str(&following).unwrap_or_default(),
            followers: serde_json::from_str(&followers).unwrap_or_default(),
            description: row.try_get("description")?,
            short_description: row.try_get("short_description")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}
