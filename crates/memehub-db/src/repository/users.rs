//! User operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NewUser, User, UserProfile};
use crate::repository::Database;
use crate::store::UserStore;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, is_verified, \
    otp_verify_email, password_change_token, password_change_token_expires, avatar, \
    portfolio, following, followers, description, short_description, created_at, updated_at";

#[async_trait]
impl UserStore for Database {
    async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();

        // Check if user already exists
        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(DbError::Duplicate(format!("email '{}' already registered", user.email)));
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from_write(e, &format!("email '{}' already registered", user.email)))?;

        Ok(User {
            id,
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
        })
    }

    async fn count_users(&self) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }

    async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    async fn update_profile(&self, id: &str, profile: &UserProfile) -> Result<Option<User>, DbError> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE users
            SET username = ?, avatar = ?, portfolio = ?, description = ?,
                short_description = ?, updated_at = ?
            WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&profile.username)
        .bind(&profile.avatar)
        .bind(&profile.portfolio)
        .bind(&profile.description)
        .bind(&profile.short_description)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    async fn delete_user(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_user(&self, id: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(&format!(
            "DELETE FROM users WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    async fn set_verification_code(&self, id: &str, code: &str) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET otp_verify_email = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(code)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn consume_verification_code(&self, id: &str, code: &str) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_verified = 1, otp_verify_email = '', updated_at = ?
            WHERE id = ? AND otp_verify_email != '' AND otp_verify_email = ?
            "#,
        )
        .bind(now.to_rfc3339())
        .bind(id)
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_password_reset(
        &self,
        id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_change_token = ?, password_change_token_expires = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(token)
        .bind(expires_at.timestamp())
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn consume_password_reset(
        &self,
        id: &str,
        token: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, password_change_token = '',
                password_change_token_expires = NULL, updated_at = ?
            WHERE id = ?
              AND password_change_token != ''
              AND password_change_token = ?
              AND password_change_token_expires IS NOT NULL
              AND password_change_token_expires >= ?
            "#,
        )
        .bind(password_hash)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .bind(token)
        .bind(now.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
