use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::models::user::PasswordResetToken;
use crate::storage::connection::DbConnection;
use crate::storage::{format_timestamp, parse_timestamp};

/// Repository for token revocations and password reset requests
#[derive(Clone)]
pub struct TokenRepository {
    db: DbConnection,
}

impl TokenRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Record a revoked token id. Revoking the same jti twice is a no-op.
    pub async fn revoke_token(
        &self,
        jti: &str,
        user_id: Uuid,
        token_type: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO revoked_tokens (jti, token_type, user_id, revoked_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(jti)
        .bind(token_type)
        .bind(user_id.to_string())
        .bind(format_timestamp(&now))
        .bind(format_timestamp(&expires_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// A token counts as revoked until its own expiry passes
    pub async fn is_token_revoked(&self, jti: &str, now: DateTime<Utc>) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM revoked_tokens WHERE jti = ? AND expires_at > ?")
            .bind(jti)
            .bind(format_timestamp(&now))
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.is_some())
    }

    /// Drop revocations whose tokens have expired anyway
    pub async fn delete_expired_revocations(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= ?")
            .bind(format_timestamp(&now))
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn store_password_reset(&self, token: &PasswordResetToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (id, user_id, token_hash, expires_at, used_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(token.id.to_string())
        .bind(token.user_id.to_string())
        .bind(&token.token_hash)
        .bind(format_timestamp(&token.expires_at))
        .bind(token.used_at.as_ref().map(format_timestamp))
        .bind(format_timestamp(&token.created_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Find an unused, unexpired reset request by token hash
    pub async fn find_valid_password_reset(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PasswordResetToken>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token_hash, expires_at, used_at, created_at
            FROM password_reset_tokens
            WHERE token_hash = ? AND expires_at > ? AND used_at IS NULL
            "#,
        )
        .bind(token_hash)
        .bind(format_timestamp(&now))
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => {
                let id: String = r.get("id");
                let user_id: String = r.get("user_id");
                let used_at: Option<String> = r.get("used_at");
                Ok(Some(PasswordResetToken {
                    id: Uuid::parse_str(&id).context("Invalid reset token id")?,
                    user_id: Uuid::parse_str(&user_id).context("Invalid reset token user id")?,
                    token_hash: r.get("token_hash"),
                    expires_at: parse_timestamp(r.get("expires_at"))?,
                    used_at: used_at.as_deref().map(parse_timestamp).transpose()?,
                    created_at: parse_timestamp(r.get("created_at"))?,
                }))
            }
            None => Ok(None),
        }
    }

    /// Set the new password hash and mark the reset request used, atomically.
    /// Returns false when the request was already consumed.
    pub async fn consume_password_reset(
        &self,
        reset_id: Uuid,
        user_id: Uuid,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;
        let now_text = format_timestamp(&now);

        let marked = sqlx::query("UPDATE password_reset_tokens SET used_at = ? WHERE id = ? AND used_at IS NULL")
            .bind(&now_text)
            .bind(reset_id.to_string())
            .execute(&mut *tx)
            .await?;
        if marked.rows_affected() == 0 {
            // dropping the transaction rolls it back
            return Ok(false);
        }

        let updated = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(new_password_hash)
            .bind(&now_text)
            .bind(user_id.to_string())
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}
