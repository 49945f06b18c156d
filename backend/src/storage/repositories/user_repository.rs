use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use shared::Language;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::models::user::User;
use crate::storage::connection::DbConnection;
use crate::storage::{format_timestamp, parse_timestamp};

/// Repository for user accounts
#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Store a new user
    pub async fn store_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, phone, password_hash, is_active, is_verified, language, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.language.as_str())
        .bind(format_timestamp(&user.created_at))
        .bind(format_timestamp(&user.updated_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, phone, password_hash, is_active, is_verified, language, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, phone, password_hash, is_active, is_verified, language, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Update the language preference. Returns false when the user is unknown.
    pub async fn update_language(&self, user_id: Uuid, language: Language, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET language = ?, updated_at = ? WHERE id = ?")
            .bind(language.as_str())
            .bind(format_timestamp(&now))
            .bind(user_id.to_string())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    let id: String = row.get("id");
    let language: String = row.get("language");

    Ok(User {
        id: Uuid::parse_str(&id).with_context(|| format!("Invalid user id: {}", id))?,
        email: row.get("email"),
        name: row.get("name"),
        phone: row.get("phone"),
        password_hash: row.get("password_hash"),
        language: language.parse().map_err(anyhow::Error::msg)?,
        is_active: row.get("is_active"),
        is_verified: row.get("is_verified"),
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Insert a user with a placeholder hash, for repository and service tests
    pub async fn insert_user(db: &DbConnection, email: &str) -> User {
        let now = crate::storage::current_timestamp();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: "Test Parent".to_string(),
            phone: None,
            password_hash: "not-a-real-hash".to_string(),
            language: Language::English,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };
        UserRepository::new(db.clone())
            .store_user(&user)
            .await
            .expect("Failed to store user");
        user
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::insert_user;
    use super::*;

    #[tokio::test]
    async fn test_store_and_get_user() {
        let db = DbConnection::in_memory().await.expect("Failed to create test database");
        let repo = UserRepository::new(db.clone());
        let user = insert_user(&db, "parent@example.com").await;

        let by_id = repo.get_user(user.id).await.expect("query failed").expect("user missing");
        assert_eq!(by_id.email, "parent@example.com");
        assert_eq!(by_id.language, Language::English);
        assert!(by_id.is_active);
        assert!(!by_id.is_verified);

        let by_email = repo
            .get_user_by_email("parent@example.com")
            .await
            .expect("query failed")
            .expect("user missing");
        assert_eq!(by_email.id, user.id);

        assert!(repo.get_user(Uuid::new_v4()).await.expect("query failed").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = DbConnection::in_memory().await.expect("Failed to create test database");
        let user = insert_user(&db, "dup@example.com").await;

        let duplicate = User { id: Uuid::new_v4(), ..user };
        assert!(UserRepository::new(db).store_user(&duplicate).await.is_err());
    }

    #[tokio::test]
    async fn test_update_language() {
        let db = DbConnection::in_memory().await.expect("Failed to create test database");
        let repo = UserRepository::new(db.clone());
        let user = insert_user(&db, "lang@example.com").await;

        assert!(repo.update_language(user.id, Language::Swahili, Utc::now()).await.unwrap());
        let stored = repo.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.language, Language::Swahili);

        assert!(!repo.update_language(Uuid::new_v4(), Language::Swahili, Utc::now()).await.unwrap());
    }
}
