use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::info;

/// DbConnection owns the SQLite connection pool shared by all repositories
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("Creating database at {}", url);
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Open a private in-memory database.
    ///
    /// The pool is pinned to a single connection that never expires, since
    /// every SQLite in-memory connection would otherwise see its own empty
    /// database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        // Create users table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                phone TEXT,
                password_hash TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                is_verified BOOLEAN NOT NULL DEFAULT FALSE,
                language TEXT NOT NULL DEFAULT 'english',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Create revoked_tokens table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS revoked_tokens (
                jti TEXT PRIMARY KEY,
                token_type TEXT NOT NULL,
                user_id TEXT NOT NULL,
                revoked_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Index for cleanup of expired revocations
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_revoked_tokens_expires_at
            ON revoked_tokens(expires_at);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_revoked_tokens_user_id
            ON revoked_tokens(user_id);
            "#,
        )
        .execute(pool)
        .await?;

        // Create password_reset_tokens table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS password_reset_tokens (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                token_hash TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                used_at TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_password_reset_token_hash
            ON password_reset_tokens(token_hash);
            "#,
        )
        .execute(pool)
        .await?;

        // Create children table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS children (
                child_id TEXT PRIMARY KEY,
                parent_id TEXT NOT NULL,
                name TEXT NOT NULL,
                sex TEXT NOT NULL CHECK (sex IN ('Male', 'Female')),
                birth_date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (parent_id) REFERENCES users (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Index for listing children by parent
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_children_parent_id
            ON children(parent_id);
            "#,
        )
        .execute(pool)
        .await?;

        // Create growth_records table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS growth_records (
                record_id TEXT PRIMARY KEY,
                child_id TEXT NOT NULL,
                age_months INTEGER NOT NULL,
                weight_kg REAL NOT NULL,
                height_cm REAL NOT NULL,
                muac_cm REAL,
                bmi REAL,
                diet_diversity_score INTEGER NOT NULL,
                recent_infection BOOLEAN NOT NULL DEFAULT FALSE,
                z_scores_percentiles TEXT,
                prediction_results TEXT,
                recorded_at TEXT NOT NULL,
                FOREIGN KEY (child_id) REFERENCES children (child_id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Index for history queries (newest first per child)
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_growth_records_child_recorded
            ON growth_records(child_id, recorded_at DESC);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_growth_records_age
            ON growth_records(age_months);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}
