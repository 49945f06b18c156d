use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::models::child::Child;
use crate::storage::connection::DbConnection;
use crate::storage::{format_timestamp, parse_timestamp};

/// Repository for child profiles. Lookups are always scoped by parent.
#[derive(Clone)]
pub struct ChildRepository {
    db: DbConnection,
}

impl ChildRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Store a new child
    pub async fn store_child(&self, child: &Child) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO children (child_id, parent_id, name, sex, birth_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(child.child_id.to_string())
        .bind(child.parent_id.to_string())
        .bind(&child.name)
        .bind(child.sex.as_str())
        .bind(child.birth_date.format("%Y-%m-%d").to_string())
        .bind(format_timestamp(&child.created_at))
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Get a child only if it belongs to the given parent
    pub async fn get_child_for_parent(&self, child_id: Uuid, parent_id: Uuid) -> Result<Option<Child>> {
        let row = sqlx::query(
            r#"
            SELECT child_id, parent_id, name, sex, birth_date, created_at
            FROM children
            WHERE child_id = ? AND parent_id = ?
            "#,
        )
        .bind(child_id.to_string())
        .bind(parent_id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(row_to_child).transpose()
    }

    /// List a parent's children, newest first
    pub async fn list_children_for_parent(&self, parent_id: Uuid) -> Result<Vec<Child>> {
        let rows = sqlx::query(
            r#"
            SELECT child_id, parent_id, name, sex, birth_date, created_at
            FROM children
            WHERE parent_id = ?
            ORDER BY created_at DESC, ROWID DESC
            "#,
        )
        .bind(parent_id.to_string())
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(row_to_child).collect()
    }
}

fn row_to_child(row: &SqliteRow) -> Result<Child> {
    let child_id: String = row.get("child_id");
    let parent_id: String = row.get("parent_id");
    let sex: String = row.get("sex");
    let birth_date: String = row.get("birth_date");

    Ok(Child {
        child_id: Uuid::parse_str(&child_id).with_context(|| format!("Invalid child id: {}", child_id))?,
        parent_id: Uuid::parse_str(&parent_id).with_context(|| format!("Invalid parent id: {}", parent_id))?,
        name: row.get("name"),
        sex: sex.parse().map_err(anyhow::Error::msg)?,
        birth_date: NaiveDate::parse_from_str(&birth_date, "%Y-%m-%d")
            .with_context(|| format!("Invalid stored birth date: {}", birth_date))?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use shared::Sex;

    /// Insert a child owned by `parent_id`
    pub async fn insert_child(db: &DbConnection, parent_id: Uuid, name: &str) -> Child {
        let child = Child {
            child_id: Uuid::new_v4(),
            parent_id,
            name: name.to_string(),
            sex: Sex::Female,
            birth_date: NaiveDate::from_ymd_opt(2023, 3, 14).expect("valid date"),
            created_at: crate::storage::current_timestamp(),
        };
        ChildRepository::new(db.clone())
            .store_child(&child)
            .await
            .expect("Failed to store child");
        child
    }
}
