use anyhow::{Context, Result};
use shared::PredictionResults;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::models::growth_record::GrowthRecord;
use crate::storage::connection::DbConnection;
use crate::storage::{format_timestamp, parse_timestamp};

/// Repository for growth records.
///
/// Reads join through `children` so that a record is only visible to the
/// parent who owns the child.
#[derive(Clone)]
pub struct GrowthRecordRepository {
    db: DbConnection,
}

impl GrowthRecordRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Store a new growth record inside a transaction
    pub async fn store_record(&self, record: &GrowthRecord) -> Result<()> {
        let z_scores = record
            .z_scores_percentiles
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize z-scores")?;
        let prediction = record
            .prediction_results
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("Failed to serialize prediction results")?;

        let mut tx = self.db.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO growth_records (
                record_id, child_id, age_months, weight_kg, height_cm, muac_cm, bmi,
                diet_diversity_score, recent_infection, z_scores_percentiles,
                prediction_results, recorded_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.record_id.to_string())
        .bind(record.child_id.to_string())
        .bind(record.age_months)
        .bind(record.weight_kg)
        .bind(record.height_cm)
        .bind(record.muac_cm)
        .bind(record.bmi)
        .bind(record.diet_diversity_score)
        .bind(record.recent_infection)
        .bind(z_scores)
        .bind(prediction)
        .bind(format_timestamp(&record.recorded_at))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// List records of a parent's child, newest first.
    /// `limit` of `None` returns every record.
    pub async fn list_records(
        &self,
        child_id: Uuid,
        parent_id: Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<GrowthRecord>> {
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map(i64::from).unwrap_or(-1);

        let rows = sqlx::query(
            r#"
            SELECT r.record_id, r.child_id, r.age_months, r.weight_kg, r.height_cm, r.muac_cm,
                   r.bmi, r.diet_diversity_score, r.recent_infection, r.z_scores_percentiles,
                   r.prediction_results, r.recorded_at
            FROM growth_records r
            JOIN children c ON c.child_id = r.child_id
            WHERE r.child_id = ? AND c.parent_id = ?
            ORDER BY r.recorded_at DESC, r.ROWID DESC
            LIMIT ?
            "#,
        )
        .bind(child_id.to_string())
        .bind(parent_id.to_string())
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Attach prediction results to a record. Returns false when the record is unknown.
    pub async fn update_prediction_results(&self, record_id: Uuid, results: &PredictionResults) -> Result<bool> {
        let blob = serde_json::to_string(results).context("Failed to serialize prediction results")?;

        let result = sqlx::query("UPDATE growth_records SET prediction_results = ? WHERE record_id = ?")
            .bind(blob)
            .bind(record_id.to_string())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_record(row: &SqliteRow) -> Result<GrowthRecord> {
    let record_id: String = row.get("record_id");
    let child_id: String = row.get("child_id");
    let z_scores: Option<String> = row.get("z_scores_percentiles");
    let prediction: Option<String> = row.get("prediction_results");

    Ok(GrowthRecord {
        record_id: Uuid::parse_str(&record_id).with_context(|| format!("Invalid record id: {}", record_id))?,
        child_id: Uuid::parse_str(&child_id).with_context(|| format!("Invalid child id: {}", child_id))?,
        age_months: row.get("age_months"),
        weight_kg: row.get("weight_kg"),
        height_cm: row.get("height_cm"),
        muac_cm: row.get("muac_cm"),
        bmi: row.get("bmi"),
        diet_diversity_score: row.get("diet_diversity_score"),
        recent_infection: row.get("recent_infection"),
        z_scores_percentiles: z_scores
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("Invalid stored z-scores")?,
        prediction_results: prediction
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("Invalid stored prediction results")?,
        recorded_at: parse_timestamp(row.get("recorded_at"))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::growth_record::calculate_bmi;
    use crate::storage::repositories::child_repository::test_support::insert_child;
    use crate::storage::repositories::user_repository::test_support::insert_user;
    use chrono::{Duration, Utc};
    use shared::{DevelopmentalRisk, MalnutritionStatus};
    use std::collections::BTreeMap;

    fn record(child_id: Uuid, age_months: i32, weight_kg: f64, offset_secs: i64) -> GrowthRecord {
        GrowthRecord {
            record_id: Uuid::new_v4(),
            child_id,
            age_months,
            weight_kg,
            height_cm: 80.0,
            muac_cm: None,
            bmi: Some(calculate_bmi(weight_kg, 80.0)),
            diet_diversity_score: 5,
            recent_infection: false,
            z_scores_percentiles: None,
            prediction_results: None,
            recorded_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn test_store_and_list_round_trip() {
        let db = DbConnection::in_memory().await.expect("Failed to create test database");
        let repo = GrowthRecordRepository::new(db.clone());
        let parent = insert_user(&db, "parent@example.com").await;
        let child = insert_child(&db, parent.id, "Amani").await;

        let mut z_scores = BTreeMap::new();
        z_scores.insert("height_for_age_zscore".to_string(), -1.5);
        let original = GrowthRecord {
            muac_cm: Some(13.5),
            recent_infection: true,
            z_scores_percentiles: Some(z_scores),
            ..record(child.child_id, 18, 10.4, 0)
        };
        repo.store_record(&original).await.expect("Failed to store record");

        let records = repo.list_records(child.child_id, parent.id, None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_id, original.record_id);
        assert_eq!(records[0].muac_cm, Some(13.5));
        assert!(records[0].recent_infection);
        assert_eq!(records[0].bmi, original.bmi);
        assert_eq!(records[0].z_scores_percentiles, original.z_scores_percentiles);
        assert!(records[0].prediction_results.is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let db = DbConnection::in_memory().await.expect("Failed to create test database");
        let repo = GrowthRecordRepository::new(db.clone());
        let parent = insert_user(&db, "parent@example.com").await;
        let child = insert_child(&db, parent.id, "Amani").await;

        for (i, age) in [6, 9, 12, 15].iter().enumerate() {
            repo.store_record(&record(child.child_id, *age, 8.0 + i as f64, i as i64)).await.unwrap();
        }

        let ages: Vec<i32> = repo
            .list_records(child.child_id, parent.id, Some(2))
            .await
            .unwrap()
            .iter()
            .map(|r| r.age_months)
            .collect();
        assert_eq!(ages, vec![15, 12]);
    }

    #[tokio::test]
    async fn test_records_hidden_from_other_parent() {
        let db = DbConnection::in_memory().await.expect("Failed to create test database");
        let repo = GrowthRecordRepository::new(db.clone());
        let owner = insert_user(&db, "owner@example.com").await;
        let other = insert_user(&db, "other@example.com").await;
        let child = insert_child(&db, owner.id, "Amani").await;
        repo.store_record(&record(child.child_id, 12, 9.0, 0)).await.unwrap();

        assert!(repo.list_records(child.child_id, other.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_prediction_results() {
        let db = DbConnection::in_memory().await.expect("Failed to create test database");
        let repo = GrowthRecordRepository::new(db.clone());
        let parent = insert_user(&db, "parent@example.com").await;
        let child = insert_child(&db, parent.id, "Amani").await;
        let stored = record(child.child_id, 12, 9.0, 0);
        repo.store_record(&stored).await.unwrap();

        let results = PredictionResults {
            malnutrition_status: MalnutritionStatus::Stunting,
            developmental_risk: DevelopmentalRisk::AtRisk,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        };
        assert!(repo.update_prediction_results(stored.record_id, &results).await.unwrap());
        assert!(!repo.update_prediction_results(Uuid::new_v4(), &results).await.unwrap());

        let records = repo.list_records(child.child_id, parent.id, None).await.unwrap();
        assert_eq!(records[0].prediction_results, Some(results));
    }

    #[tokio::test]
    async fn test_record_for_missing_child_rejected() {
        let db = DbConnection::in_memory().await.expect("Failed to create test database");
        let repo = GrowthRecordRepository::new(db);

        assert!(repo.store_record(&record(Uuid::new_v4(), 12, 9.0, 0)).await.is_err());
    }
}
