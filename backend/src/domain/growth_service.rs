use chrono::Utc;
use shared::{CreateGrowthRecordRequest, PredictionResults, Sex};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::child_service::child_not_found;
use crate::domain::models::child::Child;
use crate::domain::models::growth_record::{calculate_bmi, GrowthRecord};
use crate::domain::models::user::User;
use crate::domain::trend_analysis::{analyze_trends, TrendAnalysis, TREND_WINDOW};
use crate::error::{AppError, ValidationErrors};
use crate::ml::{FeatureVector, NutritionModels, Prediction};
use crate::storage::{current_timestamp, format_timestamp, ChildRepository, DbConnection, GrowthRecordRepository};

/// Recent measurements returned alongside a trend analysis
const MEASUREMENT_WINDOW: u32 = 10;

pub const DEFAULT_HEAD_CIRCUMFERENCE_CM: f64 = 45.0;
pub const DEFAULT_MUAC_CM: f64 = 14.0;
pub const DEFAULT_ZSCORE: f64 = 0.0;
pub const DEFAULT_PERCENTILE: f64 = 50.0;

/// A stored record with the prediction and advice produced for it
#[derive(Debug, Clone)]
pub struct RecordedPrediction {
    pub record: GrowthRecord,
    pub prediction: Prediction,
    pub recommendation: String,
}

#[derive(Debug, Clone)]
pub struct ChildHistory {
    pub child: Child,
    /// Newest first
    pub records: Vec<GrowthRecord>,
}

impl ChildHistory {
    pub fn latest_prediction(&self) -> Option<&PredictionResults> {
        self.records.first().and_then(|r| r.prediction_results.as_ref())
    }
}

#[derive(Debug, Clone)]
pub struct GrowthTrends {
    pub child_id: Uuid,
    /// Sorted by age, youngest first
    pub measurements: Vec<GrowthRecord>,
    pub analysis: TrendAnalysis,
}

/// Growth record ingestion, prediction and trend analysis for a parent's children
#[derive(Clone)]
pub struct GrowthService {
    child_repository: ChildRepository,
    record_repository: GrowthRecordRepository,
    models: Arc<dyn NutritionModels>,
}

impl GrowthService {
    pub fn new(db: DbConnection, models: Arc<dyn NutritionModels>) -> Self {
        Self {
            child_repository: ChildRepository::new(db.clone()),
            record_repository: GrowthRecordRepository::new(db),
            models,
        }
    }

    /// Validate and store a measurement for one of the parent's children
    pub async fn create_record(
        &self,
        parent: &User,
        child_id: Uuid,
        request: &CreateGrowthRecordRequest,
    ) -> Result<GrowthRecord, AppError> {
        let child = self.owned_child(parent, child_id).await?;
        self.store_record(parent, &child, request).await
    }

    /// Store a measurement, predict on it, and attach the prediction to the record
    pub async fn record_and_predict(
        &self,
        parent: &User,
        child_id: Uuid,
        request: &CreateGrowthRecordRequest,
    ) -> Result<RecordedPrediction, AppError> {
        info!("Creating growth record for child {}, user {}", child_id, parent.id);

        let child = self.owned_child(parent, child_id).await?;
        let mut record = self.store_record(parent, &child, request).await?;

        let features = assemble_features(&record, child.sex);
        let prediction = self.models.predict(&features);
        let recommendation = self.models.recommend(
            prediction.malnutrition_status,
            prediction.developmental_risk,
            parent.language,
        );

        let results = PredictionResults {
            malnutrition_status: prediction.malnutrition_status,
            developmental_risk: prediction.developmental_risk,
            timestamp: format_timestamp(&Utc::now()),
        };
        match self.record_repository.update_prediction_results(record.record_id, &results).await {
            Ok(true) => record.prediction_results = Some(results),
            Ok(false) => warn!("Growth record {} vanished before predictions were saved", record.record_id),
            Err(e) => error!("Failed to save predictions for record {}: {:#}", record.record_id, e),
        }

        info!(
            "Growth record {} for child {}: {}, {}",
            record.record_id, child_id, prediction.malnutrition_status, prediction.developmental_risk
        );

        Ok(RecordedPrediction {
            record,
            prediction,
            recommendation,
        })
    }

    /// The child with all its records, newest first
    pub async fn history(&self, parent: &User, child_id: Uuid) -> Result<ChildHistory, AppError> {
        info!("Fetching growth history for child {}, user {}", child_id, parent.id);

        let child = self.owned_child(parent, child_id).await?;
        let records = self
            .record_repository
            .list_records(child_id, parent.id, None)
            .await
            .map_err(AppError::internal(parent.language.pick(
                "Failed to fetch child history",
                "Imeshindwa kupata historia ya mtoto",
            )))?;

        Ok(ChildHistory { child, records })
    }

    pub async fn trends(&self, parent: &User, child_id: Uuid) -> Result<GrowthTrends, AppError> {
        info!("Analyzing growth trends for child {}, user {}", child_id, parent.id);

        self.owned_child(parent, child_id).await?;
        let failure = parent.language.pick(
            "Failed to analyze growth trends",
            "Imeshindwa kuchambua mienendo ya ukuaji",
        );

        let window = self
            .record_repository
            .list_records(child_id, parent.id, Some(TREND_WINDOW))
            .await
            .map_err(AppError::internal(failure))?;
        let analysis = analyze_trends(&window);

        let mut measurements = self
            .record_repository
            .list_records(child_id, parent.id, Some(MEASUREMENT_WINDOW))
            .await
            .map_err(AppError::internal(failure))?;
        measurements.sort_by_key(|r| r.age_months);

        Ok(GrowthTrends {
            child_id,
            measurements,
            analysis,
        })
    }

    async fn owned_child(&self, parent: &User, child_id: Uuid) -> Result<Child, AppError> {
        let child = self
            .child_repository
            .get_child_for_parent(child_id, parent.id)
            .await
            .map_err(AppError::internal(parent.language.pick(
                "Failed to fetch child",
                "Imeshindwa kupata mtoto",
            )))?;

        child.ok_or_else(|| {
            warn!("Child {} not found for user {}", child_id, parent.id);
            child_not_found(parent)
        })
    }

    async fn store_record(
        &self,
        parent: &User,
        child: &Child,
        request: &CreateGrowthRecordRequest,
    ) -> Result<GrowthRecord, AppError> {
        validate_measurements(request)?;

        let record = GrowthRecord {
            record_id: Uuid::new_v4(),
            child_id: child.child_id,
            age_months: request.age_months,
            weight_kg: request.weight_kg,
            height_cm: request.height_cm,
            muac_cm: request.muac_cm,
            bmi: Some(calculate_bmi(request.weight_kg, request.height_cm)),
            diet_diversity_score: request.diet_diversity_score,
            recent_infection: request.recent_infection,
            z_scores_percentiles: provided_z_scores(request),
            prediction_results: None,
            recorded_at: current_timestamp(),
        };

        self.record_repository
            .store_record(&record)
            .await
            .map_err(AppError::internal(parent.language.pick(
                "Failed to create growth record",
                "Imeshindwa kutengeneza rekodi ya ukuaji",
            )))?;

        info!("Stored growth record {} (BMI {:?})", record.record_id, record.bmi);
        Ok(record)
    }
}

/// Range checks for a measurement payload; every failing field is reported
pub fn validate_measurements(request: &CreateGrowthRecordRequest) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();

    errors.check_range("age_months", request.age_months, 0, 60);
    errors.check_positive_max("weight_kg", request.weight_kg, 50.0);
    errors.check_positive_max("height_cm", request.height_cm, 150.0);
    if let Some(muac) = request.muac_cm {
        errors.check_positive_max("muac_cm", muac, 30.0);
    }
    errors.check_range("diet_diversity_score", request.diet_diversity_score, 0, 10);

    for (field, value) in z_score_fields(request) {
        if let Some(value) = value {
            errors.check_range(field, value, -5.0, 5.0);
        }
    }
    for (field, value) in percentile_fields(request) {
        if let Some(value) = value {
            errors.check_range(field, value, 0.0, 100.0);
        }
    }

    errors.into_result()
}

fn z_score_fields(request: &CreateGrowthRecordRequest) -> [(&'static str, Option<f64>); 4] {
    [
        ("weight_for_age_zscore", request.weight_for_age_zscore),
        ("height_for_age_zscore", request.height_for_age_zscore),
        ("bmi_for_age_zscore", request.bmi_for_age_zscore),
        ("muac_for_age_zscore", request.muac_for_age_zscore),
    ]
}

fn percentile_fields(request: &CreateGrowthRecordRequest) -> [(&'static str, Option<f64>); 4] {
    [
        ("weight_for_age_percentile", request.weight_for_age_percentile),
        ("height_for_age_percentile", request.height_for_age_percentile),
        ("bmi_for_age_percentile", request.bmi_for_age_percentile),
        ("muac_for_age_percentile", request.muac_for_age_percentile),
    ]
}

/// Only the z-scores and percentiles that were supplied; `None` if there were none
fn provided_z_scores(request: &CreateGrowthRecordRequest) -> Option<BTreeMap<String, f64>> {
    let provided: BTreeMap<String, f64> = z_score_fields(request)
        .into_iter()
        .chain(percentile_fields(request))
        .filter_map(|(field, value)| value.map(|v| (field.to_string(), v)))
        .collect();

    if provided.is_empty() {
        None
    } else {
        Some(provided)
    }
}

/// Build the model input for a stored record, filling gaps with neutral defaults
pub fn assemble_features(record: &GrowthRecord, sex: Sex) -> FeatureVector {
    let stored = |key: &str, default: f64| {
        record
            .z_scores_percentiles
            .as_ref()
            .and_then(|m| m.get(key).copied())
            .unwrap_or(default)
    };

    FeatureVector {
        age_months: record.age_months,
        sex,
        weight_kg: record.weight_kg,
        height_cm: record.height_cm,
        head_circumference_cm: DEFAULT_HEAD_CIRCUMFERENCE_CM,
        muac_cm: record.muac_cm.unwrap_or(DEFAULT_MUAC_CM),
        bmi: record
            .bmi
            .unwrap_or_else(|| calculate_bmi(record.weight_kg, record.height_cm)),
        diet_diversity_score: record.diet_diversity_score,
        recent_infection: record.recent_infection,
        weight_for_age_zscore: stored("weight_for_age_zscore", DEFAULT_ZSCORE),
        height_for_age_zscore: stored("height_for_age_zscore", DEFAULT_ZSCORE),
        bmi_for_age_zscore: stored("bmi_for_age_zscore", DEFAULT_ZSCORE),
        muac_for_age_zscore: stored("muac_for_age_zscore", DEFAULT_ZSCORE),
        weight_for_age_percentile: stored("weight_for_age_percentile", DEFAULT_PERCENTILE),
        height_for_age_percentile: stored("height_for_age_percentile", DEFAULT_PERCENTILE),
        bmi_for_age_percentile: stored("bmi_for_age_percentile", DEFAULT_PERCENTILE),
        muac_for_age_percentile: stored("muac_for_age_percentile", DEFAULT_PERCENTILE),
    }
}
