use chrono::{DateTime, Utc};
use shared::PredictionResults;
use std::collections::BTreeMap;
use uuid::Uuid;

/// One measurement event for a child.
///
/// `prediction_results` is empty when the record is first stored and is
/// attached afterwards by the prediction step.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthRecord {
    pub record_id: Uuid,
    pub child_id: Uuid,
    pub age_months: i32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub muac_cm: Option<f64>,
    pub bmi: Option<f64>,
    pub diet_diversity_score: i32,
    pub recent_infection: bool,
    pub z_scores_percentiles: Option<BTreeMap<String, f64>>,
    pub prediction_results: Option<PredictionResults>,
    pub recorded_at: DateTime<Utc>,
}

/// BMI in kg/m², rounded to 2 decimals
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    (bmi * 100.0).round() / 100.0
}
