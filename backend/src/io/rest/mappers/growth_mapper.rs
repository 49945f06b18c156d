use shared::{
    ChildGrowthHistory, GrowthMeasurement, GrowthPredictionResponse, GrowthRecordResponse, GrowthTrendResponse,
    Language,
};

use crate::domain::growth_service::{ChildHistory, GrowthTrends, RecordedPrediction};
use crate::domain::models::growth_record::GrowthRecord;
use crate::io::rest::mappers::ChildMapper;
use crate::storage::format_timestamp;

/// Mapper from growth records and their derived views to the shared DTOs
pub struct GrowthMapper;

impl GrowthMapper {
    pub fn to_record_dto(record: &GrowthRecord) -> GrowthRecordResponse {
        GrowthRecordResponse {
            record_id: record.record_id.to_string(),
            child_id: record.child_id.to_string(),
            age_months: record.age_months,
            weight_kg: record.weight_kg,
            height_cm: record.height_cm,
            muac_cm: record.muac_cm,
            bmi: record.bmi,
            diet_diversity_score: record.diet_diversity_score,
            recent_infection: record.recent_infection,
            z_scores_percentiles: record.z_scores_percentiles.clone(),
            prediction_results: record.prediction_results.clone(),
            recorded_at: format_timestamp(&record.recorded_at),
        }
    }

    pub fn to_prediction_dto(recorded: &RecordedPrediction) -> GrowthPredictionResponse {
        GrowthPredictionResponse {
            malnutrition_status: recorded.prediction.malnutrition_status,
            developmental_risk: recorded.prediction.developmental_risk,
            recommendations: split_sentences(&recorded.recommendation),
            record_id: recorded.record.record_id.to_string(),
            bmi_calculated: recorded.record.bmi,
        }
    }

    pub fn to_history_dto(history: &ChildHistory) -> ChildGrowthHistory {
        ChildGrowthHistory {
            child_info: ChildMapper::to_dto(&history.child),
            growth_records: history.records.iter().map(Self::to_record_dto).collect(),
            total_records: history.records.len(),
            latest_prediction: history.latest_prediction().cloned(),
        }
    }

    pub fn to_trend_dto(trends: &GrowthTrends, language: Language) -> GrowthTrendResponse {
        GrowthTrendResponse {
            child_id: trends.child_id.to_string(),
            measurements: trends.measurements.iter().map(Self::to_measurement).collect(),
            trends: trends.analysis.trends(),
            alerts: trends.analysis.alert_messages(language),
        }
    }

    fn to_measurement(record: &GrowthRecord) -> GrowthMeasurement {
        GrowthMeasurement {
            age_months: record.age_months,
            weight_kg: record.weight_kg,
            height_cm: record.height_cm,
            bmi: record.bmi,
            recorded_at: format_timestamp(&record.recorded_at),
            prediction: record.prediction_results.clone(),
        }
    }
}

/// Recommendation text as a list of sentences, without their periods
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(str::to_string)
        .collect()
}
