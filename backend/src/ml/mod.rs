//! # Model Layer
//!
//! Pre-trained models are opaque functions behind the [`NutritionModels`]
//! capability:
//!
//! - **fallback.rs** - rule-based prediction and static bilingual text tables
//! - **artifacts.rs** - deserialized model artifacts, validated at load time
//! - **loader.rs** - [`LoadedModels`], which reads artifacts from a directory
//!   and falls back per capability when one is missing or fails
//!
//! Model failures never leave this module. Every capability always returns
//! an answer, from the fallback if necessary.

pub mod artifacts;
pub mod fallback;
pub mod loader;

use shared::{DevelopmentalRisk, Language, MalnutritionStatus, PredictionRequest, Sex, YesNo};
use std::path::PathBuf;
use thiserror::Error;

pub use fallback::FallbackModels;
pub use loader::LoadedModels;

pub const FEATURE_COUNT: usize = 17;

/// Feature names in the order the classifier expects them
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Age_Months",
    "Sex",
    "Weight_kg",
    "Height_cm",
    "HeadCircumference_cm",
    "MUAC_cm",
    "BMI",
    "Diet_Diversity_Score",
    "Recent_Infection",
    "Weight_for_Age_ZScore",
    "Height_for_Age_ZScore",
    "BMI_for_Age_ZScore",
    "MUAC_for_Age_ZScore",
    "Weight_for_Age_Percentile",
    "Height_for_Age_Percentile",
    "BMI_for_Age_Percentile",
    "MUAC_for_Age_Percentile",
];

/// The 17 model inputs for one child at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub age_months: i32,
    pub sex: Sex,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub head_circumference_cm: f64,
    pub muac_cm: f64,
    pub bmi: f64,
    pub diet_diversity_score: i32,
    pub recent_infection: bool,
    pub weight_for_age_zscore: f64,
    pub height_for_age_zscore: f64,
    pub bmi_for_age_zscore: f64,
    pub muac_for_age_zscore: f64,
    pub weight_for_age_percentile: f64,
    pub height_for_age_percentile: f64,
    pub bmi_for_age_percentile: f64,
    pub muac_for_age_percentile: f64,
}

impl FeatureVector {
    /// Numeric encoding in `FEATURE_NAMES` order. Male and a recent
    /// infection encode as 1, otherwise 0.
    pub fn encode(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.age_months),
            if self.sex == Sex::Male { 1.0 } else { 0.0 },
            self.weight_kg,
            self.height_cm,
            self.head_circumference_cm,
            self.muac_cm,
            self.bmi,
            f64::from(self.diet_diversity_score),
            if self.recent_infection { 1.0 } else { 0.0 },
            self.weight_for_age_zscore,
            self.height_for_age_zscore,
            self.bmi_for_age_zscore,
            self.muac_for_age_zscore,
            self.weight_for_age_percentile,
            self.height_for_age_percentile,
            self.bmi_for_age_percentile,
            self.muac_for_age_percentile,
        ]
    }
}

impl From<&PredictionRequest> for FeatureVector {
    fn from(request: &PredictionRequest) -> Self {
        Self {
            age_months: request.age_months,
            sex: request.sex,
            weight_kg: request.weight_kg,
            height_cm: request.height_cm,
            head_circumference_cm: request.head_circumference_cm,
            muac_cm: request.muac_cm,
            bmi: request.bmi,
            diet_diversity_score: request.diet_diversity_score,
            recent_infection: request.recent_infection == YesNo::Yes,
            weight_for_age_zscore: request.weight_for_age_zscore,
            height_for_age_zscore: request.height_for_age_zscore,
            bmi_for_age_zscore: request.bmi_for_age_zscore,
            muac_for_age_zscore: request.muac_for_age_zscore,
            weight_for_age_percentile: request.weight_for_age_percentile,
            height_for_age_percentile: request.height_for_age_percentile,
            bmi_for_age_percentile: request.bmi_for_age_percentile,
            muac_for_age_percentile: request.muac_for_age_percentile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    pub malnutrition_status: MalnutritionStatus,
    pub developmental_risk: DevelopmentalRisk,
}

impl Prediction {
    /// Map raw classifier codes to labels. Unknown codes become
    /// Normal / No Risk; a missing risk code is derived from the status.
    pub fn from_codes(status_code: i64, risk_code: Option<i64>) -> Self {
        let malnutrition_status = MalnutritionStatus::from_code(status_code).unwrap_or(MalnutritionStatus::Normal);
        let developmental_risk = match risk_code {
            Some(code) => DevelopmentalRisk::from_code(code).unwrap_or(DevelopmentalRisk::NoRisk),
            None => DevelopmentalRisk::derived_from(malnutrition_status),
        };
        Self {
            malnutrition_status,
            developmental_risk,
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid model artifact {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("Model inference failed: {0}")]
    Inference(String),
}

/// Prediction, recommendation and chatbot capability shared by all requests
pub trait NutritionModels: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Prediction;

    fn recommend(&self, status: MalnutritionStatus, risk: DevelopmentalRisk, language: Language) -> String;

    fn answer(&self, question: &str, language: Language) -> String;
}
