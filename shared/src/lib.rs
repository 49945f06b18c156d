use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Response language preference of a user or a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Swahili,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Swahili => "swahili",
        }
    }

    /// Pick between an English and a Swahili variant of the same text
    pub fn pick<'a>(&self, english: &'a str, swahili: &'a str) -> &'a str {
        match self {
            Language::English => english,
            Language::Swahili => swahili,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "english" => Ok(Language::English),
            "swahili" => Ok(Language::Swahili),
            other => Err(format!("Unsupported language: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Sex::Male),
            "Female" => Ok(Sex::Female),
            other => Err(format!("Unknown sex: {}", other)),
        }
    }
}

/// Yes/No flag as used in the prediction feature payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }
}

/// Malnutrition classification produced by the prediction model.
/// Integer codes follow the model's label encoding (0..=4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MalnutritionStatus {
    Normal,
    Stunting,
    Underweight,
    Overweight,
    Severe,
}

impl MalnutritionStatus {
    pub const ALL: [MalnutritionStatus; 5] = [
        MalnutritionStatus::Normal,
        MalnutritionStatus::Stunting,
        MalnutritionStatus::Underweight,
        MalnutritionStatus::Overweight,
        MalnutritionStatus::Severe,
    ];

    pub fn code(&self) -> u8 {
        match self {
            MalnutritionStatus::Normal => 0,
            MalnutritionStatus::Stunting => 1,
            MalnutritionStatus::Underweight => 2,
            MalnutritionStatus::Overweight => 3,
            MalnutritionStatus::Severe => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MalnutritionStatus::Normal),
            1 => Some(MalnutritionStatus::Stunting),
            2 => Some(MalnutritionStatus::Underweight),
            3 => Some(MalnutritionStatus::Overweight),
            4 => Some(MalnutritionStatus::Severe),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MalnutritionStatus::Normal => "Normal",
            MalnutritionStatus::Stunting => "Stunting",
            MalnutritionStatus::Underweight => "Underweight",
            MalnutritionStatus::Overweight => "Overweight",
            MalnutritionStatus::Severe => "Severe",
        }
    }

    /// Statuses that raise an alert during trend analysis
    pub fn is_concerning(&self) -> bool {
        matches!(
            self,
            MalnutritionStatus::Severe | MalnutritionStatus::Stunting | MalnutritionStatus::Underweight
        )
    }
}

impl fmt::Display for MalnutritionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DevelopmentalRisk {
    #[serde(rename = "No Risk")]
    NoRisk,
    #[serde(rename = "At Risk")]
    AtRisk,
    #[serde(rename = "High Risk")]
    HighRisk,
}

impl DevelopmentalRisk {
    pub fn code(&self) -> u8 {
        match self {
            DevelopmentalRisk::NoRisk => 0,
            DevelopmentalRisk::AtRisk => 1,
            DevelopmentalRisk::HighRisk => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(DevelopmentalRisk::NoRisk),
            1 => Some(DevelopmentalRisk::AtRisk),
            2 => Some(DevelopmentalRisk::HighRisk),
            _ => None,
        }
    }

    /// Risk implied by a malnutrition status when the model gives no risk output
    pub fn derived_from(status: MalnutritionStatus) -> Self {
        match status {
            MalnutritionStatus::Severe => DevelopmentalRisk::HighRisk,
            MalnutritionStatus::Stunting
            | MalnutritionStatus::Underweight
            | MalnutritionStatus::Overweight => DevelopmentalRisk::AtRisk,
            MalnutritionStatus::Normal => DevelopmentalRisk::NoRisk,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DevelopmentalRisk::NoRisk => "No Risk",
            DevelopmentalRisk::AtRisk => "At Risk",
            DevelopmentalRisk::HighRisk => "High Risk",
        }
    }
}

impl fmt::Display for DevelopmentalRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Access/refresh token pair returned by login and refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

/// Generic message response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub language: Language,
    pub created_at: String, // RFC 3339 timestamp
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguagePreferenceRequest {
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageResponse {
    pub language: Language,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Children and growth records
// ---------------------------------------------------------------------------

/// Request for registering a new child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterChildRequest {
    pub name: String,
    pub sex: Sex,
    pub birth_date: String, // ISO 8601 date format (YYYY-MM-DD)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildResponse {
    pub child_id: String,
    pub name: String,
    pub sex: Sex,
    pub birth_date: String, // YYYY-MM-DD
    pub created_at: String, // RFC 3339 timestamp
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildListResponse {
    pub children: Vec<ChildResponse>,
    pub total_count: usize,
}

/// Anthropometric measurement payload for a new growth record.
/// Z-scores and percentiles are optional manual entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreateGrowthRecordRequest {
    pub age_months: i32,
    pub weight_kg: f64,
    pub height_cm: f64,
    #[serde(default)]
    pub muac_cm: Option<f64>,
    pub diet_diversity_score: i32,
    #[serde(default)]
    pub recent_infection: bool,
    #[serde(default)]
    pub weight_for_age_zscore: Option<f64>,
    #[serde(default)]
    pub height_for_age_zscore: Option<f64>,
    #[serde(default)]
    pub bmi_for_age_zscore: Option<f64>,
    #[serde(default)]
    pub muac_for_age_zscore: Option<f64>,
    #[serde(default)]
    pub weight_for_age_percentile: Option<f64>,
    #[serde(default)]
    pub height_for_age_percentile: Option<f64>,
    #[serde(default)]
    pub bmi_for_age_percentile: Option<f64>,
    #[serde(default)]
    pub muac_for_age_percentile: Option<f64>,
}

/// Prediction blob stored on a growth record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResults {
    pub malnutrition_status: MalnutritionStatus,
    pub developmental_risk: DevelopmentalRisk,
    pub timestamp: String, // RFC 3339 timestamp
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRecordResponse {
    pub record_id: String,
    pub child_id: String,
    pub age_months: i32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub muac_cm: Option<f64>,
    pub bmi: Option<f64>,
    pub diet_diversity_score: i32,
    pub recent_infection: bool,
    pub z_scores_percentiles: Option<BTreeMap<String, f64>>,
    pub prediction_results: Option<PredictionResults>,
    pub recorded_at: String,
}

/// Result of creating a growth record and running predictions on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthPredictionResponse {
    pub malnutrition_status: MalnutritionStatus,
    pub developmental_risk: DevelopmentalRisk,
    pub recommendations: Vec<String>,
    pub record_id: String,
    pub bmi_calculated: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildGrowthHistory {
    pub child_info: ChildResponse,
    pub growth_records: Vec<GrowthRecordResponse>,
    pub total_records: usize,
    pub latest_prediction: Option<PredictionResults>,
}

/// A single point of the trend chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthMeasurement {
    pub age_months: i32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub bmi: Option<f64>,
    pub recorded_at: String,
    pub prediction: Option<PredictionResults>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthTrendResponse {
    pub child_id: String,
    pub measurements: Vec<GrowthMeasurement>,
    pub trends: BTreeMap<String, String>, // e.g. {"weight": "increasing", "height": "stable"}
    pub alerts: Vec<String>,
}

// ---------------------------------------------------------------------------
// Model endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatbotRequest {
    pub question: String,
    #[serde(default)]
    pub language: Option<Language>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatbotResponse {
    pub answer: String,
}

/// Child growth feature payload. Field names on the wire match the
/// model's training columns exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(rename = "Age_Months")]
    pub age_months: i32,
    #[serde(rename = "Sex")]
    pub sex: Sex,
    #[serde(rename = "Weight_kg")]
    pub weight_kg: f64,
    #[serde(rename = "Height_cm")]
    pub height_cm: f64,
    #[serde(rename = "HeadCircumference_cm")]
    pub head_circumference_cm: f64,
    #[serde(rename = "MUAC_cm")]
    pub muac_cm: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "Diet_Diversity_Score")]
    pub diet_diversity_score: i32,
    #[serde(rename = "Recent_Infection")]
    pub recent_infection: YesNo,
    #[serde(rename = "Weight_for_Age_ZScore")]
    pub weight_for_age_zscore: f64,
    #[serde(rename = "Height_for_Age_ZScore")]
    pub height_for_age_zscore: f64,
    #[serde(rename = "BMI_for_Age_ZScore")]
    pub bmi_for_age_zscore: f64,
    #[serde(rename = "MUAC_for_Age_ZScore")]
    pub muac_for_age_zscore: f64,
    #[serde(rename = "Weight_for_Age_Percentile")]
    pub weight_for_age_percentile: f64,
    #[serde(rename = "Height_for_Age_Percentile")]
    pub height_for_age_percentile: f64,
    #[serde(rename = "BMI_for_Age_Percentile")]
    pub bmi_for_age_percentile: f64,
    #[serde(rename = "MUAC_for_Age_Percentile")]
    pub muac_for_age_percentile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub malnutrition_status: MalnutritionStatus,
    pub developmental_risk: DevelopmentalRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub malnutrition_status: MalnutritionStatus,
    pub developmental_risk: DevelopmentalRisk,
    #[serde(default)]
    pub language: Option<Language>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisChildInfo {
    pub age_months: i32,
    pub sex: Sex,
    pub weight_kg: f64,
    pub height_cm: f64,
}

/// Combined prediction + recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub prediction: PredictionResponse,
    pub recommendation: String,
    pub child_info: AnalysisChildInfo,
}

// ---------------------------------------------------------------------------
// Service info
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub version: String,
    pub docs_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub app_name: String,
    pub version: String,
}
