use serde::de::DeserializeOwned;
use shared::{DevelopmentalRisk, Language, MalnutritionStatus};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, error, info, warn};

use super::artifacts::{ChatbotArtifact, PredictionArtifact, RecommendationArtifact};
use super::{fallback, FeatureVector, ModelError, NutritionModels, Prediction};

pub const PREDICTION_MODEL_FILE: &str = "prediction_model.json";
pub const RECOMMENDATION_MODEL_FILE: &str = "recommendation_model.json";
pub const CHATBOT_MODEL_FILE: &str = "chatbot_model.json";

/// Models read from a directory of artifacts.
///
/// Each capability is independent: a missing artifact, or one that fails at
/// inference time, only sends that capability to the rule-based fallback.
#[derive(Debug, Clone, Default)]
pub struct LoadedModels {
    prediction: Option<PredictionArtifact>,
    recommendation: Option<RecommendationArtifact>,
    chatbot: Option<ChatbotArtifact>,
}

impl LoadedModels {
    /// Load every artifact found in `dir`. Missing files are skipped with a
    /// warning; unreadable or invalid files are an error.
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        info!("Loading models from {}", dir.display());

        let prediction = read_artifact::<PredictionArtifact>(dir, PREDICTION_MODEL_FILE)?;
        if let Some(artifact) = &prediction {
            artifact.validate().map_err(|reason| ModelError::Invalid {
                path: dir.join(PREDICTION_MODEL_FILE),
                reason,
            })?;
        }

        let recommendation = read_artifact::<RecommendationArtifact>(dir, RECOMMENDATION_MODEL_FILE)?;
        if let Some(artifact) = &recommendation {
            artifact.validate().map_err(|reason| ModelError::Invalid {
                path: dir.join(RECOMMENDATION_MODEL_FILE),
                reason,
            })?;
        }

        let mut chatbot = read_artifact::<ChatbotArtifact>(dir, CHATBOT_MODEL_FILE)?;
        if let Some(artifact) = chatbot.as_mut() {
            artifact.normalize().map_err(|reason| ModelError::Invalid {
                path: dir.join(CHATBOT_MODEL_FILE),
                reason,
            })?;
        }

        let models = Self {
            prediction,
            recommendation,
            chatbot,
        };
        info!(
            prediction = models.prediction.is_some(),
            recommendation = models.recommendation.is_some(),
            chatbot = models.chatbot.is_some(),
            "Model loading complete"
        );
        Ok(models)
    }
}

fn read_artifact<T: DeserializeOwned>(dir: &Path, file_name: &str) -> Result<Option<T>, ModelError> {
    let path = dir.join(file_name);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Model artifact not found at {}, using fallback", path.display());
            return Ok(None);
        }
        Err(source) => return Err(ModelError::Io { path, source }),
    };
    let artifact = serde_json::from_str(&contents).map_err(|source| ModelError::Parse {
        path: path.clone(),
        source,
    })?;

    info!("Loaded model artifact {}", path.display());
    Ok(Some(artifact))
}

impl NutritionModels for LoadedModels {
    fn predict(&self, features: &FeatureVector) -> Prediction {
        let Some(model) = &self.prediction else {
            return fallback::predict(features);
        };

        match model.predict(&features.encode()) {
            Ok((status_code, risk_code)) => Prediction::from_codes(status_code, risk_code),
            Err(e) => {
                error!("Prediction model failed, using rules: {}", e);
                fallback::predict(features)
            }
        }
    }

    fn recommend(&self, status: MalnutritionStatus, risk: DevelopmentalRisk, language: Language) -> String {
        // model output is English only
        if language == Language::Swahili {
            return fallback::recommendation(status, risk, language).to_string();
        }
        let Some(model) = &self.recommendation else {
            return fallback::recommendation(status, risk, language).to_string();
        };

        match model.recommend([status.code(), risk.code()]) {
            Ok(text) => text.to_string(),
            Err(e) => {
                error!("Recommendation model failed, using table: {}", e);
                fallback::recommendation(status, risk, language).to_string()
            }
        }
    }

    fn answer(&self, question: &str, language: Language) -> String {
        if language == Language::Swahili {
            return fallback::chatbot_answer(question, language).to_string();
        }
        let Some(model) = &self.chatbot else {
            return fallback::chatbot_answer(question, language).to_string();
        };

        match model.answer(question) {
            Ok(answer) => answer.to_string(),
            Err(e) => {
                debug!("Chatbot model had no answer, using fallback: {}", e);
                fallback::chatbot_answer(question, language).to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::test_support::normal_features;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).expect("Failed to write artifact");
    }

    /// A classifier that always answers Overweight / High Risk
    fn fixed_prediction_json() -> String {
        let row = format!("[{}]", vec!["0.0"; 17].join(","));
        let rows = |n: usize| vec![row.clone(); n].join(",");
        format!(
            r#"{{
                "malnutrition": {{"weights": [{}], "bias": [0, 0, 0, 1, 0]}},
                "risk": {{"weights": [{}], "bias": [0, 0, 1]}}
            }}"#,
            rows(5),
            rows(3)
        )
    }

    #[test]
    fn test_empty_directory_uses_fallback() {
        let dir = TempDir::new().unwrap();
        let models = LoadedModels::load(dir.path()).expect("missing artifacts are not an error");

        let features = FeatureVector {
            height_for_age_zscore: -2.5,
            ..normal_features()
        };
        assert_eq!(models.predict(&features).malnutrition_status, MalnutritionStatus::Stunting);
        assert!(models
            .recommend(MalnutritionStatus::Normal, DevelopmentalRisk::NoRisk, Language::English)
            .contains("growing well"));
    }

    #[test]
    fn test_loaded_artifacts_are_used() {
        let dir = TempDir::new().unwrap();
        write(&dir, PREDICTION_MODEL_FILE, &fixed_prediction_json());
        write(
            &dir,
            RECOMMENDATION_MODEL_FILE,
            r#"{"entries": [{"input": [3, 2], "text": "Model advice for overweight children."}]}"#,
        );
        write(
            &dir,
            CHATBOT_MODEL_FILE,
            r#"{"intents": [{"keywords": ["sleep"], "answer": "Toddlers need 11 to 14 hours of sleep."}]}"#,
        );

        let models = LoadedModels::load(dir.path()).unwrap();

        let prediction = models.predict(&normal_features());
        assert_eq!(prediction.malnutrition_status, MalnutritionStatus::Overweight);
        assert_eq!(prediction.developmental_risk, DevelopmentalRisk::HighRisk);

        assert_eq!(
            models.recommend(MalnutritionStatus::Overweight, DevelopmentalRisk::HighRisk, Language::English),
            "Model advice for overweight children."
        );
        assert!(models.answer("How much sleep?", Language::English).starts_with("Toddlers"));
    }

    #[test]
    fn test_model_miss_falls_back_per_capability() {
        let dir = TempDir::new().unwrap();
        write(&dir, RECOMMENDATION_MODEL_FILE, r#"{"entries": []}"#);
        write(&dir, CHATBOT_MODEL_FILE, r#"{"intents": []}"#);
        let models = LoadedModels::load(dir.path()).unwrap();

        assert!(models
            .recommend(MalnutritionStatus::Normal, DevelopmentalRisk::NoRisk, Language::English)
            .contains("growing well"));
        assert!(models.answer("What food is best?", Language::English).contains("variety of foods"));
    }

    #[test]
    fn test_swahili_ignores_model_text() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            RECOMMENDATION_MODEL_FILE,
            r#"{"entries": [], "default": "English model text that must not be returned."}"#,
        );
        write(&dir, CHATBOT_MODEL_FILE, r#"{"intents": [], "default": "English chatbot text."}"#);
        let models = LoadedModels::load(dir.path()).unwrap();

        let text = models.recommend(MalnutritionStatus::Normal, DevelopmentalRisk::NoRisk, Language::Swahili);
        assert!(text.contains("anakua vizuri"));
        assert_ne!(models.answer("chakula", Language::Swahili), "English chatbot text.");
        assert_eq!(models.answer("chakula", Language::English), "English chatbot text.");
    }

    #[test]
    fn test_invalid_artifacts_fail_to_load() {
        let dir = TempDir::new().unwrap();
        write(&dir, PREDICTION_MODEL_FILE, "not json");
        assert!(matches!(LoadedModels::load(dir.path()), Err(ModelError::Parse { .. })));

        write(&dir, PREDICTION_MODEL_FILE, r#"{"malnutrition": {"weights": [[1.0, 2.0]], "bias": [0.0]}}"#);
        assert!(matches!(LoadedModels::load(dir.path()), Err(ModelError::Invalid { .. })));
    }

    #[test]
    fn test_unreadable_artifact_is_an_error() {
        let dir = TempDir::new().unwrap();
        // present but not a readable file
        fs::create_dir(dir.path().join(CHATBOT_MODEL_FILE)).unwrap();

        match LoadedModels::load(dir.path()) {
            Err(ModelError::Io { path, .. }) => assert!(path.ends_with(CHATBOT_MODEL_FILE)),
            other => panic!("expected an IO error, got {:?}", other.map(|_| ())),
        }
    }
}
