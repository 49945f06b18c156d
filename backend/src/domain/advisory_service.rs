//! Direct access to the models: chatbot questions, ad-hoc predictions and
//! recommendations that are not tied to a stored growth record.

use shared::{
    ChatbotRequest, DevelopmentalRisk, Language, MalnutritionStatus, PredictionRequest, RecommendationRequest,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::models::user::User;
use crate::error::{AppError, ValidationErrors};
use crate::ml::{FeatureVector, NutritionModels, Prediction};

const MAX_QUESTION_LENGTH: usize = 500;
const MIN_ANSWER_LENGTH: usize = 10;
const MIN_RECOMMENDATION_LENGTH: usize = 20;

#[derive(Clone)]
pub struct AdvisoryService {
    models: Arc<dyn NutritionModels>,
}

impl AdvisoryService {
    pub fn new(models: Arc<dyn NutritionModels>) -> Self {
        Self { models }
    }

    pub fn answer_question(&self, user: &User, request: &ChatbotRequest) -> Result<String, AppError> {
        let language = request.language.unwrap_or(user.language);

        let length = request.question.chars().count();
        if length == 0 || length > MAX_QUESTION_LENGTH {
            return Err(AppError::validation_field(
                "question",
                format!("must be between 1 and {} characters", MAX_QUESTION_LENGTH),
            ));
        }

        info!(
            "Chatbot question from user {}: {}",
            user.id,
            request.question.chars().take(50).collect::<String>()
        );

        let answer = self.models.answer(&request.question, language);
        if answer.trim().chars().count() < MIN_ANSWER_LENGTH {
            error!("Chatbot produced an unusable answer for user {}", user.id);
            return Err(AppError::Internal(
                language
                    .pick(
                        "Unable to generate a proper response. Please try again.",
                        "Imeshindwa kutoa jibu sahihi. Tafadhali jaribu tena.",
                    )
                    .to_string(),
            ));
        }

        info!("Chatbot response generated for user {} in {}", user.id, language);
        Ok(answer)
    }

    pub fn predict(&self, user: &User, request: &PredictionRequest) -> Result<Prediction, AppError> {
        info!(
            "Prediction request from user {} for {} month old {}",
            user.id,
            request.age_months,
            request.sex.as_str()
        );

        validate_features(request)?;
        let prediction = self.models.predict(&FeatureVector::from(request));

        info!(
            "Prediction completed for user {}: {}, {}",
            user.id, prediction.malnutrition_status, prediction.developmental_risk
        );
        Ok(prediction)
    }

    pub fn recommend(&self, user: &User, request: &RecommendationRequest) -> Result<String, AppError> {
        let language = request.language.unwrap_or(user.language);
        info!(
            "Recommendation request from user {}: {}, {}",
            user.id, request.malnutrition_status, request.developmental_risk
        );

        self.recommendation_for(request.malnutrition_status, request.developmental_risk, language)
    }

    /// Predict, then recommend in the user's stored language
    pub fn analyze(&self, user: &User, request: &PredictionRequest) -> Result<(Prediction, String), AppError> {
        info!("Complete analysis request from user {}", user.id);

        let prediction = self.predict(user, request)?;
        let recommendation = self.recommendation_for(
            prediction.malnutrition_status,
            prediction.developmental_risk,
            user.language,
        )?;

        Ok((prediction, recommendation))
    }

    fn recommendation_for(
        &self,
        status: MalnutritionStatus,
        risk: DevelopmentalRisk,
        language: Language,
    ) -> Result<String, AppError> {
        let recommendation = self.models.recommend(status, risk, language);

        if recommendation.trim().chars().count() < MIN_RECOMMENDATION_LENGTH {
            error!("Recommendation text too short for {} / {}", status, risk);
            return Err(AppError::Internal(
                language
                    .pick(
                        "Unable to generate proper recommendations. Please try again.",
                        "Imeshindwa kutoa mapendekezo sahihi. Tafadhali jaribu tena.",
                    )
                    .to_string(),
            ));
        }

        Ok(recommendation)
    }
}

/// Range checks on the raw feature payload, then the two sanity checks that
/// are reported as bad requests rather than field errors
fn validate_features(request: &PredictionRequest) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();

    errors.check_range("Age_Months", request.age_months, 0, 60);
    errors.check_range("Weight_kg", request.weight_kg, 0.0, 50.0);
    errors.check_range("Height_cm", request.height_cm, 0.0, 150.0);
    errors.check_range("HeadCircumference_cm", request.head_circumference_cm, 0.0, 60.0);
    errors.check_range("MUAC_cm", request.muac_cm, 0.0, 30.0);
    errors.check_range("BMI", request.bmi, 0.0, 40.0);
    errors.check_range("Diet_Diversity_Score", request.diet_diversity_score, 0, 10);
    for (field, value) in [
        ("Weight_for_Age_ZScore", request.weight_for_age_zscore),
        ("Height_for_Age_ZScore", request.height_for_age_zscore),
        ("BMI_for_Age_ZScore", request.bmi_for_age_zscore),
        ("MUAC_for_Age_ZScore", request.muac_for_age_zscore),
    ] {
        errors.check_range(field, value, -5.0, 5.0);
    }
    for (field, value) in [
        ("Weight_for_Age_Percentile", request.weight_for_age_percentile),
        ("Height_for_Age_Percentile", request.height_for_age_percentile),
        ("BMI_for_Age_Percentile", request.bmi_for_age_percentile),
        ("MUAC_for_Age_Percentile", request.muac_for_age_percentile),
    ] {
        errors.check_range(field, value, 0.0, 100.0);
    }
    errors.into_result()?;

    if request.age_months <= 0 {
        return Err(AppError::BadRequest("Age must be greater than 0 months".to_string()));
    }
    if request.weight_kg <= 0.0 || request.height_cm <= 0.0 {
        return Err(AppError::BadRequest("Weight and height must be positive values".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::FallbackModels;
    use chrono::Utc;
    use shared::{Sex, YesNo};
    use uuid::Uuid;

    fn user(language: Language) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "parent@example.com".to_string(),
            name: "Parent".to_string(),
            phone: None,
            password_hash: String::new(),
            language,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn service() -> AdvisoryService {
        AdvisoryService::new(Arc::new(FallbackModels))
    }

    fn features() -> PredictionRequest {
        PredictionRequest {
            age_months: 24,
            sex: Sex::Male,
            weight_kg: 12.0,
            height_cm: 86.0,
            head_circumference_cm: 47.0,
            muac_cm: 14.5,
            bmi: 16.22,
            diet_diversity_score: 6,
            recent_infection: YesNo::No,
            weight_for_age_zscore: 0.1,
            height_for_age_zscore: -2.5,
            bmi_for_age_zscore: 0.0,
            muac_for_age_zscore: 0.0,
            weight_for_age_percentile: 52.0,
            height_for_age_percentile: 1.0,
            bmi_for_age_percentile: 50.0,
            muac_for_age_percentile: 50.0,
        }
    }

    /// Models that always answer with a fixed, too-short text
    struct TerseModels;

    impl NutritionModels for TerseModels {
        fn predict(&self, features: &FeatureVector) -> Prediction {
            crate::ml::fallback::predict(features)
        }

        fn recommend(&self, _: MalnutritionStatus, _: DevelopmentalRisk, _: Language) -> String {
            "Eat well.".to_string()
        }

        fn answer(&self, _: &str, _: Language) -> String {
            "Ok".to_string()
        }
    }

    #[test]
    fn test_predict_stunting() {
        let prediction = service().predict(&user(Language::English), &features()).unwrap();
        assert_eq!(prediction.malnutrition_status, MalnutritionStatus::Stunting);
        assert_eq!(prediction.developmental_risk, DevelopmentalRisk::AtRisk);
    }

    #[test]
    fn test_predict_rejects_out_of_range_and_zero_age() {
        let out_of_range = PredictionRequest {
            bmi: 41.0,
            muac_for_age_percentile: -1.0,
            ..features()
        };
        match service().predict(&user(Language::English), &out_of_range) {
            Err(AppError::Validation(errors)) => assert_eq!(errors.fields.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }

        let newborn = PredictionRequest { age_months: 0, ..features() };
        assert!(matches!(
            service().predict(&user(Language::English), &newborn),
            Err(AppError::BadRequest(_))
        ));

        let weightless = PredictionRequest { weight_kg: 0.0, ..features() };
        assert!(matches!(
            service().predict(&user(Language::English), &weightless),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_recommend_language_override() {
        let request = RecommendationRequest {
            malnutrition_status: MalnutritionStatus::Normal,
            developmental_risk: DevelopmentalRisk::NoRisk,
            language: Some(Language::Swahili),
        };
        let text = service().recommend(&user(Language::English), &request).unwrap();
        assert!(text.contains("anakua vizuri"));

        let request = RecommendationRequest { language: None, ..request };
        let text = service().recommend(&user(Language::English), &request).unwrap();
        assert!(text.contains("growing well"));
    }

    #[test]
    fn test_analyze_uses_stored_language() {
        let (prediction, recommendation) = service().analyze(&user(Language::Swahili), &features()).unwrap();
        assert_eq!(prediction.malnutrition_status, MalnutritionStatus::Stunting);
        assert!(recommendation.contains("kudumaa"));
    }

    #[test]
    fn test_question_length_limits() {
        let service = service();
        let english = user(Language::English);

        let empty = ChatbotRequest { question: String::new(), language: None };
        assert!(matches!(service.answer_question(&english, &empty), Err(AppError::Validation(_))));

        let long = ChatbotRequest { question: "a".repeat(501), language: None };
        assert!(matches!(service.answer_question(&english, &long), Err(AppError::Validation(_))));

        let ok = ChatbotRequest { question: "What food helps growth?".to_string(), language: None };
        assert!(service.answer_question(&english, &ok).unwrap().contains("variety of foods"));
    }

    #[test]
    fn test_short_model_output_is_internal_error() {
        let service = AdvisoryService::new(Arc::new(TerseModels));
        let swahili = user(Language::Swahili);

        let question = ChatbotRequest { question: "Habari?".to_string(), language: None };
        match service.answer_question(&swahili, &question) {
            Err(AppError::Internal(message)) => assert!(message.starts_with("Imeshindwa kutoa jibu")),
            other => panic!("expected internal error, got {:?}", other),
        }

        let request = RecommendationRequest {
            malnutrition_status: MalnutritionStatus::Normal,
            developmental_risk: DevelopmentalRisk::NoRisk,
            language: Some(Language::English),
        };
        match service.recommend(&swahili, &request) {
            Err(AppError::Internal(message)) => assert!(message.starts_with("Unable to generate proper")),
            other => panic!("expected internal error, got {:?}", other),
        }
    }
}
