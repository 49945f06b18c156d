//! # REST API for the Nutrition Models
//!
//! Chatbot, standalone prediction, recommendation and combined analysis.
//! None of these touch stored records.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::{
    AnalysisChildInfo, AnalysisResponse, ChatbotRequest, ChatbotResponse, PredictionRequest, PredictionResponse,
    RecommendationRequest, RecommendationResponse,
};
use tracing::info;

use crate::io::rest::extractors::{ApiJson, CurrentUser};
use crate::ml::Prediction;
use crate::AppState;

fn prediction_dto(prediction: &Prediction) -> PredictionResponse {
    PredictionResponse {
        malnutrition_status: prediction.malnutrition_status,
        developmental_risk: prediction.developmental_risk,
    }
}

pub async fn chatbot(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(request): ApiJson<ChatbotRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/chatbot - user {}", current.user.id);

    match state.advisory_service.answer_question(&current.user, &request) {
        Ok(answer) => (StatusCode::OK, Json(ChatbotResponse { answer })).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn predict(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(request): ApiJson<PredictionRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/predict - user {}", current.user.id);

    match state.advisory_service.predict(&current.user, &request) {
        Ok(prediction) => (StatusCode::OK, Json(prediction_dto(&prediction))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn recommend(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(request): ApiJson<RecommendationRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/recommend - user {}", current.user.id);

    match state.advisory_service.recommend(&current.user, &request) {
        Ok(recommendation) => (StatusCode::OK, Json(RecommendationResponse { recommendation })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Prediction plus recommendation in the caller's stored language
pub async fn analyze(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(request): ApiJson<PredictionRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/analyze - user {}", current.user.id);

    match state.advisory_service.analyze(&current.user, &request) {
        Ok((prediction, recommendation)) => {
            let response = AnalysisResponse {
                prediction: prediction_dto(&prediction),
                recommendation,
                child_info: AnalysisChildInfo {
                    age_months: request.age_months,
                    sex: request.sex,
                    weight_kg: request.weight_kg,
                    height_cm: request.height_cm,
                },
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}
