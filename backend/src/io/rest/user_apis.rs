//! # REST API for the Current User

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::{Language, LanguagePreferenceRequest, LanguageResponse};
use tracing::info;

use crate::io::rest::extractors::{ApiJson, CurrentUser};
use crate::io::rest::mappers::UserMapper;
use crate::AppState;

pub async fn get_current_user(current: CurrentUser) -> impl IntoResponse {
    info!("GET /api/v1/users/me - user {}", current.user.id);
    (StatusCode::OK, Json(UserMapper::to_profile(&current.user)))
}

pub async fn update_language(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(request): ApiJson<LanguagePreferenceRequest>,
) -> impl IntoResponse {
    info!("PUT /api/v1/users/language - user {} to {}", current.user.id, request.language);

    match state.auth_service.update_language(&current.user, request.language).await {
        Ok(()) => {
            // confirmation is given in the newly chosen language
            let message = match request.language {
                Language::English => "Language changed to English",
                Language::Swahili => "Lugha imebadilishwa kuwa Kiswahili",
            };
            let response = LanguageResponse {
                language: request.language,
                message: message.to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}
