use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
};
use serde_json::json;
use shared::{HealthResponse, WelcomeResponse};
use tracing::debug;

use crate::AppState;

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(WelcomeResponse {
        message: format!("Welcome to {} API", state.config.app_name),
        version: state.config.app_version.clone(),
        // no interactive docs are served
        docs_url: "Documentation disabled in production".to_string(),
    })
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        app_name: state.config.app_name.clone(),
        version: state.config.app_version.clone(),
    })
}

pub async fn not_found(uri: Uri) -> impl IntoResponse {
    debug!("No route for {}", uri.path());
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Endpoint not found" })))
}
