//! # REST API for Children and Growth Records
//!
//! Every route is scoped to the caller: a child id that is malformed, unknown
//! or owned by someone else is answered with the same 404.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::{CreateGrowthRecordRequest, RegisterChildRequest};
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::child_service::child_not_found;
use crate::domain::models::user::User;
use crate::error::AppError;
use crate::io::rest::extractors::{ApiJson, CurrentUser};
use crate::io::rest::mappers::{ChildMapper, GrowthMapper};
use crate::AppState;

fn parse_child_id(raw: &str, user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| child_not_found(user))
}

/// Register a child for the current user
pub async fn register_child(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(request): ApiJson<RegisterChildRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/children/register - user {}", current.user.id);

    match state.child_service.register_child(&current.user, &request).await {
        Ok(child) => (StatusCode::CREATED, Json(ChildMapper::to_dto(&child))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// List the current user's children
pub async fn list_children(State(state): State<AppState>, current: CurrentUser) -> impl IntoResponse {
    info!("GET /api/v1/children - user {}", current.user.id);

    match state.child_service.list_children(&current.user).await {
        Ok(children) => (StatusCode::OK, Json(ChildMapper::to_list_dto(&children))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Store a measurement and answer with its prediction and recommendations
pub async fn create_growth_record(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(child_id): Path<String>,
    ApiJson(request): ApiJson<CreateGrowthRecordRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/children/{}/records - user {}", child_id, current.user.id);

    let child_id = match parse_child_id(&child_id, &current.user) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    match state
        .growth_service
        .record_and_predict(&current.user, child_id, &request)
        .await
    {
        Ok(recorded) => (StatusCode::OK, Json(GrowthMapper::to_prediction_dto(&recorded))).into_response(),
        Err(e) => {
            error!("Failed to create growth record for child {}: {}", child_id, e);
            e.into_response()
        }
    }
}

pub async fn get_child_history(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/v1/children/{}/history - user {}", child_id, current.user.id);

    let child_id = match parse_child_id(&child_id, &current.user) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    match state.growth_service.history(&current.user, child_id).await {
        Ok(history) => (StatusCode::OK, Json(GrowthMapper::to_history_dto(&history))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_growth_trends(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(child_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/v1/children/{}/trends - user {}", child_id, current.user.id);

    let child_id = match parse_child_id(&child_id, &current.user) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    match state.growth_service.trends(&current.user, child_id).await {
        Ok(trends) => {
            let response = GrowthMapper::to_trend_dto(&trends, current.user.language);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}
