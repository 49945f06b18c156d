//! # REST API for Authentication
//!
//! Registration, login, token refresh, logout and password reset.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use shared::{
    LoginRequest, MessageResponse, PasswordResetConfirm, PasswordResetRequest, RefreshTokenRequest,
    RegisterUserRequest, TokenResponse,
};
use tracing::{info, warn};

use crate::domain::TokenPair;
use crate::io::rest::extractors::{ApiJson, CurrentUser};
use crate::AppState;

fn message(text: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.to_string(),
    })
}

fn token_response(pair: TokenPair) -> Json<TokenResponse> {
    Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "bearer".to_string(),
    })
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterUserRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/auth/register - {}", request.email);

    match state.auth_service.register(&request).await {
        Ok(_) => (
            StatusCode::CREATED,
            message("User registered successfully. Please check your email for verification."),
        )
            .into_response(),
        Err(e) => {
            warn!("Registration failed: {}", e);
            e.into_response()
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/auth/login - {}", request.email);

    match state.auth_service.login(&request.email, &request.password).await {
        Ok(pair) => (StatusCode::OK, token_response(pair)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshTokenRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/auth/refresh");

    match state.auth_service.refresh(&request.refresh_token).await {
        Ok(pair) => (StatusCode::OK, token_response(pair)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Revoke the access token the request was made with
pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> impl IntoResponse {
    info!("POST /api/v1/auth/logout - user {}", current.user.id);

    match state.auth_service.logout(&current.claims).await {
        Ok(()) => (StatusCode::OK, message("Successfully logged out")).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PasswordResetRequest>,
) -> impl IntoResponse {
    info!("POST /api/v1/auth/request-password-reset");

    match state.auth_service.request_password_reset(&request.email).await {
        Ok(()) => (
            StatusCode::OK,
            message("If your email is registered, you will receive a password reset link."),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PasswordResetConfirm>,
) -> impl IntoResponse {
    info!("POST /api/v1/auth/reset-password");

    match state.auth_service.reset_password(&request.token, &request.new_password).await {
        Ok(()) => (StatusCode::OK, message("Password has been reset successfully")).into_response(),
        Err(e) => e.into_response(),
    }
}
