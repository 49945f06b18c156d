//! # Growth Tracker Backend
//!
//! HTTP service for tracking children's growth, predicting nutritional status
//! and giving feeding advice in English and Swahili.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (axum REST handlers, extractors, mappers)
//!     ↓
//! Domain Layer (services, trend analysis)      ML (NutritionModels bundle)
//!     ↓
//! Storage Layer (SQLite repositories)
//! ```
//!
//! [`initialize_backend`] builds the services once at startup;
//! [`create_router`] wires them into the route tree.

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod ml;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::TokenCodec;
use crate::config::AppConfig;
use crate::domain::{AdvisoryService, AuthService, ChildService, GrowthService};
use crate::ml::{LoadedModels, NutritionModels};
use crate::storage::DbConnection;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub child_service: ChildService,
    pub growth_service: GrowthService,
    pub advisory_service: AdvisoryService,
    pub config: Arc<AppConfig>,
}

/// Open the configured database, load the models and build the services
pub async fn initialize_backend(config: AppConfig) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db = DbConnection::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    let models = LoadedModels::load(&config.models_dir)
        .with_context(|| format!("Failed to load models from {}", config.models_dir.display()))?;

    Ok(initialize_backend_with(config, db, Arc::new(models)))
}

/// Build the services on an already open database and model bundle
pub fn initialize_backend_with(config: AppConfig, db: DbConnection, models: Arc<dyn NutritionModels>) -> AppState {
    info!("Setting up domain services");
    let codec = TokenCodec::new(&config.token_secret, config.access_token_ttl, config.refresh_token_ttl);

    AppState {
        auth_service: AuthService::new(db.clone(), codec, config.frontend_url.clone()),
        child_service: ChildService::new(db.clone()),
        growth_service: GrowthService::new(db, models.clone()),
        advisory_service: AdvisoryService::new(models),
        config: Arc::new(config),
    }
}

/// Create the axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(io::register))
        .route("/login", post(io::login))
        .route("/refresh", post(io::refresh_token))
        .route("/logout", post(io::logout))
        .route("/request-password-reset", post(io::request_password_reset))
        .route("/reset-password", post(io::reset_password));

    let user_routes = Router::new()
        .route("/me", get(io::get_current_user))
        .route("/language", put(io::update_language));

    let child_routes = Router::new()
        .route("/", get(io::list_children))
        .route("/register", post(io::register_child))
        .route("/:child_id/records", post(io::create_growth_record))
        .route("/:child_id/history", get(io::get_child_history))
        .route("/:child_id/trends", get(io::get_growth_trends));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/children", child_routes)
        .route("/chatbot", post(io::chatbot))
        .route("/predict", post(io::predict))
        .route("/recommend", post(io::recommend))
        .route("/analyze", post(io::analyze));

    Router::new()
        .route("/", get(io::root))
        .route("/health", get(io::health))
        .nest("/api/v1", api_routes)
        .fallback(io::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
