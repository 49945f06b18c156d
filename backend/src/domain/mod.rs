//! # Domain Module
//!
//! Business rules for the growth tracker. Services take the authenticated
//! [`models::user::User`] so every lookup is scoped to the caller and every
//! user-facing message can follow the caller's language preference.
//!
//! - **auth_service** - registration, login, token refresh and revocation,
//!   password reset, language preference
//! - **child_service** - child registration and lookup
//! - **growth_service** - growth records, the record-and-predict workflow,
//!   history and trends
//! - **trend_analysis** - pure trend and alert computation
//! - **advisory_service** - chatbot, standalone predictions and recommendations

pub mod advisory_service;
pub mod auth_service;
pub mod child_service;
pub mod growth_service;
pub mod models;
pub mod trend_analysis;

pub use advisory_service::AdvisoryService;
pub use auth_service::{AuthService, TokenPair};
pub use child_service::ChildService;
pub use growth_service::GrowthService;
