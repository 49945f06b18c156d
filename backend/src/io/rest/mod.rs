//! # REST API Interface Layer
//!
//! One module per resource, mirroring the route tree under `/api/v1`.
//! Authenticated handlers take a [`extractors::CurrentUser`]; conversions to
//! the shared DTOs live in [`mappers`].

pub mod auth_apis;
pub mod child_apis;
pub mod extractors;
pub mod mappers;
pub mod ml_apis;
pub mod system_apis;
pub mod user_apis;

pub use auth_apis::*;
pub use child_apis::*;
pub use ml_apis::*;
pub use system_apis::*;
pub use user_apis::*;
