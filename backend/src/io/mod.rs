//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Handlers
//! translate JSON requests into service calls and render domain results and
//! [`crate::error::AppError`]s as JSON responses.

pub mod rest;

pub use rest::*;
