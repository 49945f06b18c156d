//! Application error type and its HTTP rendering.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

/// Errors surfaced by the domain layer to the REST layer.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or out-of-range input, with per-field detail.
    #[error("{}", .0.message)]
    Validation(ValidationErrors),

    /// Request that is well-formed but cannot be honored.
    #[error("{0}")]
    BadRequest(String),

    /// Resource missing or not owned by the caller.
    #[error("{0}")]
    NotFound(String),

    /// Missing, expired or revoked credential.
    #[error("{0}")]
    Unauthorized(String),

    /// Duplicate resource.
    #[error("{0}")]
    Conflict(String),

    /// Persistence failure or unexpected exception.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Builds a closure that logs a storage failure and replaces it with a
    /// generic internal error carrying `message`.
    ///
    /// ```ignore
    /// repo.store_child(&child).await.map_err(AppError::internal("Failed to register child"))?;
    /// ```
    pub fn internal(message: impl Into<String>) -> impl FnOnce(anyhow::Error) -> AppError {
        let message = message.into();
        move |err| {
            error!("{}: {:#}", message, err);
            AppError::Internal(message)
        }
    }

    pub fn validation_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        AppError::Validation(errors)
    }
}

const JSON_DATA_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Body rejections from [`crate::io::rest::extractors::ApiJson`].
///
/// A body that parses but does not fit the request type is a validation
/// failure on the offending field; anything else is a bad request.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        match rejection {
            JsonRejection::JsonDataError(e) => {
                let (field, reason) = json_field_error(&e.body_text());
                AppError::Validation(ValidationErrors {
                    message: format!("Validation failed for field '{}'", field),
                    fields: vec![FieldError { field, message: reason }],
                })
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

/// Splits a deserialization message into the field it names and the reason.
///
/// Messages look like `age_months: invalid type: ...` or, for absent keys,
/// ``missing field `diet_diversity_score` at line 1 column 60``.
fn json_field_error(body_text: &str) -> (String, String) {
    let detail = body_text.strip_prefix(JSON_DATA_PREFIX).unwrap_or(body_text);
    let (path, reason) = match detail.split_once(": ") {
        Some((path, reason)) if !path.is_empty() && !path.contains(' ') => (Some(path), reason),
        _ => (None, detail),
    };
    let reason = reason.split(" at line ").next().unwrap_or(reason);

    let missing = reason
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(name, _)| name);
    let field = match (path, missing) {
        (Some(path), Some(name)) => format!("{}.{}", path, name),
        (Some(path), None) => path.to_string(),
        (None, Some(name)) => name.to_string(),
        (None, None) => "body".to_string(),
    };
    (field, reason.to_string())
}

/// A single field validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Accumulates every field failure of a request so they are reported together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    pub message: String,
    pub fields: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self {
            message: "Validation failed".to_string(),
            fields: Vec::new(),
        }
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Checks that `value` lies in `[min, max]`.
    pub fn check_range<T>(&mut self, field: &str, value: T, min: T, max: T)
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        // NaN fails both comparisons and is rejected here too
        if !(value >= min && value <= max) {
            self.add(field, format!("must be between {} and {}", min, max));
        }
    }

    /// Checks that `value` lies in `(0, max]`.
    pub fn check_positive_max(&mut self, field: &str, value: f64, max: f64) {
        if !(value > 0.0 && value <= max) {
            self.add(field, format!("must be greater than 0 and at most {}", max));
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if !self.has_errors() {
            return Ok(());
        }
        if self.fields.len() == 1 {
            let message = format!("Validation failed for field '{}'", self.fields[0].field);
            return Err(AppError::Validation(ValidationErrors { message, ..self }));
        }
        let message = format!("Validation failed for {} fields", self.fields.len());
        Err(AppError::Validation(ValidationErrors { message, ..self }))
    }
}

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().to_string();
        let body = match self {
            AppError::Validation(errors) => ErrorResponse {
                code,
                message: errors.message,
                details: Some(errors.fields),
            },
            other => ErrorResponse {
                code,
                message: other.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::validation_field("age_months", "bad").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_validation_errors_collect_all_fields() {
        let mut errors = ValidationErrors::new();
        errors.check_range("age_months", 61, 0, 60);
        errors.check_positive_max("weight_kg", 0.0, 50.0);
        errors.check_positive_max("height_cm", 80.0, 150.0);
        errors.check_range("score", f64::NAN, 0.0, 10.0);

        match errors.into_result() {
            Err(AppError::Validation(details)) => {
                let fields: Vec<_> = details.fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(fields, vec!["age_months", "weight_kg", "score"]);
                assert_eq!(details.message, "Validation failed for 3 fields");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_validation_is_ok() {
        let mut errors = ValidationErrors::new();
        errors.check_range("diet_diversity_score", 5, 0, 10);
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn test_json_field_error_names_the_field() {
        let (field, reason) = json_field_error(
            "Failed to deserialize the JSON body into the target type: missing field `diet_diversity_score` at line 1 column 58",
        );
        assert_eq!(field, "diet_diversity_score");
        assert_eq!(reason, "missing field `diet_diversity_score`");

        let (field, reason) = json_field_error(
            "Failed to deserialize the JSON body into the target type: age_months: invalid type: string \"twelve\", expected i32 at line 1 column 24",
        );
        assert_eq!(field, "age_months");
        assert_eq!(reason, "invalid type: string \"twelve\", expected i32");

        let (field, _) = json_field_error("features: missing field `Age_Months` at line 1 column 40");
        assert_eq!(field, "features.Age_Months");

        let (field, reason) = json_field_error("invalid type: map, expected a string at line 1 column 1");
        assert_eq!(field, "body");
        assert_eq!(reason, "invalid type: map, expected a string");
    }

    #[test]
    fn test_internal_hides_cause() {
        let err = AppError::internal("Failed to create growth record")(anyhow::anyhow!("disk I/O error"));
        assert_eq!(err.to_string(), "Failed to create growth record");
    }
}
