use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::form::{FormError, SubmitError};
use crate::form::path::{FieldPath, PathError};
use crate::form::validation::FieldErrors;
use crate::submission::SubmissionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Form is invalid: {} field(s) failed validation", .errors.len())]
    InvalidForm {
        errors: FieldErrors,
        first_invalid: FieldPath,
    },

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PathError> for AppError {
    fn from(err: PathError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::AlreadySubmitted => AppError::Conflict(err.to_string()),
            FormError::Path(e) => e.into(),
            FormError::ControlledField(_) | FormError::NotANumber { .. } => {
                AppError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Invalid {
                errors,
                first_invalid,
            } => AppError::InvalidForm {
                errors,
                first_invalid,
            },
            SubmitError::Submission(e @ SubmissionError::MalformedDate { .. }) => {
                AppError::UnprocessableEntity(e.to_string())
            }
            SubmitError::Form(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::InvalidForm {
                errors,
                first_invalid,
            } => {
                let body = Json(json!({
                    "error": {
                        "code": "VALIDATION_ERROR",
                        "message": self.to_string(),
                        "fields": errors,
                        "firstInvalid": first_invalid,
                    }
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MALFORMED_DATE",
                msg.clone(),
            ),
            AppError::Unavailable(msg) => {
                tracing::warn!("Unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "UNAVAILABLE",
                    msg.clone(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
