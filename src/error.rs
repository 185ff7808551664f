//! API error taxonomy and its mapping onto HTTP responses.
//!
//! Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl is the
//! single place where errors become status codes and envelope bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name → list of human-readable messages, ordered for stable output.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Referenced entity or locale does not exist. Carries the client-facing
    /// message ("Language not found", "Translation not found", ...).
    #[error("{0}")]
    NotFound(String),

    /// Missing/invalid fields or a uniqueness conflict.
    #[error("The given data was invalid")]
    Validation(FieldErrors),

    /// Missing or invalid bearer token.
    #[error("Unauthenticated")]
    Unauthorized,

    /// Record store failure (connectivity, constraint we did not pre-check, ...).
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    /// A store query exceeded its bounded timeout.
    #[error("store query timed out")]
    StoreTimeout,
}

impl ApiError {
    /// Validation error for a single field.
    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        ApiError::Validation(errors)
    }

    /// `required` validation messages for every named field.
    pub fn missing_fields(fields: &[&str]) -> Self {
        let mut errors = FieldErrors::new();
        for field in fields {
            errors.insert(
                field.to_string(),
                vec![format!("The {} field is required.", field)],
            );
        }
        ApiError::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "message": message })),
            )
                .into_response(),

            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "success": false,
                    "message": "The given data was invalid.",
                    "data": errors,
                })),
            )
                .into_response(),

            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "success": false, "message": "Unauthenticated." })),
            )
                .into_response(),

            ApiError::Store(err) => {
                tracing::error!(error = %err, "record store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "message": "Internal server error." })),
                )
                    .into_response()
            }

            ApiError::StoreTimeout => {
                tracing::error!("record store query exceeded its timeout");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "message": "Internal server error." })),
                )
                    .into_response()
            }
        }
    }
}
