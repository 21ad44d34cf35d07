//! API error types and responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::StoreError;

/// API error types. Messages are already localized for the caller.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found
    NotFound(String),
    /// Field validation failed
    Validation {
        message: String,
        fields: Vec<FieldMessage>,
    },
    /// Request is well-formed but not allowed in the current state
    BadRequest(String),
    /// Missing or unknown access token, or bad credentials
    Unauthorized(String),
    /// Conflicts with the current state of the resource
    Conflict(String),
    /// Required answers are missing
    Incomplete(String),
    /// The identity backend failed
    Remote(String),
    /// Internal server error
    InternalError(String),
}

/// One field's validation failure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldMessage {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// Error response body
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldMessage>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut fields = Vec::new();
        let (status, error, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Validation {
                message,
                fields: field_messages,
            } => {
                fields = field_messages;
                (StatusCode::BAD_REQUEST, "validation_error", message)
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Incomplete(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "incomplete", msg)
            }
            ApiError::Remote(msg) => (StatusCode::BAD_GATEWAY, "remote_error", msg),
            ApiError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
                fields,
            }),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "storage failure");
        ApiError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}
