//! API error types and JSON response formatting.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error};

use crate::service::SaveError;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

/// Error details in the response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that converts to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Save not found for an owner.
    pub fn save_not_found(owner_id: &str, save_id: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "SAVE_NOT_FOUND",
            format!("Save '{}' not found", save_id),
        )
        .with_details(serde_json::json!({ "owner": owner_id, "save_id": save_id }))
    }

    /// No live game registered for an owner.
    pub fn session_not_found(owner_id: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "SESSION_NOT_FOUND",
            format!("Owner '{}' has no live game", owner_id),
        )
        .with_details(serde_json::json!({ "owner": owner_id }))
    }

    /// Internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Log server errors at error level, client errors at debug level
        if self.status.is_server_error() {
            error!(
                status = %self.status.as_u16(),
                code = %self.code,
                message = %self.message,
                "server error response"
            );
        } else if self.status.is_client_error() {
            debug!(
                status = %self.status.as_u16(),
                code = %self.code,
                message = %self.message,
                "client error response"
            );
        }

        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<SaveError> for ApiError {
    fn from(err: SaveError) -> Self {
        let status = match &err {
            SaveError::NoActiveCharacter(_) => StatusCode::CONFLICT,
            SaveError::SaveNotFound(_) => StatusCode::NOT_FOUND,
            SaveError::SaveCorrupted { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SaveError::InvalidFormat(_) | SaveError::InvalidOwner(_) => StatusCode::BAD_REQUEST,
            SaveError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let details = match &err {
            SaveError::SaveCorrupted { save_id, .. } => {
                Some(serde_json::json!({ "save_id": save_id }))
            }
            _ => None,
        };

        Self {
            status,
            code: err.code(),
            message: err.to_string(),
            details,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        SaveError::InvalidFormat(rejection.body_text()).into()
    }
}
