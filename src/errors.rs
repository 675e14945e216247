use axum::{http::StatusCode, response::Json};
use serde::Serialize;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::extraction::ExtractionError;
use crate::quiz::GradeError;

/// Error body returned for every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Centralized error types for consistent API error handling.
///
/// Only the strict side of the error policy flows through here: extraction,
/// grading, auth, and mentor failures. Generation-side failures never reach
/// this type — they degrade to empty defaults inside the assistant service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Model service error: {0}")]
    ModelError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error context for structured logging.
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }
}

impl ApiError {
    /// Convert to an HTTP response with consistent structure and logging.
    pub fn to_response_with_context(
        self,
        context: ErrorContext,
    ) -> (StatusCode, Json<ErrorBody>) {
        match &self {
            ApiError::BadRequest(message) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Bad request"
                );
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody {
                        error: message.clone(),
                    }),
                )
            }
            ApiError::Unauthorized(message) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Unauthorized"
                );
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorBody {
                        error: message.clone(),
                    }),
                )
            }
            ApiError::ModelError(message) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    error = %self,
                    "Model service error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: message.clone(),
                    }),
                )
            }
            ApiError::DatabaseError(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Database error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "Database operation failed. Please try again.".to_string(),
                    }),
                )
            }
            ApiError::InternalError(_) => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    error = %self,
                    "Internal server error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "An internal error occurred. Please try again.".to_string(),
                    }),
                )
            }
        }
    }

    /// Simple conversion without call-site context.
    pub fn to_response(self) -> (StatusCode, Json<ErrorBody>) {
        let context = ErrorContext::new("unknown", "resource");
        self.to_response_with_context(context)
    }
}

/// Extraction failures are always client errors: without text, nothing
/// downstream is meaningful.
impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::UnsupportedFormat | ExtractionError::NoTextExtracted => {
                ApiError::BadRequest(err.to_string())
            }
            ExtractionError::ReadFailed(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<GradeError> for ApiError {
    fn from(err: GradeError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken => ApiError::BadRequest(err.to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::Internal(e) => ApiError::DatabaseError(e),
        }
    }
}
