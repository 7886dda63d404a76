//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::error::EngineError;
use crate::models::conflict::Conflict;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// The blocking conflicts, when a publish was refused.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Conflict>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            conflicts: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request body or query parameters
    BadRequest(String),
    /// Engine error from the service layer
    Engine(EngineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Engine(e) => engine_response(e),
        };
        (status, Json(error)).into_response()
    }
}

fn engine_response(err: EngineError) -> (StatusCode, ApiError) {
    let details = {
        let ctx = err.context();
        let rendered = ctx.to_string();
        (rendered != "[]").then_some(rendered)
    };
    let (status, mut api) = match err {
        EngineError::Validation { message, .. } => (
            StatusCode::BAD_REQUEST,
            ApiError::new("VALIDATION_ERROR", message),
        ),
        EngineError::NotFound { message, .. } => {
            (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
        }
        EngineError::Concurrency { message, .. } => (
            StatusCode::CONFLICT,
            ApiError::new("CONCURRENCY_CONFLICT", message),
        ),
        EngineError::State { message, .. } => {
            (StatusCode::CONFLICT, ApiError::new("STATE_ERROR", message))
        }
        EngineError::PublishBlocked {
            message, conflicts, ..
        } => {
            let mut api = ApiError::new("PUBLISH_BLOCKED", message);
            api.conflicts = conflicts;
            (StatusCode::CONFLICT, api)
        }
        EngineError::Configuration { message, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("CONFIGURATION_ERROR", message),
        ),
        EngineError::Internal { message, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("INTERNAL_ERROR", message),
        ),
    };
    api.details = details;
    (status, api)
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::Engine(err)
    }
}
