//! Error types for the HTTP layer.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use clinical_intake_ai::QueryError;
use clinical_intake_extraction::FormError;
use serde::Serialize;
use std::fmt;

/// Failures that stop the server from starting.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration could not be loaded.
    Config { reason: String },
    /// The provider roster could not be built.
    Roster,
    /// The intent label map is invalid.
    Labels,
    /// The listener could not bind.
    Bind { addr: String, reason: String },
    /// The server stopped with an error.
    Serve { reason: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "failed to load configuration: {reason}"),
            Self::Roster => write!(f, "failed to build provider roster"),
            Self::Labels => write!(f, "invalid intent label configuration"),
            Self::Bind { addr, reason } => write!(f, "failed to bind '{addr}': {reason}"),
            Self::Serve { reason } => write!(f, "server error: {reason}"),
        }
    }
}

impl std::error::Error for StartupError {}

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Machine-readable failure description.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// `fallback_exhausted`, `domain_reported`, `invalid_form` or `internal`.
    pub kind: &'static str,
    pub message: String,
    /// Category whose step failed, if any.
    pub category: Option<String>,
}

/// Request failure, rendered as a JSON error body.
#[derive(Debug)]
pub struct ApiError(pub FormError);

impl From<FormError> for ApiError {
    fn from(e: FormError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            FormError::InvalidForm { .. } => (StatusCode::BAD_REQUEST, "invalid_form"),
            FormError::Prompt(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            other => match other.query_error() {
                Some(QueryError::FallbackExhausted { .. }) => {
                    (StatusCode::BAD_GATEWAY, "fallback_exhausted")
                }
                Some(QueryError::DomainReported { .. }) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "domain_reported")
                }
                None => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            FormError::Prompt(_) => "Internal server error".to_string(),
            other => match other.query_error().and_then(QueryError::domain_message) {
                Some(message) => message.to_string(),
                None => other.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            tracing::error!(kind, error = %self.0, "Request failed");
        } else {
            tracing::info!(kind, error = %self.0, "Request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                kind,
                message: self.message(),
                category: self.0.category().map(|c| c.as_str().to_string()),
            },
        };
        (status, Json(body)).into_response()
    }
}
