//! Unified API error handling
//!
//! Provides consistent error responses across all endpoints. Field validation
//! problems are not errors here: they travel as data in the response body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Final submission could not be delivered; the draft is kept for retry.
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ServiceUnavailable(_) | Self::SubmissionFailed(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unprocessable(_) => "UNPROCESSABLE",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::SubmissionFailed(_) => "SUBMISSION_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg)
            | Self::Unprocessable(msg)
            | Self::ServiceUnavailable(msg)
            | Self::SubmissionFailed(msg) => msg.clone(),
            // Don't leak internal error details
            Self::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_) | Self::SubmissionFailed(_))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = ?e, "Internal server error");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.public_message(),
            retryable: self.is_retryable(),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
