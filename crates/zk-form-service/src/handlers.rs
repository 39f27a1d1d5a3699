//! API request handlers for the zk-form service

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::processor::{ProcessError, Submission, SubmissionProcessor, SubmissionStatus};
use crate::verifier::VerifyError;

/// Shared application state
pub struct AppState {
    pub processor: SubmissionProcessor,
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<ProcessError> for ApiError {
    fn from(err: ProcessError) -> Self {
        let status = match &err {
            ProcessError::SpaceNotFound(_) | ProcessError::AppNotFound(_) => StatusCode::NOT_FOUND,
            ProcessError::Verification(VerifyError::VerifierUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &err {
            ProcessError::Verification(VerifyError::VerifierUnavailable(_)) => {
                "Verifier unavailable".to_string()
            }
            ProcessError::Verification(_) => "Invalid response".to_string(),
            ProcessError::Store(e) => {
                error!("Store error: {}", e);
                e.to_string()
            }
            other => other.to_string(),
        };

        ApiError { status, message }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        ApiError {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Response to an accepted submission
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub status: SubmissionStatus,
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "zk-form-service"
    }))
}

/// Verify a zkForm submission and record it
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Submission>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Json(payload) = payload?;
    info!(
        "Verifying submission for {}/{}",
        payload.space_slug, payload.app_slug
    );

    let status = state.processor.process(payload).await?;

    Ok(Json(VerifyResponse { status }))
}
