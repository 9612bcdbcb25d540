//! Error types for the RUM server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lab_analysis::AnalysisError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Analysis(e) if e.is_client_error() => {
                (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() }))
            }
            ApiError::Analysis(AnalysisError::Unavailable) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "Analyzer is shutting down" }),
            ),
            ApiError::Analysis(e) => {
                tracing::error!("Analysis error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Analysis failed", "details": e.to_string() }),
                )
            }
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Database error" }),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
