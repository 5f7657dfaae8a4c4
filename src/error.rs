use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No candidate POIs: {0}")]
    NoData(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Weather service error: {0}")]
    Weather(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NoData(ref e) => {
                tracing::info!("No candidate POIs: {}", e);
                (StatusCode::NOT_FOUND, e.as_str())
            }
            AppError::Config(ref e) => (StatusCode::BAD_REQUEST, e.as_str()),
            AppError::InvalidRequest(ref e) => (StatusCode::BAD_REQUEST, e.as_str()),
            AppError::Catalog(ref e) => {
                tracing::error!("Catalog error: {}", e);
                (StatusCode::BAD_GATEWAY, "Catalog service error")
            }
            AppError::Weather(ref e) => {
                tracing::warn!("Weather service error: {}", e);
                (StatusCode::BAD_GATEWAY, "Weather service error")
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
