use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed, missing or out-of-range input.
    #[error("{0}")]
    InvalidArgument(String),

    /// Well-formed input rejected by a business rule.
    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        AppError::InvalidArgument(reason.into())
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        AppError::InvalidState(reason.into())
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        AppError::NotFound(reason.into())
    }

    /// True for rejections the caller caused. These are reported verbatim.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidArgument(_)
                | AppError::InvalidState(_)
                | AppError::NotFound(_)
                | AppError::Unauthorized(_)
                | AppError::Forbidden(_)
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Extractor rejections are malformed input like any other.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidArgument(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidArgument(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidArgument(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = if self.is_client_error() {
            self.to_string()
        } else {
            error!("Request failed: {self}");
            "internal server error".to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
