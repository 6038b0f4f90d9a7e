use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Generator error ({status}): {message}")]
    Generator { status: u16, message: String },

    #[error("Speech synthesis error ({status}): {message}")]
    Speech { status: u16, message: String },

    #[error("Provider error [{provider}]: {message}")]
    Provider { provider: &'static str, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn generator(status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::Generator {
            status: status.unwrap_or(500),
            message: message.into(),
        }
    }

    pub fn speech(status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::Speech {
            status: status.unwrap_or(500),
            message: message.into(),
        }
    }
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal database error".to_string())
            }
            AppError::Generator { status, ref message } => {
                tracing::error!("Generator error ({}): {}", status, message);
                // Preserve the upstream status when it is a real HTTP code
                let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (code, "Story generation failed".to_string())
            }
            AppError::Speech { status, ref message } => {
                tracing::error!("Speech synthesis error ({}): {}", status, message);
                let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (code, "Speech synthesis failed".to_string())
            }
            AppError::Provider { provider, ref message } => {
                tracing::warn!("Provider error [{}]: {}", provider, message);
                (StatusCode::BAD_GATEWAY, format!("Upstream provider {} failed", provider))
            }
            AppError::InvalidRequest(ref e) => (StatusCode::BAD_REQUEST, e.clone()),
            AppError::NotFound(ref e) => (StatusCode::NOT_FOUND, e.clone()),
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "details": status.canonical_reason(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
