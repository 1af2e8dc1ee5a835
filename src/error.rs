use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::config::Service;

/// Failures talking to SEMRush, Serper, OpenAI or a company website
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("missing API key for {0}")]
    MissingKey(Service),
    #[error("rate limit reached for {service}, retry in {wait_secs} seconds")]
    RateLimited { service: String, wait_secs: u64 },
    #[error("timeout while calling {0}")]
    Timeout(String),
    #[error("{service} API error: {message}")]
    Api { service: String, message: String },
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: String,
        status: u16,
        body: String,
    },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("language model error: {0}")]
    Llm(String),
    #[error("language model unavailable: {0}")]
    LlmUnavailable(String),
    #[error("analysis did not finish within {0} seconds")]
    AnalysisTimeout(u64),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ClientError {
    /// Whether a fresh attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Timeout(_) | ClientError::RateLimited { .. } => true,
            ClientError::Status { status, .. } => *status == 429 || *status >= 500,
            ClientError::Http(e) => e.is_timeout() || e.is_connect(),
            ClientError::LlmUnavailable(_) => true,
            _ => false,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Custom error type for the HTTP layer
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    InternalServerError(String),
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::Upstream(msg) => {
                error!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "BAD_GATEWAY", msg)
            }
            AppError::InternalServerError(msg) => {
                error!("Internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    msg,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidInput(msg) => AppError::ValidationError(msg),
            ClientError::Json(e) => AppError::InternalServerError(e.to_string()),
            ClientError::Csv(e) => AppError::InternalServerError(e.to_string()),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::InternalServerError(msg)
    }
}

/// Result type for application handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ClientError::Timeout("serper".into()).is_retryable());
        assert!(
            ClientError::Status {
                service: "semrush".into(),
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            ClientError::Status {
                service: "semrush".into(),
                status: 429,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !ClientError::Status {
                service: "semrush".into(),
                status: 401,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !ClientError::Api {
                service: "semrush".into(),
                message: "ERROR 50 :: NOTHING FOUND".into()
            }
            .is_retryable()
        );
        assert!(ClientError::LlmUnavailable("server_error".into()).is_retryable());
        assert!(!ClientError::Llm("invalid_api_key".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        let response = AppError::ValidationError("empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::from(ClientError::Timeout("openai".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response =
            AppError::from(ClientError::InvalidInput("no domain".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_messages() {
        let err = ClientError::RateLimited {
            service: "semrush".into(),
            wait_secs: 12,
        };
        assert_eq!(
            err.to_string(),
            "rate limit reached for semrush, retry in 12 seconds"
        );
        assert_eq!(
            ClientError::MissingKey(Service::Serper).to_string(),
            "missing API key for serper"
        );
    }
}
