use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failure of a single call to the upstream metadata API
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Upstream request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream returned status {status}")]
    Status { status: u16, body: String },

    #[error("Invalid upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Network failures, timeouts and 5xx responses are worth another attempt
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Timeout | UpstreamError::Network(_) => true,
            UpstreamError::Status { status, .. } => *status >= 500,
            UpstreamError::Decode(_) => false,
        }
    }

    /// Status code of the upstream response, if one was received
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            UpstreamError::Status {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0} parameter is required")]
    MissingParameter(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to fetch data from TMDB: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and stable machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::MissingParameter(_) => (StatusCode::BAD_REQUEST, "missing_parameter"),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_parameter"),
            AppError::Upstream(err) => match err {
                UpstreamError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout"),
                UpstreamError::Network(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
                UpstreamError::Decode(_) => (StatusCode::BAD_GATEWAY, "upstream_invalid_response"),
                UpstreamError::Status { status, .. } => {
                    let code = StatusCode::from_u16(*status)
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                    if code.is_server_error() {
                        (code, "upstream_unavailable")
                    } else {
                        (code, "upstream_rejected")
                    }
                }
            },
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // The upstream body never reaches the caller
        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
