use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid URL {0}")]
    InvalidUrl(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeError::Timeout
        } else if err.is_connect() {
            ProbeError::Connect(root_cause(&err))
        } else if err.is_decode() {
            ProbeError::Decode(err.to_string())
        } else {
            ProbeError::Transport(root_cause(&err))
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Decode(err.to_string())
    }
}

// reqwest's top-level message hides the OS error (e.g. "connection refused").
fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for ProbeError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProbeError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ProbeError::Connect(_) | ProbeError::Transport(_) | ProbeError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
            ProbeError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProbeError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ProbeError::Config(_) | ProbeError::Token(_) | ProbeError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ApiResponse {
            message: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;
