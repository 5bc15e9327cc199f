//! Boundary error handling: converts gate rejections and handler failures
//! into HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::error::GateError;
use crate::validation::ValidationFailure;

/// API error type with automatic response conversion.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
    /// A rejection from the token, validation or upload gates.
    Gate(GateError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal_error(context: &str, e: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, e);
        Self::Internal(context.into())
    }
}

impl From<GateError> for ApiError {
    fn from(e: GateError) -> Self {
        Self::Gate(e)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationFailure>>,
}

impl ErrorResponse {
    fn message(error: String) -> Self {
        Self {
            error,
            code: None,
            details: None,
        }
    }
}

fn gate_response(e: GateError) -> (StatusCode, ErrorResponse) {
    let status = if e.is_auth_failure() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::BAD_REQUEST
    };
    let code = Some(e.code());
    let body = match e {
        GateError::ValidationFailed(failures) => ErrorResponse {
            error: "Validation failed".to_string(),
            code,
            details: Some(failures),
        },
        GateError::UploadRejected(reason) => ErrorResponse {
            error: reason.message(),
            code,
            details: None,
        },
        other => ErrorResponse {
            error: other.to_string(),
            code,
            details: None,
        },
    };
    (status, body)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::message(msg)),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::message(msg),
            ),
            ApiError::Gate(e) => gate_response(e),
        };
        (status, Json(body)).into_response()
    }
}
