//! Failure taxonomy shared by the token, validation, and upload gates.
//!
//! Every rejection the core produces is one of these values. Nothing here
//! formats HTTP responses; the API boundary does that.

use crate::upload::UploadRejection;
use crate::validation::ValidationFailure;

/// A terminal, non-retryable rejection from one of the request gates.
#[derive(Debug, Clone, PartialEq)]
pub enum GateError {
    /// One or more validation rules failed. Failures are in rule order.
    ValidationFailed(Vec<ValidationFailure>),
    /// The token was well-formed and correctly signed but `now > exp`.
    TokenExpired,
    /// Bad signature, wrong issuer/audience, wrong kind, or malformed token.
    TokenInvalid,
    /// No token was presented.
    TokenAbsent,
    /// An uploaded file did not pass the upload gate.
    UploadRejected(UploadRejection),
}

impl GateError {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            GateError::ValidationFailed(_) => "validation_failed",
            GateError::TokenExpired => "token_expired",
            GateError::TokenInvalid => "token_invalid",
            GateError::TokenAbsent => "token_absent",
            GateError::UploadRejected(reason) => reason.code(),
        }
    }

    /// Whether this failure means the caller has to authenticate again.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            GateError::TokenExpired | GateError::TokenInvalid | GateError::TokenAbsent
        )
    }
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateError::ValidationFailed(failures) => {
                write!(f, "Validation failed ({} field errors)", failures.len())
            }
            GateError::TokenExpired => write!(f, "Token has expired"),
            GateError::TokenInvalid => write!(f, "Invalid token"),
            GateError::TokenAbsent => write!(f, "Not authenticated"),
            GateError::UploadRejected(reason) => write!(f, "{}", reason.message()),
        }
    }
}

impl std::error::Error for GateError {}
