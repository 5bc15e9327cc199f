//! Session endpoint rejections.

use axum::{
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};

use super::cookie::{CookieDescriptor, REFRESH_COOKIE_NAME};
use super::session::SessionError;
use crate::api::error::ApiError;

/// A failed refresh: renders the error and clears the refresh cookie so the
/// client stops presenting a dead token.
#[derive(Debug)]
pub struct SessionEnded {
    error: ApiError,
    clear_cookie: String,
}

impl SessionEnded {
    pub fn new(error: SessionError, cookies: &CookieDescriptor) -> Self {
        let error = match error {
            SessionError::Rejected(e) => ApiError::from(e),
            SessionError::Issue(e) => ApiError::internal_error("Failed to issue tokens", e),
        };
        Self {
            error,
            clear_cookie: cookies.clear_cookie(REFRESH_COOKIE_NAME),
        }
    }
}

impl IntoResponse for SessionEnded {
    fn into_response(self) -> Response {
        let mut response = self.error.into_response();
        if let Ok(value) = HeaderValue::from_str(&self.clear_cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        response
    }
}
