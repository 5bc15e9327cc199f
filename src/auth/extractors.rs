//! Request authentication pipeline and its axum extractor.
//!
//! Each request walks `Unauthenticated -> TokenExtracted -> Verified ->
//! Authorized`, or stops in `Rejected` with the first failure. Nothing is
//! attached to the request unless it reaches `Authorized`.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::cookie::{ACCESS_COOKIE_NAME, get_cookie};
use super::state::HasAuthBackend;
use crate::api::error::ApiError;
use crate::error::GateError;
use crate::jwt::{Principal, TokenCodec, TokenError, TokenKind};

/// Pipeline stage, recorded in debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    Unauthenticated,
    TokenExtracted,
    Verified,
    Authorized,
    Rejected,
}

/// Token from `Authorization: Bearer <token>`, if well formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme != "Bearer" {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Locate the access token: bearer header first, then the access cookie.
///
/// A malformed or empty `Authorization` header counts as absent, so the
/// cookie is still consulted.
pub fn extract_from(headers: &HeaderMap) -> Option<&str> {
    bearer_token(headers).or_else(|| {
        get_cookie(headers, ACCESS_COOKIE_NAME).filter(|token| !token.is_empty())
    })
}

fn reject(stage: AuthStage, error: GateError) -> GateError {
    debug!(from = ?stage, to = ?AuthStage::Rejected, reason = error.code(), "Request rejected");
    error
}

fn run_pipeline(
    headers: &HeaderMap,
    verify: impl FnOnce(&str) -> Result<Principal, TokenError>,
) -> Result<Principal, GateError> {
    let stage = AuthStage::Unauthenticated;
    let Some(token) = extract_from(headers) else {
        return Err(reject(stage, GateError::TokenAbsent));
    };

    let stage = AuthStage::TokenExtracted;
    let principal = verify(token).map_err(|e| reject(stage, e.into()))?;

    debug!(stage = ?AuthStage::Verified, subject = %principal.subject_id, "Token verified");
    debug!(stage = ?AuthStage::Authorized, subject = %principal.subject_id, "Request authorized");
    Ok(principal)
}

/// Authenticate a request against the system clock.
pub fn authenticate(headers: &HeaderMap, codec: &TokenCodec) -> Result<Principal, GateError> {
    run_pipeline(headers, |token| codec.verify(token, TokenKind::Access))
}

/// Authenticate a request as if the clock read `now` (Unix seconds).
pub fn authenticate_at(
    headers: &HeaderMap,
    codec: &TokenCodec,
    now: u64,
) -> Result<Principal, GateError> {
    run_pipeline(headers, |token| codec.verify_at(token, TokenKind::Access, now))
}

/// Extractor for endpoints that require an authenticated caller.
///
/// On success the principal is also stored in the request extensions.
pub struct Auth(pub Principal);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(Auth(principal.clone()));
        }
        let principal = authenticate(&parts.headers, &state.auth().codec)?;
        parts.extensions.insert(principal.clone());
        Ok(Auth(principal))
    }
}

/// Middleware form of [`Auth`] for whole routers.
pub async fn require_auth<S>(
    State(state): State<S>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: HasAuthBackend + Clone + Send + Sync,
{
    let principal = authenticate(request.headers(), &state.auth().codec)?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_config::AuthSettings;
    use axum::http::HeaderValue;

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthSettings::new(
            "access-secret-access-secret-access-secret",
            "refresh-secret-refresh-secret-refresh-secret",
        ))
    }

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_bearer_preferred_over_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "accessToken=from-cookie"),
        ]);
        assert_eq!(extract_from(&h), Some("from-header"));
    }

    #[test]
    fn test_cookie_fallback() {
        let h = headers(&[(header::COOKIE, "accessToken=from-cookie")]);
        assert_eq!(extract_from(&h), Some("from-cookie"));
    }

    #[test]
    fn test_malformed_bearer_counts_as_absent() {
        for auth in ["Bearer", "Bearer ", "Basic abc", "bearer abc", "Token"] {
            let h = headers(&[(header::AUTHORIZATION, auth)]);
            assert_eq!(extract_from(&h), None, "{:?}", auth);

            let h = headers(&[
                (header::AUTHORIZATION, auth),
                (header::COOKIE, "accessToken=from-cookie"),
            ]);
            assert_eq!(extract_from(&h), Some("from-cookie"), "{:?}", auth);
        }
    }

    #[test]
    fn test_nothing_presented() {
        assert_eq!(extract_from(&HeaderMap::new()), None);
        let h = headers(&[(header::COOKIE, "accessToken=")]);
        assert_eq!(extract_from(&h), None);
    }

    #[test]
    fn test_pipeline_outcomes() {
        let codec = codec();
        let now = 1_700_000_000;
        let access = codec.issue_at("user-1", TokenKind::Access, now).unwrap();
        let refresh = codec.issue_at("user-1", TokenKind::Refresh, now).unwrap();

        assert_eq!(
            authenticate_at(&HeaderMap::new(), &codec, now),
            Err(GateError::TokenAbsent)
        );

        let h = headers(&[(header::AUTHORIZATION, format!("Bearer {}", access).as_str())]);
        let principal = authenticate_at(&h, &codec, now + 60).unwrap();
        assert_eq!(principal.subject_id, "user-1");
        assert_eq!(principal.token_kind, TokenKind::Access);

        assert_eq!(
            authenticate_at(&h, &codec, now + 16 * 60),
            Err(GateError::TokenExpired)
        );

        let h = headers(&[(header::AUTHORIZATION, format!("Bearer {}", refresh).as_str())]);
        assert_eq!(authenticate_at(&h, &codec, now), Err(GateError::TokenInvalid));

        let h = headers(&[(header::COOKIE, format!("accessToken={}", access).as_str())]);
        assert!(authenticate_at(&h, &codec, now).is_ok());
    }

    #[test]
    fn test_invalid_bearer_does_not_fall_back_to_cookie() {
        let codec = codec();
        let now = 1_700_000_000;
        let access = codec.issue_at("user-1", TokenKind::Access, now).unwrap();
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer not-a-jwt"),
            (header::COOKIE, format!("accessToken={}", access).as_str()),
        ]);
        assert_eq!(authenticate_at(&h, &codec, now), Err(GateError::TokenInvalid));
    }
}
