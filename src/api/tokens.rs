//! Session API endpoints.
//!
//! - POST `/refresh` - Rotate the refresh cookie and return a new access token
//! - POST `/logout` - Revoke the refresh token and clear its cookie
//! - GET `/me` - Identity of the current access token
//! - GET `/verify` - 200 if the access token is valid, 401 otherwise

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::auth::{Auth, AuthBackend, REFRESH_COOKIE_NAME, SessionEnded, get_cookie};
use crate::impl_has_auth_backend;
use crate::jwt::TokenKind;

#[derive(Clone)]
pub struct TokensState {
    pub auth: Arc<AuthBackend>,
}

impl_has_auth_backend!(TokensState);

pub fn router(state: TokensState) -> Router {
    Router::new()
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/verify", get(verify_token))
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    /// Access token lifetime in seconds.
    expires_in: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    subject_id: String,
    issued_at: u64,
    expires_at: u64,
}

/// Exchange the refresh cookie for a new token pair.
/// The old refresh token is revoked; on any failure the cookie is cleared.
async fn refresh_token(
    State(state): State<TokensState>,
    headers: HeaderMap,
) -> Result<Response, SessionEnded> {
    let presented = get_cookie(&headers, REFRESH_COOKIE_NAME);
    let pair = state
        .auth
        .rotate(presented)
        .map_err(|e| SessionEnded::new(e, &state.auth.cookies))?;

    let refresh_cookie = state
        .auth
        .cookies
        .set_cookie(REFRESH_COOKIE_NAME, &pair.refresh_token);

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, refresh_cookie)],
        Json(RefreshResponse {
            access_token: pair.access_token,
            expires_in: state.auth.codec.lifetime_secs(TokenKind::Access),
        }),
    )
        .into_response())
}

/// Logout - revoke the refresh token if it is still live and clear its cookie.
async fn logout(State(state): State<TokensState>, headers: HeaderMap) -> impl IntoResponse {
    state
        .auth
        .logout(get_cookie(&headers, REFRESH_COOKIE_NAME));

    (
        StatusCode::OK,
        [(SET_COOKIE, state.auth.cookies.clear_cookie(REFRESH_COOKIE_NAME))],
        Json(serde_json::json!({ "success": true })),
    )
}

async fn me(Auth(principal): Auth) -> Json<MeResponse> {
    Json(MeResponse {
        subject_id: principal.subject_id,
        issued_at: principal.issued_at,
        expires_at: principal.expires_at,
    })
}

/// Lightweight auth status check.
async fn verify_token(Auth(_principal): Auth) -> StatusCode {
    StatusCode::OK
}
