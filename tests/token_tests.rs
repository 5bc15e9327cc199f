//! Tests for the dual-token authentication system.
//!
//! Tests cover:
//! - Bearer and cookie access tokens on protected endpoints
//! - Expired, tampered, cross-kind and missing tokens
//! - Refresh rotation and single use of refresh tokens
//! - Logout and cookie clearing

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{
    TestApp, bearer, body_json, extract_set_cookies, has_cleared_cookie, set_cookie_value,
    test_settings,
};
use icoach::{jwt::TokenKind, revocation::SessionRevocation, server_config::Environment};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn me_request(authorization: Option<&str>, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/api/v1/auth/me");
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    if let Some(value) = cookie {
        builder = builder.header("cookie", value);
    }
    builder.body(Body::empty()).unwrap()
}

fn refresh_request(refresh_token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/refresh");
    if let Some(token) = refresh_token {
        builder = builder.header("cookie", format!("refreshToken={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

// =============================================================================
// Access Token Tests
// =============================================================================

#[tokio::test]
async fn test_bearer_access_token_authenticates() {
    let test = TestApp::new();
    let access = test.codec.issue("user-42", TokenKind::Access).unwrap();

    let response = test
        .app
        .oneshot(me_request(Some(&bearer(&access)), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["subjectId"], "user-42");
}

#[tokio::test]
async fn test_cookie_access_token_authenticates() {
    let test = TestApp::new();
    let access = test.codec.issue("user-42", TokenKind::Access).unwrap();

    let response = test
        .app
        .oneshot(me_request(None, Some(&format!("accessToken={}", access))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_no_token_is_absent() {
    let test = TestApp::new();

    let response = test.app.oneshot(me_request(None, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "token_absent");
    assert_eq!(body["error"], "Not authenticated");
}

#[tokio::test]
async fn test_expired_access_token() {
    let test = TestApp::new();
    let access = test
        .codec
        .issue_at("user-42", TokenKind::Access, now() - 60 * 60)
        .unwrap();

    let response = test
        .app
        .oneshot(me_request(Some(&bearer(&access)), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "token_expired");
    assert_eq!(body["error"], "Token has expired");
}

#[tokio::test]
async fn test_tampered_access_token() {
    let test = TestApp::new();
    let access = test.codec.issue("user-42", TokenKind::Access).unwrap();
    let mut tampered = access.into_bytes();
    let last = tampered.len() - 2;
    tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let response = test
        .app
        .oneshot(me_request(Some(&bearer(&tampered)), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "token_invalid");
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let test = TestApp::new();
    let refresh = test.codec.issue("user-42", TokenKind::Refresh).unwrap();

    let response = test
        .app
        .oneshot(me_request(Some(&bearer(&refresh)), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "token_invalid");
}

#[tokio::test]
async fn test_verify_endpoint() {
    let test = TestApp::new();
    let access = test.codec.issue("user-42", TokenKind::Access).unwrap();

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/verify")
                .header("authorization", bearer(&access))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test
        .app
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/verify")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Refresh Tests
// =============================================================================

#[tokio::test]
async fn test_refresh_rotates_pair() {
    let test = TestApp::new();
    let pair = test.codec.issue_pair("user-42").unwrap();

    let response = test
        .app
        .clone()
        .oneshot(refresh_request(Some(&pair.refresh_token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = extract_set_cookies(&response);
    let new_refresh = set_cookie_value(&cookies, "refreshToken").unwrap();
    assert_ne!(new_refresh, pair.refresh_token);
    assert!(cookies[0].contains("HttpOnly"));
    assert!(cookies[0].contains("SameSite=Strict"));
    assert!(cookies[0].contains("Max-Age=604800"));
    assert!(!cookies[0].contains("Secure"));

    let body = body_json(response).await;
    assert_eq!(body["expiresIn"], 15 * 60);
    let access = body["accessToken"].as_str().unwrap();
    let principal = test.codec.verify(access, TokenKind::Access).unwrap();
    assert_eq!(principal.subject_id, "user-42");

    let principal = test.codec.verify(&new_refresh, TokenKind::Refresh).unwrap();
    assert_eq!(principal.subject_id, "user-42");
    assert_eq!(test.revocations.len(), 1);
}

#[tokio::test]
async fn test_refresh_token_is_single_use() {
    let test = TestApp::new();
    let pair = test.codec.issue_pair("user-42").unwrap();

    let first = test
        .app
        .clone()
        .oneshot(refresh_request(Some(&pair.refresh_token)))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = test
        .app
        .oneshot(refresh_request(Some(&pair.refresh_token)))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
    assert!(has_cleared_cookie(&extract_set_cookies(&second), "refreshToken"));
    assert_eq!(body_json(second).await["code"], "token_invalid");
}

#[tokio::test]
async fn test_refresh_without_cookie_clears_and_rejects() {
    let test = TestApp::new();

    let response = test.app.oneshot(refresh_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(has_cleared_cookie(&extract_set_cookies(&response), "refreshToken"));
    assert_eq!(body_json(response).await["code"], "token_absent");
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let test = TestApp::new();
    let access = test.codec.issue("user-42", TokenKind::Access).unwrap();

    let response = test
        .app
        .oneshot(refresh_request(Some(&access)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "token_invalid");
}

#[tokio::test]
async fn test_refresh_rejects_expired_refresh_token() {
    let test = TestApp::new();
    let refresh = test
        .codec
        .issue_at("user-42", TokenKind::Refresh, now() - 8 * 24 * 60 * 60)
        .unwrap();

    let response = test
        .app
        .oneshot(refresh_request(Some(&refresh)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(has_cleared_cookie(&extract_set_cookies(&response), "refreshToken"));
    assert_eq!(body_json(response).await["code"], "token_expired");
}

#[tokio::test]
async fn test_production_cookie_is_secure() {
    let test = TestApp::with_settings(
        test_settings()
            .with_environment(Environment::Production)
            .with_lifetimes("15m", "30d"),
    );
    let pair = test.codec.issue_pair("user-42").unwrap();

    let response = test
        .app
        .oneshot(refresh_request(Some(&pair.refresh_token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = extract_set_cookies(&response);
    assert!(cookies[0].ends_with("; Secure"));
    assert!(cookies[0].contains(&format!("Max-Age={}", 30 * 24 * 60 * 60)));
}

// =============================================================================
// Logout Tests
// =============================================================================

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let test = TestApp::new();
    let pair = test.codec.issue_pair("user-42").unwrap();

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/logout")
                .header("cookie", format!("refreshToken={}", pair.refresh_token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(has_cleared_cookie(&extract_set_cookies(&response), "refreshToken"));
    assert_eq!(body_json(response).await["success"], true);

    let response = test
        .app
        .oneshot(refresh_request(Some(&pair.refresh_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let test = TestApp::new();

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(has_cleared_cookie(&extract_set_cookies(&response), "refreshToken"));
    assert!(test.revocations.is_empty());
}
