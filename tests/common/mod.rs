#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use icoach::{
    ServerConfig, create_app,
    jwt::TokenCodec,
    revocation::InMemoryRevocations,
    server_config::{AuthSettings, Environment},
};
use serde_json::Value;

pub const ACCESS_SECRET: &str = "test-access-secret-test-access-secret";
pub const REFRESH_SECRET: &str = "test-refresh-secret-test-refresh-secret";

pub fn test_settings() -> AuthSettings {
    AuthSettings::new(ACCESS_SECRET, REFRESH_SECRET).with_environment(Environment::Test)
}

/// A router plus handles to the pieces tests need to inspect.
pub struct TestApp {
    pub app: Router,
    /// Codec built from the same settings as the app's.
    pub codec: TokenCodec,
    pub revocations: Arc<InMemoryRevocations>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: AuthSettings) -> Self {
        let revocations = Arc::new(InMemoryRevocations::new());
        let config = ServerConfig {
            settings: settings.clone(),
            revocations: revocations.clone(),
        };
        Self {
            app: create_app(&config),
            codec: TokenCodec::new(&settings),
            revocations,
        }
    }
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Value of the first Set-Cookie for `name`.
pub fn set_cookie_value(cookies: &[String], name: &str) -> Option<String> {
    cookies.iter().find_map(|c| {
        let (pair, _) = c.split_once(';').unwrap_or((c, ""));
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Check if cookies contain a token being cleared (Max-Age=0)
pub fn has_cleared_cookie(cookies: &[String], cookie_name: &str) -> bool {
    cookies
        .iter()
        .any(|c| c.starts_with(&format!("{}=;", cookie_name)) && c.contains("Max-Age=0"))
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub const BOUNDARY: &str = "icoach-test-boundary";

/// One file part of a multipart request.
pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub size: usize,
}

impl<'a> FilePart<'a> {
    pub fn image(field: &'a str, size: usize) -> Self {
        Self {
            field,
            file_name: "photo.jpg",
            content_type: "image/jpeg",
            size,
        }
    }
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// Build a multipart body with the given file parts, each filled with zero bytes.
pub fn multipart_body(parts: &[FilePart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.field, part.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.resize(body.len() + part.size, 0);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(path: &str, access_token: &str, parts: &[FilePart<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/v1/uploads/{}", path))
        .header("authorization", bearer(access_token))
        .header("content-type", multipart_content_type())
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}
