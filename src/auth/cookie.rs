//! Cookie policy for the refresh token, and cookie header parsing.

use axum::http::header;

use crate::server_config::{AuthSettings, Environment};

/// Cookie name for the access token (optional transport; bearer is preferred).
pub const ACCESS_COOKIE_NAME: &str = "accessToken";

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// `SameSite` attribute. Refresh cookies are never sent cross-site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
}

impl SameSite {
    pub fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
        }
    }
}

/// Transport attributes for the refresh token cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieDescriptor {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    /// Mirrors the refresh token lifetime exactly.
    pub max_age_ms: u64,
}

/// Derive the refresh cookie attributes.
///
/// `refresh_lifetime_ms` must come from the same `parse_duration` call that
/// sets the refresh token expiry; [`CookieDescriptor::from_settings`] does that.
pub fn describe(environment: Environment, refresh_lifetime_ms: u64) -> CookieDescriptor {
    CookieDescriptor {
        http_only: true,
        secure: environment.is_production(),
        same_site: SameSite::Strict,
        max_age_ms: refresh_lifetime_ms,
    }
}

impl CookieDescriptor {
    pub fn from_settings(settings: &AuthSettings) -> Self {
        describe(settings.environment, settings.refresh_lifetime_ms())
    }

    fn attributes(&self, max_age_secs: u64) -> String {
        let mut attrs = String::new();
        if self.http_only {
            attrs.push_str("; HttpOnly");
        }
        attrs.push_str("; SameSite=");
        attrs.push_str(self.same_site.as_str());
        attrs.push_str("; Path=/");
        attrs.push_str(&format!("; Max-Age={}", max_age_secs));
        if self.secure {
            attrs.push_str("; Secure");
        }
        attrs
    }

    /// `Set-Cookie` value carrying `value`.
    pub fn set_cookie(&self, name: &str, value: &str) -> String {
        format!("{}={}{}", name, value, self.attributes(self.max_age_ms / 1000))
    }

    /// `Set-Cookie` value that removes the cookie.
    pub fn clear_cookie(&self, name: &str) -> String {
        format!("{}={}", name, self.attributes(0))
    }
}

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = cookie_header.to_str() else {
            continue;
        };
        for part in cookie_header.split(';') {
            if let Some((key, value)) = part.trim().split_once('=') {
                if key.trim() == name {
                    return Some(value.trim());
                }
            }
        }
    }
    None
}
