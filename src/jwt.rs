//! JWT token generation and validation.
//!
//! Access and refresh tokens are signed with two different secrets and carry
//! their kind in the `typ` claim. Verification takes the current time as an
//! argument (`verify_at`) so expiry is a pure function of the inputs.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::GateError;
use crate::server_config::AuthSettings;

/// Lifetime used when a duration string cannot be parsed: 7 days.
pub const DEFAULT_DURATION_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// Convert a lifetime such as `"15m"` or `"7d"` to milliseconds.
///
/// Accepts exactly `<digits><d|h|m|s>`. Anything else, including partial
/// matches like `"7days"`, `" 1h"` or a bare `"30"`, returns
/// [`DEFAULT_DURATION_MS`] instead of failing. Values that overflow `u64`
/// milliseconds fall back the same way.
pub fn parse_duration(value: &str) -> u64 {
    parse_duration_literal(value).unwrap_or(DEFAULT_DURATION_MS)
}

/// Whether `value` is a well-formed duration literal (no fallback needed).
pub fn is_duration_literal(value: &str) -> bool {
    parse_duration_literal(value).is_some()
}

fn parse_duration_literal(value: &str) -> Option<u64> {
    let unit = value.chars().last()?;
    let digits = &value[..value.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;
    let unit_ms: u64 = match unit {
        'd' => 24 * 60 * 60 * 1000,
        'h' => 60 * 60 * 1000,
        'm' => 60 * 1000,
        's' => 1000,
        _ => return None,
    };
    amount.checked_mul(unit_ms)
}

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived token authorizing individual API calls.
    Access,
    /// Long-lived token used only to mint new token pairs.
    Refresh,
}

/// JWT claims shared by both token kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    pub iss: String,
    pub aud: String,
    /// Token kind
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    /// JWT ID, used by the revocation store
    pub jti: String,
}

/// Verified identity derived from a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject_id: String,
    pub issued_at: u64,
    pub expires_at: u64,
    pub token_kind: TokenKind,
    pub token_id: String,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.sub,
            issued_at: claims.iat,
            expires_at: claims.exp,
            token_kind: claims.kind,
            token_id: claims.jti,
        }
    }
}

/// An access token and a refresh token issued together.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: u64,
}

impl SigningKeys {
    fn new(secret: &[u8], lifetime_ms: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            lifetime_secs: lifetime_ms / 1000,
        }
    }
}

/// Signs and verifies access and refresh tokens.
#[derive(Clone)]
pub struct TokenCodec {
    access: SigningKeys,
    refresh: SigningKeys,
    issuer: String,
    audience: String,
}

impl TokenCodec {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            access: SigningKeys::new(&settings.access_secret, settings.access_lifetime_ms()),
            refresh: SigningKeys::new(&settings.refresh_secret, settings.refresh_lifetime_ms()),
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
        }
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Token lifetime in seconds for the given kind.
    pub fn lifetime_secs(&self, kind: TokenKind) -> u64 {
        self.keys(kind).lifetime_secs
    }

    /// Issue a token of the given kind, valid from now.
    pub fn issue(&self, subject_id: &str, kind: TokenKind) -> Result<String, JwtError> {
        self.issue_at(subject_id, kind, now_secs()?)
    }

    /// Issue a token of the given kind as if the clock read `now` (Unix seconds).
    pub fn issue_at(&self, subject_id: &str, kind: TokenKind, now: u64) -> Result<String, JwtError> {
        let keys = self.keys(kind);
        let claims = Claims {
            sub: subject_id.to_string(),
            iat: now,
            exp: now.saturating_add(keys.lifetime_secs),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(JwtError::Encoding)
    }

    /// Issue a fresh access + refresh pair for a subject.
    pub fn issue_pair(&self, subject_id: &str) -> Result<TokenPair, JwtError> {
        self.issue_pair_at(subject_id, now_secs()?)
    }

    pub fn issue_pair_at(&self, subject_id: &str, now: u64) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.issue_at(subject_id, TokenKind::Access, now)?,
            refresh_token: self.issue_at(subject_id, TokenKind::Refresh, now)?,
        })
    }

    /// Verify a token of the expected kind against the system clock.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Principal, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.verify_at(token, kind, now)
    }

    /// Verify a token of the expected kind as if the clock read `now`.
    ///
    /// Signature, issuer, audience and kind are checked before expiry, so a
    /// tampered token is reported as invalid even when it is also expired.
    pub fn verify_at(&self, token: &str, kind: TokenKind, now: u64) -> Result<Principal, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let token_data =
            jsonwebtoken::decode::<Claims>(token, &self.keys(kind).decoding, &validation)
                .map_err(|e| match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                })?;

        let claims = token_data.claims;
        if claims.kind != kind {
            return Err(TokenError::Invalid);
        }
        if now > claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims.into())
    }
}

pub(crate) fn now_secs() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

/// Errors that can occur while issuing a token.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for JwtError {}

/// Reasons a presented token is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Invalid => write!(f, "Invalid token"),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<TokenError> for GateError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => GateError::TokenExpired,
            TokenError::Invalid => GateError::TokenInvalid,
        }
    }
}
