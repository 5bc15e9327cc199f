//! Auth configuration, read once at startup and immutable afterwards.
//!
//! The settings are passed explicitly (behind an `Arc`) to everything that
//! needs them; no gate reads the environment on its own.

use tracing::warn;

use crate::jwt::{DEFAULT_DURATION_MS, parse_duration};

/// Minimum accepted length for either signing secret.
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

pub const DEFAULT_ACCESS_EXPIRES_IN: &str = "15m";
pub const DEFAULT_REFRESH_EXPIRES_IN: &str = "7d";
pub const DEFAULT_ISSUER: &str = "icoach-app";
pub const DEFAULT_AUDIENCE: &str = "icoach-users";

/// Deployment environment. Only `Production` turns on `Secure` cookies.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Everything the token codec and cookie policy need.
#[derive(Clone)]
pub struct AuthSettings {
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
    /// Access token lifetime, e.g. `"15m"`.
    pub access_expires_in: String,
    /// Refresh token lifetime, e.g. `"7d"`. Also drives the cookie `Max-Age`.
    pub refresh_expires_in: String,
    pub issuer: String,
    pub audience: String,
    pub environment: Environment,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_expires_in", &self.access_expires_in)
            .field("refresh_expires_in", &self.refresh_expires_in)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("environment", &self.environment)
            .finish()
    }
}

impl AuthSettings {
    /// Settings with the default lifetimes, issuer and audience.
    pub fn new(access_secret: impl Into<Vec<u8>>, refresh_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_expires_in: DEFAULT_ACCESS_EXPIRES_IN.to_string(),
            refresh_expires_in: DEFAULT_REFRESH_EXPIRES_IN.to_string(),
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            environment: Environment::default(),
        }
    }

    pub fn with_lifetimes(mut self, access: &str, refresh: &str) -> Self {
        self.access_expires_in = access.to_string();
        self.refresh_expires_in = refresh.to_string();
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn access_lifetime_ms(&self) -> u64 {
        parse_duration(&self.access_expires_in)
    }

    pub fn refresh_lifetime_ms(&self) -> u64 {
        parse_duration(&self.refresh_expires_in)
    }

    /// Check the invariants the rest of the crate relies on.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.access_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(SettingsError::SecretTooShort("access"));
        }
        if self.refresh_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(SettingsError::SecretTooShort("refresh"));
        }
        if self.access_secret == self.refresh_secret {
            return Err(SettingsError::SharedSecret);
        }
        if self.issuer.is_empty() {
            return Err(SettingsError::Empty("issuer"));
        }
        if self.audience.is_empty() {
            return Err(SettingsError::Empty("audience"));
        }
        Ok(())
    }

    /// Warn about lifetime strings that silently fell back to the default.
    pub fn warn_on_lenient_lifetimes(&self) {
        for (name, value) in [
            ("access", &self.access_expires_in),
            ("refresh", &self.refresh_expires_in),
        ] {
            if !crate::jwt::is_duration_literal(value) {
                warn!(
                    kind = name,
                    value = %value,
                    fallback_ms = DEFAULT_DURATION_MS,
                    "Token lifetime is not of the form <integer><d|h|m|s>, using the 7 day default"
                );
            }
        }
    }
}

/// Invalid auth configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    SecretTooShort(&'static str),
    SharedSecret,
    Empty(&'static str),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::SecretTooShort(kind) => write!(
                f,
                "The {} token secret is shorter than {} characters",
                kind, MIN_JWT_SECRET_LENGTH
            ),
            SettingsError::SharedSecret => {
                write!(f, "Access and refresh token secrets must be different")
            }
            SettingsError::Empty(name) => write!(f, "The token {} must not be empty", name),
        }
    }
}

impl std::error::Error for SettingsError {}
