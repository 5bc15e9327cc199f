//! CLI argument parsing, validation, and startup helpers.

use std::sync::Arc;

use clap::Parser;
use tracing::error;

use crate::auth::{AuthBackend, REFRESH_COOKIE_NAME};
use crate::revocation::InMemoryRevocations;
use crate::server_config::{
    AuthSettings, DEFAULT_ACCESS_EXPIRES_IN, DEFAULT_AUDIENCE, DEFAULT_ISSUER,
    DEFAULT_REFRESH_EXPIRES_IN, Environment, MIN_JWT_SECRET_LENGTH,
};

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "icoach",
    about = "Auth and request validation gateway for the iCoach API"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Path to file containing the access token secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Path to file containing the refresh token secret. Prefer using JWT_REFRESH_SECRET env var instead
    #[arg(long)]
    pub jwt_refresh_secret_file: Option<String>,

    /// Access token lifetime, <integer><d|h|m|s>
    #[arg(long, env = "JWT_EXPIRES_IN", default_value = DEFAULT_ACCESS_EXPIRES_IN)]
    pub access_expires_in: String,

    /// Refresh token lifetime, <integer><d|h|m|s>. Also the refresh cookie Max-Age
    #[arg(long, env = "JWT_REFRESH_EXPIRES_IN", default_value = DEFAULT_REFRESH_EXPIRES_IN)]
    pub refresh_expires_in: String,

    /// Token issuer (iss claim)
    #[arg(long, env = "JWT_ISSUER", default_value = DEFAULT_ISSUER)]
    pub issuer: String,

    /// Token audience (aud claim)
    #[arg(long, env = "JWT_AUDIENCE", default_value = DEFAULT_AUDIENCE)]
    pub audience: String,

    /// Deployment environment. Production sets the Secure flag on cookies
    #[arg(long, env = "APP_ENV", value_enum, default_value = "development")]
    pub environment: Environment,

    /// Issue a token pair for the given subject id, print it, and exit
    #[arg(long, value_name = "SUBJECT_ID")]
    pub issue_session: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load a signing secret from an environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_secret(env_var: &str, secret_file: Option<&str>, flag: &str) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var(env_var) {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        secret
    } else if let Some(path) = secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret file");
                return None;
            }
        }
    } else {
        error!(
            "{} is required. Set the environment variable (recommended) or use {}",
            env_var, flag
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "{} is shorter than {} characters. Use a longer secret",
            env_var, MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Build and validate the auth settings from arguments and loaded secrets.
/// Returns None and logs an error if the settings are unusable.
pub fn build_settings(args: &Args, access_secret: String, refresh_secret: String) -> Option<AuthSettings> {
    let mut settings = AuthSettings::new(access_secret, refresh_secret)
        .with_lifetimes(&args.access_expires_in, &args.refresh_expires_in)
        .with_environment(args.environment);
    settings.issuer = args.issuer.clone();
    settings.audience = args.audience.clone();

    if let Err(e) = settings.validate() {
        error!(error = %e, "Invalid auth configuration");
        return None;
    }
    settings.warn_on_lenient_lifetimes();

    Some(settings)
}

/// Handle the --issue-session flag: print a fresh token pair and the refresh cookie.
pub fn handle_issue_session(settings: &AuthSettings, subject_id: &str) {
    let backend = AuthBackend::new(settings, Arc::new(InMemoryRevocations::new()));
    match backend.start_session(subject_id) {
        Ok(pair) => {
            println!();
            println!("Access token: {}", pair.access_token);
            println!("Refresh token: {}", pair.refresh_token);
            println!(
                "Set-Cookie: {}",
                backend
                    .cookies
                    .set_cookie(REFRESH_COOKIE_NAME, &pair.refresh_token)
            );
            println!();
        }
        Err(e) => {
            error!(error = %e, "Failed to issue session");
            std::process::exit(1);
        }
    }
}
