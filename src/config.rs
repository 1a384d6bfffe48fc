// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Minimum length of `AUTH_SECRET`, in bytes.
pub const MIN_AUTH_SECRET_LEN: usize = 32;

/// Application configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Externally visible base URL of this service, used for callback URLs
    pub public_url: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Lifetime of a session issued at login (`sessionTTL`)
    pub session_ttl: Duration,
    /// Maximum age of a state token; `None` disables the freshness check
    pub state_max_age: Option<Duration>,
    /// Timeout for outbound calls to identity providers
    pub http_timeout: Duration,
    /// Deployer trust decision: treat IdP emails as verified
    pub allow_email_linking: bool,
    /// SQLite URL; the in-memory adapter is used when absent
    pub database_url: Option<String>,
    /// Google OAuth client ID (public)
    pub google_client_id: Option<String>,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: Option<String>,
    /// Master secret for state-token signing (raw bytes)
    pub auth_secret: Vec<u8>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("public_url", &self.public_url)
            .field("frontend_url", &self.frontend_url)
            .field("port", &self.port)
            .field("session_ttl", &self.session_ttl)
            .field("state_max_age", &self.state_max_age)
            .field("http_timeout", &self.http_timeout)
            .field("allow_email_linking", &self.allow_email_linking)
            .field("database_url", &self.database_url)
            .field("google_client_id", &self.google_client_id)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            public_url: "http://localhost:8080".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            session_ttl: Duration::from_secs(300),
            state_max_age: Some(Duration::from_secs(600)),
            http_timeout: Duration::from_secs(5),
            allow_email_linking: false,
            database_url: None,
            google_client_id: Some("test_client_id".to_string()),
            google_client_secret: Some("test_client_secret".to_string()),
            auth_secret: b"test_auth_secret_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let auth_secret = env::var("AUTH_SECRET")
            .map_err(|_| ConfigError::Missing("AUTH_SECRET"))?
            .trim()
            .as_bytes()
            .to_vec();
        if auth_secret.len() < MIN_AUTH_SECRET_LEN {
            return Err(ConfigError::Invalid(
                "AUTH_SECRET",
                format!("must be at least {MIN_AUTH_SECRET_LEN} bytes"),
            ));
        }

        let session_ttl = parse_secs("SESSION_TTL_SECS", 300)?;
        if session_ttl.is_zero() {
            return Err(ConfigError::Invalid(
                "SESSION_TTL_SECS",
                "must be greater than zero".to_string(),
            ));
        }

        let state_max_age = parse_secs("STATE_MAX_AGE_SECS", 600)?;

        Ok(Self {
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            session_ttl,
            state_max_age: (!state_max_age.is_zero()).then_some(state_max_age),
            http_timeout: parse_secs("HTTP_TIMEOUT_SECS", 10)?,
            allow_email_linking: parse_bool("ALLOW_EMAIL_LINKING")?,
            database_url: non_empty_var("DATABASE_URL"),
            google_client_id: non_empty_var("GOOGLE_CLIENT_ID"),
            google_client_secret: non_empty_var("GOOGLE_CLIENT_SECRET"),
            auth_secret,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_secs(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match non_empty_var(name) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::Invalid(name, e.to_string())),
    }
}

fn parse_bool(name: &'static str) -> Result<bool, ConfigError> {
    match non_empty_var(name).as_deref() {
        None => Ok(false),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("FALSE") | Some("no") => Ok(false),
        Some(other) => Err(ConfigError::Invalid(
            name,
            format!("expected a boolean, got {other:?}"),
        )),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
