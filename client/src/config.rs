//! Client configuration parsed from environment variables.

use crate::util::money::CurrencyFormat;
use crate::util::route_guard::{DEFAULT_PUBLIC_PREFIXES, PublicRoutes};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_FIREBASE_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_FIREBASE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
pub const DEFAULT_LOCALE: &str = "th-TH";
pub const DEFAULT_CURRENCY: &str = "THB";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),

    /// A value the caller asked for is not configured.
    #[error("missing config: env var {var} not set")]
    Missing { var: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Identity backend endpoints. Absent when no API key is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub api_key: String,
    pub auth_url: String,
    pub token_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub identity: Option<IdentityConfig>,
    pub currency: CurrencyFormat,
    pub public_routes: PublicRoutes,
    pub timeouts: HttpTimeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `SWIMCLASS_API_URL`: backend REST base URL
    /// - `FIREBASE_API_KEY`: enables the identity provider
    /// - `FIREBASE_AUTH_URL` / `FIREBASE_TOKEN_URL`: emulator overrides
    /// - `SWIMCLASS_LOCALE` / `SWIMCLASS_CURRENCY`: display currency, default `th-TH` / `THB`
    /// - `SWIMCLASS_PUBLIC_ROUTES`: comma-separated public path prefixes
    /// - `SWIMCLASS_REQUEST_TIMEOUT_SECS`: default 30
    /// - `SWIMCLASS_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the currency code or a public route prefix is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = trim_url(&std::env::var("SWIMCLASS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()));

        let identity = std::env::var("FIREBASE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| IdentityConfig {
                api_key: api_key.trim().to_string(),
                auth_url: trim_url(
                    &std::env::var("FIREBASE_AUTH_URL").unwrap_or_else(|_| DEFAULT_FIREBASE_AUTH_URL.to_string()),
                ),
                token_url: trim_url(
                    &std::env::var("FIREBASE_TOKEN_URL").unwrap_or_else(|_| DEFAULT_FIREBASE_TOKEN_URL.to_string()),
                ),
            });

        let locale = std::env::var("SWIMCLASS_LOCALE").unwrap_or_else(|_| DEFAULT_LOCALE.to_string());
        let currency = parse_currency(std::env::var("SWIMCLASS_CURRENCY").ok().as_deref())?;
        let public_routes = parse_public_routes(std::env::var("SWIMCLASS_PUBLIC_ROUTES").ok().as_deref())?;
        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("SWIMCLASS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("SWIMCLASS_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_url, identity, currency: CurrencyFormat::new(locale, currency), public_routes, timeouts })
    }

    /// Identity endpoints, or an error naming the missing key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `FIREBASE_API_KEY` was not set.
    pub fn require_identity(&self) -> Result<&IdentityConfig, ConfigError> {
        self.identity.as_ref().ok_or_else(|| ConfigError::Missing { var: "FIREBASE_API_KEY".into() })
    }
}

fn trim_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_currency(raw: Option<&str>) -> Result<String, ConfigError> {
    let code = raw.unwrap_or(DEFAULT_CURRENCY).trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ConfigError::Parse(format!("invalid SWIMCLASS_CURRENCY '{code}' (expected ISO 4217 code)")));
    }
    Ok(code)
}

fn parse_public_routes(raw: Option<&str>) -> Result<PublicRoutes, ConfigError> {
    let Some(raw) = raw else {
        return Ok(PublicRoutes::new(DEFAULT_PUBLIC_PREFIXES.iter().copied()));
    };
    let mut prefixes = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !part.starts_with('/') {
            return Err(ConfigError::Parse(format!("public route prefix must start with '/': {part}")));
        }
        prefixes.push(part);
    }
    Ok(PublicRoutes::new(prefixes))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
