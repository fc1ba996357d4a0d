//! Service configuration parsed from environment variables.
//!
//! `main` loads `.env` through `dotenvy` before calling
//! [`AppConfig::from_env`]. LLM and embedding settings live in
//! [`crate::llm::config`].

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_PRIVATE_KEY_PATH: &str = "rsa.pem";
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_CODE_CONTEXT_LIMIT: usize = 3;
pub const DEFAULT_FEEDBACK_MAX_TOKENS: u32 = 2048;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("failed to read private key {path}: {source}")]
    PrivateKey { path: PathBuf, source: std::io::Error },
}

/// Which vector store backend to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String, max_connections: u32 },
    Memory,
}

/// GitHub App identity and API endpoint.
#[derive(Debug, Clone)]
pub struct GitHubAppConfig {
    pub app_id: String,
    pub private_key_pem: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub webhook_secret: String,
    pub github: GitHubAppConfig,
    pub similarity_threshold: f64,
    pub store: StoreBackend,
    pub code_context_limit: usize,
    pub feedback_max_tokens: u32,
}

impl AppConfig {
    /// Build typed service config from environment variables.
    ///
    /// Required: `APP_ID`, `WEBHOOK_SECRET`, and `DATABASE_URL` unless
    /// `VECTOR_STORE=memory`. The private key is read from
    /// `PRIVATE_KEY_PATH` (default `rsa.pem`).
    ///
    /// # Errors
    ///
    /// Returns an error for missing required values, unparsable numbers,
    /// a threshold outside `[0, 1]`, or an unreadable private key.
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_id = require("APP_ID")?;
        let webhook_secret = require("WEBHOOK_SECRET")?;

        let key_path =
            PathBuf::from(std::env::var("PRIVATE_KEY_PATH").unwrap_or_else(|_| DEFAULT_PRIVATE_KEY_PATH.into()));
        let private_key_pem =
            std::fs::read_to_string(&key_path).map_err(|source| ConfigError::PrivateKey { path: key_path, source })?;

        let api_url = std::env::var("GITHUB_API_URL")
            .unwrap_or_else(|_| DEFAULT_GITHUB_API_URL.into())
            .trim_end_matches('/')
            .to_string();

        let similarity_threshold = parse_threshold(std::env::var("SIMILARITY_THRESHOLD").ok().as_deref())?;
        let store = parse_store(
            std::env::var("VECTOR_STORE").ok().as_deref(),
            std::env::var("DATABASE_URL").ok(),
            env_parse("DB_MAX_CONNECTIONS", 5)?,
        )?;

        Ok(Self {
            port: env_parse("PORT", DEFAULT_PORT)?,
            webhook_secret,
            github: GitHubAppConfig { app_id, private_key_pem, api_url },
            similarity_threshold,
            store,
            code_context_limit: env_parse("CODE_CONTEXT_LIMIT", DEFAULT_CODE_CONTEXT_LIMIT)?,
            feedback_max_tokens: env_parse("FEEDBACK_MAX_TOKENS", DEFAULT_FEEDBACK_MAX_TOKENS)?,
        })
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(var)),
    }
}

fn env_parse<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::Invalid { var, reason: e.to_string() }),
        Err(_) => Ok(default),
    }
}

pub(crate) fn parse_threshold(raw: Option<&str>) -> Result<f64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_SIMILARITY_THRESHOLD);
    };
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| ConfigError::Invalid { var: "SIMILARITY_THRESHOLD", reason: e.to_string() })?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid { var: "SIMILARITY_THRESHOLD", reason: format!("{value} is outside [0, 1]") });
    }
    Ok(value)
}

pub(crate) fn parse_store(
    raw: Option<&str>,
    database_url: Option<String>,
    max_connections: u32,
) -> Result<StoreBackend, ConfigError> {
    match raw.unwrap_or("postgres") {
        "postgres" => {
            let database_url = database_url
                .filter(|url| !url.trim().is_empty())
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            Ok(StoreBackend::Postgres { database_url, max_connections })
        }
        "memory" => Ok(StoreBackend::Memory),
        other => Err(ConfigError::Invalid {
            var: "VECTOR_STORE",
            reason: format!("unknown backend '{other}' (expected 'postgres' or 'memory')"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
