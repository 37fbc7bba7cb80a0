//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development.

use std::env;

/// Header carrying the shared secret for `/tasks/*` endpoints.
pub const TASKS_TOKEN_HEADER: &str = "x-tasks-token";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Lichess OAuth (public) ---
    /// Lichess OAuth client ID
    pub lichess_client_id: String,
    /// Where Lichess sends the user back after authorization (the frontend)
    pub lichess_redirect_uri: String,
    /// Lichess base URL (overridable for tests)
    pub lichess_base_url: String,

    // --- Server ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// SQLite connection string
    pub database_url: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Session lifetime in minutes
    pub jwt_ttl_minutes: i64,
    /// Shared secret for `/tasks/*`; endpoints are disabled when unset
    pub tasks_token: Option<String>,

    // --- Background sync ---
    /// Minutes between full sync sweeps (0 disables the sweep)
    pub sync_interval_minutes: u64,
    /// Games requested per user during background sync
    pub sync_max_games: u32,
    /// Lifetime of a pending OAuth state/verifier pair
    pub oauth_state_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            lichess_client_id: env::var("LICHESS_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("LICHESS_CLIENT_ID"))?,
            lichess_redirect_uri: env::var("LICHESS_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:5173/callback".to_string()),
            lichess_base_url: env::var("LICHESS_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://lichess.org".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://lichess_stats.db".to_string()),
            port: parse_or("PORT", 8000)?,

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            jwt_ttl_minutes: parse_or("JWT_TTL_MINUTES", 60 * 24 * 7)?,
            tasks_token: env::var("TASKS_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),

            sync_interval_minutes: parse_or("SYNC_INTERVAL_MINUTES", 0)?,
            sync_max_games: parse_or("SYNC_MAX_GAMES", 50)?,
            oauth_state_ttl_secs: parse_or("OAUTH_STATE_TTL_SECS", 600)?,
        })
    }

    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            lichess_client_id: "test_client_id".to_string(),
            lichess_redirect_uri: "http://localhost:5173/callback".to_string(),
            lichess_base_url: "http://127.0.0.1:9".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            database_url: "sqlite::memory:".to_string(),
            port: 8000,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            jwt_ttl_minutes: 60,
            tasks_token: Some("test_tasks_token".to_string()),
            sync_interval_minutes: 0,
            sync_max_games: 50,
            oauth_state_ttl_secs: 600,
        }
    }
}

/// Parse an optional numeric variable, falling back to `default` when unset.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
