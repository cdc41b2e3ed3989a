use crate::error::{AppError, Result};

/// Exclusive upper bound on a single bet, in cents (100,000,000.00).
pub const MAX_BET_CENTS: i64 = 10_000_000_000;

/// Fraction digits carried by every monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Largest body accepted by the results upload endpoint.
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    /// Pool size (DB_MAX_CONNECTIONS)
    pub db_max_connections: u32,
    /// Seconds a writer waits for the SQLite write lock (DB_BUSY_TIMEOUT_SECS)
    pub db_busy_timeout_secs: u64,
    pub api_port: u16,
    /// HMAC secret for bearer tokens (JWT_SECRET, required)
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "betting.db".to_string()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "8".to_string())
                .parse::<u32>()
                .unwrap_or(8)
                .max(1),
            db_busy_timeout_secs: std::env::var("DB_BUSY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse::<u64>()
                .unwrap_or(5),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            jwt_secret: std::env::var("JWT_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| AppError::Config("JWT_SECRET must be set".to_string()))?,
        })
    }
}
