//! CLI configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the tool works with zero
//! configuration for local development.

use std::path::PathBuf;
use std::time::Duration;

use referral_store::database::DEFAULT_BUSY_TIMEOUT;

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// SQLite database file.
    /// Env: `REFERRAL_DB_PATH`
    /// Default: platform data directory (see `Database::new`).
    pub database_path: Option<PathBuf>,

    /// How long a writer waits for SQLite's write lock.
    /// Env: `REFERRAL_BUSY_TIMEOUT_MS`
    /// Default: `5000`
    pub busy_timeout: Duration,

    /// Deadline applied to each command's storage calls.
    /// Env: `REFERRAL_REQUEST_TIMEOUT_MS` (`0` disables)
    /// Default: `10000`
    pub request_timeout: Option<Duration>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            request_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("REFERRAL_DB_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("REFERRAL_BUSY_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.busy_timeout = Duration::from_millis(ms),
                Err(_) => tracing::warn!(
                    value = %val,
                    "Invalid REFERRAL_BUSY_TIMEOUT_MS, using default"
                ),
            }
        }

        if let Some(val) = lookup("REFERRAL_REQUEST_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(0) => config.request_timeout = None,
                Ok(ms) => config.request_timeout = Some(Duration::from_millis(ms)),
                Err(_) => tracing::warn!(
                    value = %val,
                    "Invalid REFERRAL_REQUEST_TIMEOUT_MS, using default"
                ),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
