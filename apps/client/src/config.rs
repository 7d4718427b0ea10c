use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote analysis service, e.g. `https://screener.example.com/api`.
    pub service_url: String,
    pub rust_log: String,
    /// Override for the single-analysis timeout, seconds.
    pub analyze_timeout_secs: u64,
    /// Override for the batch-analysis timeout, seconds.
    pub batch_timeout_secs: u64,
}

const DEFAULT_ANALYZE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_BATCH_TIMEOUT_SECS: u64 = 300;

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            service_url: require_env("ANALYSIS_SERVICE_URL")?
                .trim_end_matches('/')
                .to_string(),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            analyze_timeout_secs: optional_u64("ANALYZE_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_ANALYZE_TIMEOUT_SECS),
            batch_timeout_secs: optional_u64("BATCH_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_BATCH_TIMEOUT_SECS),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => {
            let parsed = raw
                .parse::<u64>()
                .with_context(|| format!("'{key}' must be a positive integer, got '{raw}'"))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}
