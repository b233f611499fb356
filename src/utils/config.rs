use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::retry::RetryPolicy;

pub const DEFAULT_API_URL: &str = "http://www.nbrb.by/API/ExRates/Rates/Dynamics";

pub struct Config {
    pub api_url: String,
    pub timeout_seconds: u64,
    pub retry: RetryPolicy,
    /// Directory holding the cached CSV files.
    pub base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: 30,
            retry: RetryPolicy::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let retry = RetryPolicy {
            retry_limit: env_parse("NBRB_RETRY_LIMIT").unwrap_or(defaults.retry.retry_limit),
            backoff: env_parse("NBRB_BACKOFF_MILLIS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.backoff),
            ..defaults.retry
        };
        Self {
            api_url: env::var("NBRB_API_URL").unwrap_or(defaults.api_url),
            timeout_seconds: env_parse("NBRB_TIMEOUT_SECONDS").unwrap_or(defaults.timeout_seconds),
            retry,
            base_dir: env::var("NBRB_RATES_BASE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.base_dir),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
