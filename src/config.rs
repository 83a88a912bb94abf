use serde::Deserialize;
use std::time::Duration;

use crate::ingestion::RestartPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Redis list holding stored click events
    #[serde(default = "default_events_key")]
    pub events_key: String,

    /// Redis list the ingestion worker drains
    #[serde(default = "default_feed_key")]
    pub feed_key: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to run the background ingestion worker
    #[serde(default = "default_true")]
    pub ingestion_enabled: bool,

    /// How long a single feed poll blocks before re-polling
    #[serde(default = "default_feed_poll_timeout_secs")]
    pub feed_poll_timeout_secs: u64,

    #[serde(default = "default_worker_backoff_ms")]
    pub worker_backoff_ms: u64,

    #[serde(default = "default_worker_max_backoff_ms")]
    pub worker_max_backoff_ms: u64,

    #[serde(default = "default_min_support")]
    pub default_min_support: f64,

    #[serde(default = "default_min_confidence")]
    pub default_min_confidence: f64,

    #[serde(default = "default_max_recommendations")]
    pub default_max_recommendations: usize,

    #[serde(default = "default_window_seconds")]
    pub default_window_seconds: u32,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_events_key() -> String {
    "click_events".to_string()
}

fn default_feed_key() -> String {
    "click_events:feed".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

fn default_feed_poll_timeout_secs() -> u64 {
    5
}

fn default_worker_backoff_ms() -> u64 {
    500
}

fn default_worker_max_backoff_ms() -> u64 {
    30_000
}

fn default_min_support() -> f64 {
    0.1
}

fn default_min_confidence() -> f64 {
    0.3
}

fn default_max_recommendations() -> usize {
    5
}

fn default_window_seconds() -> u32 {
    5
}

/// Query defaults applied when a request omits a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryDefaults {
    pub min_support: f64,
    pub min_confidence: f64,
    pub max_recommendations: usize,
    pub window_seconds: u32,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            min_support: default_min_support(),
            min_confidence: default_min_confidence(),
            max_recommendations: default_max_recommendations(),
            window_seconds: default_window_seconds(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Load configuration from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn query_defaults(&self) -> QueryDefaults {
        QueryDefaults {
            min_support: self.default_min_support,
            min_confidence: self.default_min_confidence,
            max_recommendations: self.default_max_recommendations,
            window_seconds: self.default_window_seconds,
        }
    }

    pub fn restart_policy(&self) -> RestartPolicy {
        RestartPolicy {
            initial_backoff: Duration::from_millis(self.worker_backoff_ms),
            max_backoff: Duration::from_millis(self.worker_max_backoff_ms),
        }
    }

    pub fn feed_poll_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_poll_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_apply_when_env_is_empty() {
        let config = Config::from_vars(Vec::new()).unwrap();
        assert_eq!(config.redis_url, "redis://localhost:6379");
        assert_eq!(config.events_key, "click_events");
        assert_eq!(config.port, 8000);
        assert!(config.ingestion_enabled);
        assert_eq!(config.query_defaults(), QueryDefaults::default());
    }

    #[test]
    fn test_overrides_from_env() {
        let config = Config::from_vars(vars(&[
            ("REDIS_URL", "redis://cache:6380"),
            ("PORT", "9100"),
            ("INGESTION_ENABLED", "false"),
            ("DEFAULT_WINDOW_SECONDS", "10"),
            ("WORKER_BACKOFF_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.redis_url, "redis://cache:6380");
        assert_eq!(config.bind_address(), "0.0.0.0:9100");
        assert!(!config.ingestion_enabled);
        assert_eq!(config.query_defaults().window_seconds, 10);
        assert_eq!(
            config.restart_policy().initial_backoff,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = Config::from_vars(vars(&[("PORT", "not-a-port")]));
        assert!(result.is_err());
    }
}
