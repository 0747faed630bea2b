use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable not found: {0}")]
    EnvVarMissing(String),

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

type Result<T> = std::result::Result<T, ConfigError>;

/// Stream layer configuration
///
/// `ws_base` is the socket endpoint base (`ws://` or `wss://`); stream keys
/// append their wire path to it. The backoff settings feed the
/// reconnection policy of every connection the registry opens.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Base URL for stream sockets, e.g. `wss://dash.example.com`
    pub ws_base: String,
    /// Delay after the first failed attempt
    pub backoff_base: Duration,
    /// Ceiling for the exponential backoff
    pub backoff_cap: Duration,
    /// Subscribe-mode retry budget; monitoring streams retry without limit
    pub max_retries: u32,
}

impl StreamConfig {
    /// Configuration with default retry behavior (1 s base, 60 s cap,
    /// 3 subscribe-mode retries)
    pub fn new(ws_base: impl Into<String>) -> Self {
        Self {
            ws_base: ws_base.into(),
            backoff_base: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    /// Load configuration from the environment
    ///
    /// Reads `FRAMELINK_WS_URL` (required), `FRAMELINK_BACKOFF_BASE_MS`,
    /// `FRAMELINK_BACKOFF_CAP_MS` and `FRAMELINK_MAX_RETRIES`.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Don't fail if .env doesn't exist

        let ws_base = std::env::var("FRAMELINK_WS_URL")
            .map_err(|_| ConfigError::EnvVarMissing("FRAMELINK_WS_URL".to_string()))?;

        let mut config = Self::new(ws_base);

        if let Some(ms) = env_u64("FRAMELINK_BACKOFF_BASE_MS")? {
            config.backoff_base = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("FRAMELINK_BACKOFF_CAP_MS")? {
            config.backoff_cap = Duration::from_millis(ms);
        }
        if let Some(retries) = env_u64("FRAMELINK_MAX_RETRIES")? {
            config.max_retries = retries as u32;
        }

        config.validate()?;
        info!("Loaded stream config for {}", config.ws_base);
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.ws_base.starts_with("ws://") && !self.ws_base.starts_with("wss://") {
            return Err(ConfigError::ValidationError(format!(
                "ws_base must start with ws:// or wss://, got '{}'",
                self.ws_base
            )));
        }

        if self.backoff_base.is_zero() {
            return Err(ConfigError::ValidationError(
                "backoff_base must be greater than 0".to_string(),
            ));
        }

        if self.backoff_cap < self.backoff_base {
            return Err(ConfigError::ValidationError(
                "backoff_cap must be at least backoff_base".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_u64(var: &str) -> Result<Option<u64>> {
    match std::env::var(var) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_policy() {
        let config = StreamConfig::new("wss://dash.example.com");
        assert_eq!(config.backoff_base, Duration::from_secs(1));
        assert_eq!(config.backoff_cap, Duration::from_secs(60));
        assert_eq!(config.max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_ws_scheme() {
        let config = StreamConfig::new("https://dash.example.com");
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_base() {
        let mut config = StreamConfig::new("ws://localhost:9000");
        config.backoff_base = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_cap_below_base() {
        let mut config = StreamConfig::new("ws://localhost:9000");
        config.backoff_cap = Duration::from_millis(10);
        assert!(config.validate().is_err());
    }
}
