use crate::pool::PoolConfig;
use crate::utils::error::{Result, WarmPoolError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSettings {
    #[serde(default = "default_pool_size")]
    pub size: usize,
    #[serde(default = "default_max_executions")]
    pub max_executions: u64,
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: u64,
    #[serde(default = "default_maintenance_interval_secs")]
    pub maintenance_interval_secs: u64,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String, // "json" or "pretty"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
}

// Default values
fn default_pool_size() -> usize {
    5
}

fn default_max_executions() -> u64 {
    10
}

fn default_max_age_minutes() -> u64 {
    30
}

fn default_maintenance_interval_secs() -> u64 {
    60
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_api_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_max_events() -> usize {
    1000
}

fn default_retention_hours() -> u64 {
    24
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            size: default_pool_size(),
            max_executions: default_max_executions(),
            max_age_minutes: default_max_age_minutes(),
            maintenance_interval_secs: default_maintenance_interval_secs(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            retention_hours: default_retention_hours(),
        }
    }
}

impl PoolSettings {
    pub fn to_pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.size)
            .max_executions(self.max_executions)
            .max_age(Duration::from_secs(self.max_age_minutes.saturating_mul(60)))
            .maintenance_interval(Duration::from_secs(self.maintenance_interval_secs))
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| WarmPoolError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| WarmPoolError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.pool.size == 0 {
            return Err(WarmPoolError::Config(
                "pool.size must be greater than 0".to_string(),
            ));
        }

        if self.pool.max_executions == 0 {
            return Err(WarmPoolError::Config(
                "pool.max_executions must be greater than 0".to_string(),
            ));
        }

        if self.pool.max_age_minutes == 0 {
            return Err(WarmPoolError::Config(
                "pool.max_age_minutes must be greater than 0".to_string(),
            ));
        }

        if self.pool.max_age_minutes.checked_mul(60).is_none() {
            return Err(WarmPoolError::Config(format!(
                "pool.max_age_minutes is too large: {}",
                self.pool.max_age_minutes
            )));
        }

        if self.pool.maintenance_interval_secs == 0 {
            return Err(WarmPoolError::Config(
                "pool.maintenance_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.pool.acquire_timeout_secs == 0 {
            return Err(WarmPoolError::Config(
                "pool.acquire_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(WarmPoolError::Config(format!(
                "Invalid log format: {}. Must be 'pretty' or 'json'",
                self.logging.format
            )));
        }

        Ok(())
    }

    /// Create example configuration file
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let example = r#"[pool]
size = 5                       # Sessions kept warm
max_executions = 10            # Releases before a session is recycled
max_age_minutes = 30           # Age before a session is recycled
maintenance_interval_secs = 60 # How often idle sessions are checked
acquire_timeout_secs = 30      # Wait for a free session before answering 503

[api]
enabled = true
bind_address = "127.0.0.1"
bind_port = 8000

[logging]
level = "info"  # Options: "trace", "debug", "info", "warn", "error"
format = "pretty"  # Options: "pretty", "json"

[telemetry]
max_events = 1000
retention_hours = 24
"#;

        std::fs::write(path.as_ref(), example).map_err(|e| {
            WarmPoolError::Config(format!("Failed to write example config: {}", e))
        })?;

        Ok(())
    }
}
