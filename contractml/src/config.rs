//! Engine configuration.
//!
//! Configuration can be decoded from JSON or read from `CONTRACTML_*`
//! environment variables. Every section has working defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::ConfigError;

/// Prefix of environment variables read by [`EngineConfig::from_env`].
pub const ENV_PREFIX: &str = "CONTRACTML_";

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Contract registry settings.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Execution pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Root directory of `<domain>/<version>.json` contract documents.
    #[serde(default)]
    pub contracts_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    ///
    /// Recognized variables (all prefixed with [`ENV_PREFIX`]): `LOG_LEVEL`,
    /// `LOG_FORMAT`, `MODEL_TIMEOUT` (seconds), `CACHE_TTL` (seconds) and
    /// `SCHEMAS_PATH`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));
        let mut config = Self::default();

        if let Some(level) = var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            config.logging.format = format.parse()?;
        }
        if let Some(timeout) = var("MODEL_TIMEOUT") {
            config.pipeline.inference_timeout_seconds = parse_seconds("MODEL_TIMEOUT", &timeout)?;
        }
        if let Some(ttl) = var("CACHE_TTL") {
            config.registry.cache_ttl_seconds = Some(parse_seconds("CACHE_TTL", &ttl)?);
        }
        if let Some(path) = var("SCHEMAS_PATH") {
            config.contracts_path = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.registry.validate()?;
        self.pipeline.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid("logging.level", "cannot be empty"));
        }
        Ok(())
    }
}

fn parse_seconds(key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|err| ConfigError::invalid(format!("{ENV_PREFIX}{key}"), err.to_string()))
}

/// Contract registry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Time after which a cached contract is reloaded; `None` caches for the
    /// lifetime of the registry.
    #[serde(default)]
    pub cache_ttl_seconds: Option<f64>,
}

impl RegistryConfig {
    /// Creates a configuration without cache expiry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cache TTL.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_seconds = Some(ttl.as_secs_f64());
        self
    }

    /// Gets the cache TTL as a Duration.
    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_seconds
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.cache_ttl_seconds {
            Some(ttl) if !ttl.is_finite() || ttl <= 0.0 => Err(ConfigError::invalid(
                "registry.cache_ttl_seconds",
                "must be a positive number of seconds",
            )),
            _ => Ok(()),
        }
    }
}

/// Execution pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on a single inference call, in seconds.
    #[serde(default = "default_inference_timeout")]
    pub inference_timeout_seconds: f64,
}

fn default_inference_timeout() -> f64 {
    10.0
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inference_timeout_seconds: default_inference_timeout(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inference timeout.
    #[must_use]
    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout_seconds = timeout.as_secs_f64();
        self
    }

    /// Gets the inference timeout as a Duration.
    #[must_use]
    pub fn inference_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.inference_timeout_seconds)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_inference_timeout()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let timeout = self.inference_timeout_seconds;
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(ConfigError::invalid(
                "pipeline.inference_timeout_seconds",
                "must be a positive number of seconds",
            ));
        }
        Ok(())
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Json
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Pretty => write!(f, "pretty"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(ConfigError::invalid(
                "logging.format",
                format!("unknown format '{other}'"),
            )),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `contractml=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}
