//! Harness configuration
//!
//! Loaded from a YAML or JSON file. Every field has a default, so an empty
//! document is a valid configuration.

use std::path::{Path, PathBuf};

use probe_domain::{Headers, RetryPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Environment variable overriding [`HarnessConfig::endpoint`].
pub const ENV_ENDPOINT: &str = "PROBE_ENDPOINT";
/// Environment variable overriding [`HarnessConfig::timeout_ms`].
pub const ENV_TIMEOUT_MS: &str = "PROBE_TIMEOUT_MS";

const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid YAML or JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// The endpoint is not an absolute URL.
    #[error("invalid endpoint '{0}': expected an absolute http(s) URL")]
    InvalidEndpoint(String),

    /// A timeout of zero was configured.
    #[error("{field} must be greater than zero")]
    ZeroTimeout {
        /// Offending field.
        field: &'static str,
    },

    /// An environment override could not be parsed.
    #[error("invalid value '{value}' for {name}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Top-level harness configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Suite name, used in reports.
    pub name: String,
    /// Glob selecting scenario files, relative to the config file.
    pub tests: String,
    /// Directory receiving `report.json`, relative to the config file.
    pub output: PathBuf,
    /// Base URL for relative request URLs.
    pub endpoint: Option<String>,
    /// Headers sent with every request.
    #[serde(alias = "defaultHeaders")]
    pub default_headers: Headers,
    /// Per-request timeout in milliseconds.
    #[serde(alias = "timeout")]
    pub timeout_ms: u64,
    /// Budget for hooks plus body of one scenario.
    #[serde(alias = "scenarioTimeout")]
    pub scenario_timeout_ms: Option<u64>,
    /// Plugin switches.
    pub plugins: PluginsConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            name: "probe".to_string(),
            tests: "./scenarios/*.yaml".to_string(),
            output: PathBuf::from("./output"),
            endpoint: None,
            default_headers: Headers::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            scenario_timeout_ms: None,
            plugins: PluginsConfig::default(),
        }
    }
}

/// Plugin section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Retry of steps that failed on the network.
    #[serde(alias = "retryFailedStep")]
    pub retry_failed_step: RetryFailedStepConfig,
    /// Accepted for compatibility; has no effect on HTTP-only runs.
    #[serde(alias = "screenshotOnFail")]
    pub screenshot_on_fail: ScreenshotOnFailConfig,
}

/// Settings of the retry plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryFailedStepConfig {
    /// Retry idempotent requests automatically.
    pub enabled: bool,
    /// Retries after the first attempt.
    pub retries: u32,
    /// Delay before the first retry.
    #[serde(alias = "minTimeout")]
    pub delay_ms: u64,
    /// Delay multiplier between retries.
    #[serde(alias = "factor")]
    pub backoff_factor: f64,
    /// Upper bound for a single delay.
    #[serde(alias = "maxTimeout")]
    pub max_delay_ms: u64,
}

impl Default for RetryFailedStepConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            retries: 3,
            delay_ms: 1000,
            backoff_factor: 1.5,
            max_delay_ms: 5000,
        }
    }
}

/// Settings of the screenshot plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotOnFailConfig {
    /// Ignored.
    pub enabled: bool,
}

impl HarnessConfig {
    /// Parses and validates a YAML (or JSON) document.
    ///
    /// Environment overrides are not applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed documents and a
    /// validation error for unusable values.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file, applies environment overrides and validates.
    ///
    /// Relative `tests` and `output` paths are resolved against the
    /// directory holding the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub async fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str::<Self>(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let config = config
            .with_env_overrides(|name| std::env::var(name).ok())?
            .relative_to(base);
        config.validate()?;
        Ok(config)
    }

    /// Applies `PROBE_ENDPOINT` and `PROBE_TIMEOUT_MS` from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnv` if the timeout is not a number.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.endpoint = Some(endpoint);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_TIMEOUT_MS,
                value: raw,
            })?;
        }
        Ok(self)
    }

    /// Resolves relative `tests` and `output` against `base`.
    #[must_use]
    pub fn relative_to(mut self, base: &Path) -> Self {
        if Path::new(&self.tests).is_relative() {
            self.tests = base.join(&self.tests).to_string_lossy().into_owned();
        }
        if self.output.is_relative() {
            self.output = base.join(&self.output);
        }
        self
    }

    /// Checks the endpoint and timeouts.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            let valid = Url::parse(endpoint)
                .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host());
            if !valid {
                return Err(ConfigError::InvalidEndpoint(endpoint.clone()));
            }
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout {
                field: "timeout_ms",
            });
        }
        if self.scenario_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout {
                field: "scenario_timeout_ms",
            });
        }
        Ok(())
    }

    /// Returns true if idempotent requests are retried automatically.
    #[must_use]
    pub const fn retry_enabled(&self) -> bool {
        self.plugins.retry_failed_step.enabled
    }

    /// Retry policy derived from the retry plugin settings.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        let retry = &self.plugins.retry_failed_step;
        RetryPolicy {
            max_attempts: retry.retries.saturating_add(1),
            delay_ms: retry.delay_ms,
            backoff_factor: retry.backoff_factor,
            max_delay_ms: retry.max_delay_ms,
        }
    }
}
