//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `VERACITY_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::fmt::Display;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_BATCH_DELAY_MS, DEFAULT_BATCH_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_MS, MAX_MAX_RETRIES, MAX_TEMPERATURE, MIN_MAX_RETRIES,
};
use crate::model::{Category, VerificationCriteria};
use crate::provider::ProviderKind;

/// Verifier and server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `VERACITY_*` overrides on top of defaults. Immutable once
/// built; the verifier shares it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Completion provider. Default: `openai`.
    pub provider: ProviderKind,

    /// Provider credential. Not needed for `ollama`.
    pub api_key: Option<String>,

    /// Override for the provider's endpoint base URL.
    pub base_url: Option<String>,

    /// Default model name or alias (`fast`, `accurate`). `None` uses the provider default.
    pub model: Option<String>,

    /// Retries after the first attempt, within `[1, 10]`. Default: `3`.
    pub max_retries: u32,

    /// Per-call timeout in milliseconds. Default: `30000`.
    pub timeout_ms: u64,

    /// Sampling temperature within `[0, 2]`. Default: `0.1`.
    pub temperature: f32,

    /// Maximum output tokens. Default: `1000`.
    pub max_tokens: u32,

    /// Criteria used when a call does not supply its own.
    pub criteria: VerificationCriteria,

    /// Concurrent verifications per batch chunk. Default: `3`.
    pub batch_size: usize,

    /// Pause between batch chunks in milliseconds. Default: `1000`.
    pub batch_delay_ms: u64,

    /// Send failures to the error reporter. Default: `true`.
    pub error_reporting_enabled: bool,

    /// Log filter used when `RUST_LOG` is unset. Default: `info`.
    pub log_level: String,

    /// Append metrics as JSON lines here instead of logging them.
    pub metrics_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            provider: ProviderKind::default(),
            api_key: None,
            base_url: None,
            model: None,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            criteria: VerificationCriteria::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            error_reporting_enabled: true,
            log_level: "info".to_string(),
            metrics_path: None,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "VERACITY_PORT";
    const ENV_BIND_ADDR: &'static str = "VERACITY_BIND_ADDR";
    const ENV_PROVIDER: &'static str = "VERACITY_PROVIDER";
    const ENV_API_KEY: &'static str = "VERACITY_API_KEY";
    const ENV_BASE_URL: &'static str = "VERACITY_BASE_URL";
    const ENV_MODEL: &'static str = "VERACITY_MODEL";
    const ENV_MAX_RETRIES: &'static str = "VERACITY_MAX_RETRIES";
    const ENV_TIMEOUT_MS: &'static str = "VERACITY_TIMEOUT_MS";
    const ENV_TEMPERATURE: &'static str = "VERACITY_TEMPERATURE";
    const ENV_MAX_TOKENS: &'static str = "VERACITY_MAX_TOKENS";
    const ENV_BATCH_SIZE: &'static str = "VERACITY_BATCH_SIZE";
    const ENV_BATCH_DELAY_MS: &'static str = "VERACITY_BATCH_DELAY_MS";
    const ENV_ERROR_REPORTING: &'static str = "VERACITY_ERROR_REPORTING";
    const ENV_LOG_LEVEL: &'static str = "VERACITY_LOG_LEVEL";
    const ENV_METRICS_PATH: &'static str = "VERACITY_METRICS_PATH";

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// Values that fail to parse are errors; range checks happen in [`Config::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let provider = Self::parse_provider_from_env(defaults.provider)?;
        let api_key = Self::resolve_api_key(provider);
        let base_url = Self::parse_optional_string_from_env(Self::ENV_BASE_URL);
        let model = Self::parse_optional_string_from_env(Self::ENV_MODEL);
        let max_retries = Self::parse_from_env(Self::ENV_MAX_RETRIES, defaults.max_retries)?;
        let timeout_ms = Self::parse_from_env(Self::ENV_TIMEOUT_MS, defaults.timeout_ms)?;
        let temperature = Self::parse_from_env(Self::ENV_TEMPERATURE, defaults.temperature)?;
        let max_tokens = Self::parse_from_env(Self::ENV_MAX_TOKENS, defaults.max_tokens)?;
        let criteria = Self::parse_criteria_from_env(defaults.criteria)?;
        let batch_size = Self::parse_from_env(Self::ENV_BATCH_SIZE, defaults.batch_size)?;
        let batch_delay_ms =
            Self::parse_from_env(Self::ENV_BATCH_DELAY_MS, defaults.batch_delay_ms)?;
        let error_reporting_enabled = Self::parse_bool_from_env(
            Self::ENV_ERROR_REPORTING,
            defaults.error_reporting_enabled,
        )?;
        let log_level = Self::parse_optional_string_from_env(Self::ENV_LOG_LEVEL)
            .unwrap_or(defaults.log_level);
        let metrics_path =
            Self::parse_optional_string_from_env(Self::ENV_METRICS_PATH).map(PathBuf::from);

        Ok(Self {
            port,
            bind_addr,
            provider,
            api_key,
            base_url,
            model,
            max_retries,
            timeout_ms,
            temperature,
            max_tokens,
            criteria,
            batch_size,
            batch_delay_ms,
            error_reporting_enabled,
            log_level,
            metrics_path,
        })
    }

    /// Checks numeric bounds and that a credential is present when the provider needs one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_limits()?;

        let has_key = self
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if self.provider.descriptor().requires_api_key && !has_key {
            return Err(ConfigError::MissingApiKey {
                provider: self.provider.as_str(),
            });
        }

        Ok(())
    }

    /// Numeric bounds only. Used when the provider is injected rather than built from config.
    pub fn validate_limits(&self) -> Result<(), ConfigError> {
        check_max_retries(self.max_retries)?;
        check_temperature(self.temperature)?;
        check_max_tokens(self.max_tokens)?;
        check_timeout_ms(self.timeout_ms)?;
        check_batch_size(self.batch_size)
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Model used when a call names none: the configured one with aliases resolved.
    pub fn default_model(&self) -> &str {
        self.provider
            .descriptor()
            .resolve_model(self.model.as_deref())
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_provider_from_env(default: ProviderKind) -> Result<ProviderKind, ConfigError> {
        match Self::parse_optional_string_from_env(Self::ENV_PROVIDER) {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::UnsupportedProvider { value }),
            None => Ok(default),
        }
    }

    /// `VERACITY_API_KEY` first, then the provider's own variable (e.g. `OPENAI_API_KEY`).
    fn resolve_api_key(provider: ProviderKind) -> Option<String> {
        Self::parse_optional_string_from_env(Self::ENV_API_KEY).or_else(|| {
            provider
                .api_key_env()
                .and_then(Self::parse_optional_string_from_env)
        })
    }

    fn parse_criteria_from_env(
        mut criteria: VerificationCriteria,
    ) -> Result<VerificationCriteria, ConfigError> {
        for category in Category::ALL {
            let var_name = criteria_env_var(category);
            if let Some(value) = Self::parse_optional_string_from_env(var_name) {
                let enabled = parse_bool(&value).ok_or(ConfigError::InvalidValue {
                    name: var_name,
                    value,
                })?;
                criteria.set(category, enabled);
            }
        }
        Ok(criteria)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
    {
        match Self::parse_optional_string_from_env(var_name) {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: var_name,
                value,
            }),
            None => Ok(default),
        }
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match Self::parse_optional_string_from_env(var_name) {
            Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidValue {
                name: var_name,
                value,
            }),
            None => Ok(default),
        }
    }
}

fn criteria_env_var(category: Category) -> &'static str {
    match category {
        Category::Toxicity => "VERACITY_CHECK_TOXICITY",
        Category::Factuality => "VERACITY_CHECK_FACTUALITY",
        Category::Coherence => "VERACITY_CHECK_COHERENCE",
        Category::Relevance => "VERACITY_CHECK_RELEVANCE",
        Category::Safety => "VERACITY_CHECK_SAFETY",
        Category::Moderation => "VERACITY_CHECK_MODERATION",
        Category::Bias => "VERACITY_CHECK_BIAS",
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn out_of_range(name: &'static str, value: impl Display, expected: &'static str) -> ConfigError {
    ConfigError::OutOfRange {
        name,
        value: value.to_string(),
        expected,
    }
}

pub(crate) fn check_max_retries(value: u32) -> Result<(), ConfigError> {
    if (MIN_MAX_RETRIES..=MAX_MAX_RETRIES).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range("max_retries", value, "1..=10"))
    }
}

pub(crate) fn check_temperature(value: f32) -> Result<(), ConfigError> {
    if (0.0..=MAX_TEMPERATURE).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range("temperature", value, "0.0..=2.0"))
    }
}

pub(crate) fn check_max_tokens(value: u32) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(out_of_range("max_tokens", value, "> 0"))
    }
}

pub(crate) fn check_timeout_ms(value: u64) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(out_of_range("timeout_ms", value, "> 0"))
    }
}

pub(crate) fn check_batch_size(value: usize) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(out_of_range("batch_size", value, "> 0"))
    }
}
