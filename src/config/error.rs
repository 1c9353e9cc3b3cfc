//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
///
/// Also produced for invalid per-call option overrides, which are held to the same bounds.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is outside valid range (1-65535).
    #[error("invalid port '{value}': must be between 1 and 65535")]
    InvalidPort { value: String },

    /// Port string could not be parsed as a number.
    #[error("failed to parse port '{value}': {source}")]
    PortParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Bind address string could not be parsed.
    #[error("failed to parse bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// Provider name is not one of the supported providers.
    #[error(
        "unsupported provider '{value}': expected one of openai, gemini, anthropic, huggingface, ollama"
    )]
    UnsupportedProvider { value: String },

    /// The selected provider needs a credential and none was found.
    #[error("missing API key for provider '{provider}'")]
    MissingApiKey { provider: &'static str },

    /// A value could not be parsed into the expected type.
    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },

    /// A value parsed but lies outside its allowed range.
    #[error("{name} = {value} is out of range: expected {expected}")]
    OutOfRange {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}
