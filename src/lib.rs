//! Veracity library crate (used by the server and integration tests).
//!
//! Turns untrusted, free-form LLM output into a bounded, structured verdict: valid or invalid,
//! a confidence in `[0, 1]`, per-category scores, issues and suggestions.
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`Verifier`] - single and batch verification, stats, connection check
//! - [`VerificationOptions`], [`VerificationCriteria`] - per-call inputs
//! - [`VerificationResult`], [`BatchVerificationResult`] - outputs
//! - [`Config`], [`ConfigError`] - environment-backed configuration
//!
//! ## Building Blocks
//! - [`build_prompt`] - deterministic prompt rendering
//! - [`parse_response`], [`normalize_score`] - response parsing and score normalization
//! - [`is_retryable`], [`backoff_delay`] - retry classification
//! - [`LlmProvider`], [`ProviderKind`], [`ProviderDescriptor`] - provider adapters
//! - [`MetricsSink`], [`ErrorReporter`] - observability capabilities
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod gateway;
pub mod model;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod retry;
pub mod sink;
pub mod verifier;

pub use config::{Config, ConfigError};
pub use model::{
    BatchPosition, BatchVerificationResult, Category, CategoryResult, ConfidenceSource,
    ParseMethod, ResultMetadata, VerificationCriteria, VerificationMetrics, VerificationOptions,
    VerificationResult,
};
pub use parser::{normalize_score, parse_response};
pub use prompt::build_prompt;
pub use provider::{
    CallParams, LlmProvider, ProviderDescriptor, ProviderError, ProviderKind,
    RawProviderResponse, TokenUsage, build_provider,
};
#[cfg(any(test, feature = "mock"))]
pub use provider::{MockCall, MockProvider, MockReply};
pub use retry::{backoff_delay, is_retryable};
#[cfg(any(test, feature = "mock"))]
pub use sink::{FailingMetricsSink, RecordingErrorReporter, RecordingMetricsSink};
pub use sink::{
    ErrorReport, ErrorReporter, JsonlMetricsSink, MetricsRecord, MetricsSink, NoopErrorReporter,
    NoopMetricsSink, SinkError, TracingErrorReporter, TracingMetricsSink,
};
pub use verifier::{Verifier, VerifierError, VerifierStats};
