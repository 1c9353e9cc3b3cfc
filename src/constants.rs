//! Cross-cutting, shared constants.
//!
//! Defaults here seed [`Config`](crate::config::Config); per-call overrides travel through
//! [`VerificationOptions`](crate::model::VerificationOptions) rather than by mutating shared state.

use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const MIN_MAX_RETRIES: u32 = 1;
pub const MAX_MAX_RETRIES: u32 = 10;

/// First backoff delay; doubles on every subsequent retry.
pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const MAX_TEMPERATURE: f32 = 2.0;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

pub const DEFAULT_BATCH_SIZE: usize = 3;
pub const DEFAULT_BATCH_DELAY_MS: u64 = 1000;

/// Confidence used when a structured response omits or garbles `confidence`.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

pub const INCONCLUSIVE_REASON: &str = "Unable to determine verification result";
pub const FALLBACK_REASON: &str = "Automated analysis completed";
pub const NO_ISSUES_PLACEHOLDER: &str = "No specific issues identified";
pub const NO_SUGGESTIONS_PLACEHOLDER: &str = "No specific suggestions provided";
pub const CATEGORY_NOT_CHECKED: &str = "Category not checked";
pub const NO_EXPLANATION: &str = "No explanation provided";

/// Rough characters-per-token ratio used when a provider omits usage.
pub const CHARS_PER_TOKEN: usize = 4;

/// Operation name attached to every metrics record.
pub const METRICS_OPERATION: &str = "llm_verification";

pub const DEFAULT_VERIFICATION_TYPE: &str = "content";

/// Token the connection smoke test expects back.
pub const CONNECTION_TEST_TOKEN: &str = "OK";

/// Response header carrying a short machine-readable gateway status.
pub const VERACITY_STATUS_HEADER: &str = "x-veracity-status";
