use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::options::BatchPosition;
use crate::constants::CATEGORY_NOT_CHECKED;

/// Outcome for one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub passed: bool,
    /// Always within `[0, 1]`.
    pub score: f64,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl CategoryResult {
    /// Placeholder for a category the model did not (or was not asked to) evaluate.
    pub fn not_checked() -> Self {
        Self {
            passed: false,
            score: 0.0,
            explanation: CATEGORY_NOT_CHECKED.to_string(),
            details: None,
        }
    }

    pub fn is_not_checked(&self) -> bool {
        !self.passed && self.score == 0.0 && self.explanation == CATEGORY_NOT_CHECKED
    }
}

/// Cost and latency accounting for one verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMetrics {
    pub latency_ms: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    /// USD, from the provider's per-1000-token price table.
    pub cost: f64,
    pub model: String,
    pub provider: String,
    pub timestamp: DateTime<Utc>,
    /// `true` when token counts were estimated from text length.
    pub estimated_usage: bool,
}

impl VerificationMetrics {
    /// Zeroed metrics for paths where no provider call succeeded.
    pub fn zeroed(provider: &str, model: &str) -> Self {
        Self {
            latency_ms: 0,
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            cost: 0.0,
            model: model.to_string(),
            provider: provider.to_string(),
            timestamp: Utc::now(),
            estimated_usage: false,
        }
    }
}

impl Default for VerificationMetrics {
    fn default() -> Self {
        Self::zeroed("", "")
    }
}

/// Which extraction step produced the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMethod {
    /// The whole response was a JSON object.
    Json,
    /// A `{...}` span inside the response parsed as-is.
    ExtractedJson,
    /// The `{...}` span parsed after textual repairs.
    RepairedJson,
    /// Heuristic keyword parse; categories are empty on this path.
    FreeText,
}

/// Where the confidence value came from.
///
/// A `Defaulted` structured response and a tied free-text heuristic can both land near the
/// middle of the range; this tag keeps them distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    /// The model reported a usable value.
    Reported,
    /// Structured response without a usable value; the default was applied.
    Defaulted,
    /// Estimated from free text.
    Inferred,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub verification_id: Uuid,
    pub verification_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_method: Option<ParseMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_source: Option<ConfidenceSource>,
    /// Provider calls made, including the successful one.
    pub attempts: u32,
    pub input_chars: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl Default for ResultMetadata {
    fn default() -> Self {
        Self {
            verification_id: Uuid::new_v4(),
            verification_type: crate::constants::DEFAULT_VERIFICATION_TYPE.to_string(),
            parse_method: None,
            confidence_source: None,
            attempts: 0,
            input_chars: 0,
            batch: None,
            error_kind: None,
            error_code: None,
            error_status: None,
            retryable: None,
        }
    }
}

/// The sole output of a verification.
///
/// Every field is populated on every path, including provider failures.
///
/// # Categories and parse paths
///
/// When the model answered with JSON (`parse_method` is `json`, `extracted_json` or
/// `repaired_json`) `categories` holds all seven canonical keys, with `"Category not checked"`
/// entries for anything the model left out. When the response could only be read as free text
/// (`parse_method == free_text`) `categories` is **empty**: that means "no category information
/// available", not "every category failed". Terminal provider failures carry seven
/// not-checked entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub is_valid: bool,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub reason: String,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub categories: BTreeMap<String, CategoryResult>,
    pub metrics: VerificationMetrics,
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: ResultMetadata,
}

impl VerificationResult {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn category(&self, name: &str) -> Option<&CategoryResult> {
        self.categories.get(name)
    }

    pub fn parse_method(&self) -> Option<ParseMethod> {
        self.metadata.parse_method
    }
}
