//! Response parsing: model text in, bounded verdict out.
//!
//! Extraction is attempted in order, first success wins:
//!
//! 1. the whole text as a JSON object,
//! 2. the greedy `{...}` span,
//! 3. that span after textual repairs (unquoted keys, trailing commas, quote variants),
//! 4. heuristic free-text parsing.
//!
//! Parsing never fails. A response that ignores the schema is evidence about the content, not a
//! pipeline error, so it degrades to a low-information verdict instead of an `Err`.

pub mod categories;
pub mod fallback;
pub mod json;
pub mod normalize;


use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::{
    DEFAULT_CONFIDENCE, INCONCLUSIVE_REASON, NO_ISSUES_PLACEHOLDER, NO_SUGGESTIONS_PLACEHOLDER,
};
use crate::model::{
    ConfidenceSource, ParseMethod, ResultMetadata, VerificationCriteria, VerificationMetrics,
    VerificationResult,
};

pub use categories::{not_checked_categories, validate_categories};
pub use fallback::{FreeTextVerdict, parse_free_text};
pub use json::extract_object;
pub use normalize::{coerce_bool, confidence_from_label, normalize_score, normalize_value};

/// Parses raw model output into a [`VerificationResult`].
///
/// Fills verdict fields and parse metadata only; metrics, provider and model are left zeroed
/// for the caller to populate.
pub fn parse_response(
    raw: &str,
    original_input: &str,
    criteria: &VerificationCriteria,
) -> VerificationResult {
    let metadata = ResultMetadata {
        input_chars: original_input.chars().count(),
        ..Default::default()
    };

    match extract_object(raw) {
        Some((object, method)) => {
            debug!(parse_method = ?method, "Parsed structured verification response");
            from_object(&object, method, criteria, metadata)
        }
        None => {
            debug!(
                response_len = raw.len(),
                "No JSON object found in response, using free-text fallback"
            );
            from_free_text(parse_free_text(raw), metadata)
        }
    }
}

fn from_object(
    object: &Map<String, Value>,
    method: ParseMethod,
    criteria: &VerificationCriteria,
    mut metadata: ResultMetadata,
) -> VerificationResult {
    let is_valid = coerce_bool(field(object, "isValid", "is_valid"));

    let (confidence, confidence_source) = match field(object, "confidence", "confidence_score")
        .and_then(normalize_value)
    {
        Some(value) => (value, ConfidenceSource::Reported),
        None => (DEFAULT_CONFIDENCE, ConfidenceSource::Defaulted),
    };

    let reason = object
        .get("reason")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(INCONCLUSIVE_REASON)
        .to_string();

    let issues = string_list(object.get("issues"), NO_ISSUES_PLACEHOLDER);
    let suggestions = string_list(object.get("suggestions"), NO_SUGGESTIONS_PLACEHOLDER);
    let categories = validate_categories(object.get("categories"), criteria);

    metadata.parse_method = Some(method);
    metadata.confidence_source = Some(confidence_source);

    VerificationResult {
        is_valid,
        confidence,
        reason,
        issues,
        suggestions,
        categories,
        metrics: VerificationMetrics::default(),
        provider: String::new(),
        model: String::new(),
        error: None,
        metadata,
    }
}

fn from_free_text(verdict: FreeTextVerdict, mut metadata: ResultMetadata) -> VerificationResult {
    metadata.parse_method = Some(ParseMethod::FreeText);
    metadata.confidence_source = Some(verdict.confidence_source);

    VerificationResult {
        is_valid: verdict.is_valid,
        confidence: verdict.confidence,
        reason: verdict.reason,
        issues: verdict.issues,
        suggestions: verdict.suggestions,
        categories: BTreeMap::new(),
        metrics: VerificationMetrics::default(),
        provider: String::new(),
        model: String::new(),
        error: None,
        metadata,
    }
}

fn field<'a>(object: &'a Map<String, Value>, name: &str, alias: &str) -> Option<&'a Value> {
    object.get(name).or_else(|| object.get(alias))
}

fn string_list(value: Option<&Value>, placeholder: &str) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(categories::value_to_text).collect(),
        _ => vec![placeholder.to_string()],
    }
}
