use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::criteria::Category;
use super::result::{ParseMethod, VerificationResult};

/// Aggregate over a completed batch. Results keep input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchVerificationResult {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub average_confidence: f64,
    pub total_cost: f64,
    pub total_tokens: u64,
    pub results: Vec<VerificationResult>,
    pub summary: BTreeMap<String, usize>,
}

impl BatchVerificationResult {
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let total = results.len();
        let valid = results.iter().filter(|r| r.is_valid).count();

        let average_confidence = if total == 0 {
            0.0
        } else {
            results.iter().map(|r| r.confidence).sum::<f64>() / total as f64
        };
        let total_cost = results.iter().map(|r| r.metrics.cost).sum();
        let total_tokens = results.iter().map(|r| r.metrics.total_tokens).sum();

        let mut summary = BTreeMap::new();
        summary.insert("valid".to_string(), valid);
        summary.insert("invalid".to_string(), total - valid);
        summary.insert(
            "errors".to_string(),
            results.iter().filter(|r| r.is_error()).count(),
        );
        summary.insert(
            "fallback_parsed".to_string(),
            results
                .iter()
                .filter(|r| r.parse_method() == Some(ParseMethod::FreeText))
                .count(),
        );
        for category in Category::ALL {
            let passed = results
                .iter()
                .filter(|r| r.category(category.as_str()).is_some_and(|c| c.passed))
                .count();
            summary.insert(format!("{}_passed", category.as_str()), passed);
        }

        Self {
            total,
            valid,
            invalid: total - valid,
            average_confidence,
            total_cost,
            total_tokens,
            results,
            summary,
        }
    }
}
