use serde::Serialize;

use crate::model::VerificationCriteria;
use crate::provider::ProviderKind;

/// Read-only snapshot of the verifier's effective configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierStats {
    pub provider: ProviderKind,
    pub model: String,
    pub fast_model: String,
    pub accurate_model: String,
    pub base_url: String,
    pub max_retries: u32,
    pub timeout_ms: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub criteria: VerificationCriteria,
    pub error_reporting_enabled: bool,
    pub input_cost_per_1k: f64,
    pub output_cost_per_1k: f64,
}
