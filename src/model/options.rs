use serde::{Deserialize, Serialize};

use super::criteria::VerificationCriteria;

/// Where an item sits inside a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPosition {
    /// Zero-based index into the batch input.
    pub index: usize,
    /// Total number of inputs in the batch.
    pub total: usize,
    /// Zero-based chunk number this item ran in.
    pub chunk: usize,
}

/// Per-call overrides. Unset fields fall back to the verifier's [`Config`](crate::Config).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerificationOptions {
    /// Model name, or one of the aliases `default`, `fast`, `accurate`.
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Free-text context included verbatim in the prompt.
    pub context: Option<String>,
    /// Tag carried into metadata and metrics (e.g. `listing`, `review`).
    pub verification_type: Option<String>,
    pub criteria: Option<VerificationCriteria>,
    /// Set by the batch coordinator; ignored on input.
    #[serde(skip_deserializing)]
    pub batch: Option<BatchPosition>,
    pub batch_size: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
}

impl VerificationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_verification_type(mut self, verification_type: impl Into<String>) -> Self {
        self.verification_type = Some(verification_type.into());
        self
    }

    pub fn with_criteria(mut self, criteria: VerificationCriteria) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub(crate) fn at_position(&self, position: BatchPosition) -> Self {
        let mut options = self.clone();
        options.batch = Some(position);
        options
    }
}
