//! Verification orchestration.
//!
//! A single verification walks `Building → Calling → (Retrying)* → Parsing → Done`:
//!
//! - **Building** renders the prompt (pure, cannot fail).
//! - **Calling** makes one provider request under a timeout guard.
//! - **Retrying** sleeps `1s, 2s, 4s, ...` after a retryable failure, up to `max_retries` times.
//! - **Parsing** turns the reply into a verdict; it never fails and is never retried.
//! - **Done** is either a parsed result or an error-shaped result. Both are recorded to the
//!   metrics sink exactly once.
//!
//! Only invalid configuration escapes as [`VerifierError`]; every other failure is returned as
//! a fully populated [`VerificationResult`].

pub mod error;
pub mod stats;

#[cfg(test)]
mod tests;

pub use error::VerifierError;
pub use stats::VerifierStats;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use serde_json::json;
use tokio::time::Instant;
use tracing::{Instrument, debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::{
    Config, ConfigError, check_batch_size, check_max_retries, check_max_tokens,
    check_temperature, check_timeout_ms,
};
use crate::constants::{
    CHARS_PER_TOKEN, CONNECTION_TEST_TOKEN, DEFAULT_VERIFICATION_TYPE, METRICS_OPERATION,
};
use crate::model::{
    BatchPosition, BatchVerificationResult, ResultMetadata, VerificationCriteria,
    VerificationMetrics, VerificationOptions, VerificationResult,
};
use crate::parser::{not_checked_categories, parse_response};
use crate::prompt::{build_prompt, connection_test_prompt};
use crate::provider::{
    CallParams, LlmProvider, ProviderError, RawProviderResponse, TokenUsage, build_provider,
};
use crate::retry::{backoff_delay, is_retryable};
use crate::sink::{
    ErrorReport, ErrorReporter, MetricsRecord, MetricsSink, error_reporter_from_config,
    metrics_sink_from_config,
};

const CONNECTION_TEST_MAX_TOKENS: u32 = 10;

/// Everything one verification needs, resolved from options over config.
#[derive(Debug, Clone)]
struct CallPlan {
    params: CallParams,
    max_retries: u32,
    criteria: VerificationCriteria,
    context: Option<String>,
    verification_type: String,
    batch: Option<BatchPosition>,
}

/// Terminal state of the call loop.
struct CallOutcome {
    response: Result<RawProviderResponse, ProviderError>,
    attempts: u32,
}

/// Drives verifications against one provider.
///
/// Cheap to clone; all state is shared read-only behind `Arc`s.
#[derive(Clone)]
pub struct Verifier {
    config: Arc<Config>,
    provider: Arc<dyn LlmProvider>,
    metrics: Arc<dyn MetricsSink>,
    reporter: Arc<dyn ErrorReporter>,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("provider", &self.provider.descriptor().kind)
            .field("model", &self.config.default_model())
            .finish_non_exhaustive()
    }
}

impl Verifier {
    /// Builds the provider and sinks selected by `config`.
    ///
    /// Fails on out-of-range settings or a missing credential.
    pub fn new(config: Config) -> Result<Self, VerifierError> {
        config.validate()?;
        let provider = build_provider(&config)?;
        let metrics = metrics_sink_from_config(&config);
        let reporter = error_reporter_from_config(&config);
        Ok(Self {
            config: Arc::new(config),
            provider,
            metrics,
            reporter,
        })
    }

    /// Wires explicit components. The credential check is skipped; the provider is already built.
    pub fn with_components(
        config: Config,
        provider: Arc<dyn LlmProvider>,
        metrics: Arc<dyn MetricsSink>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self, VerifierError> {
        config.validate_limits()?;
        Ok(Self {
            config: Arc::new(config),
            provider,
            metrics,
            reporter,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Verifies one piece of content.
    ///
    /// Returns `Err` only for invalid option overrides. Provider failures, exhausted retries and
    /// unparseable replies all come back as `Ok` results.
    #[instrument(
        skip(self, content, options),
        fields(provider = %self.provider.descriptor().kind, content_len = content.len())
    )]
    pub async fn verify(
        &self,
        content: &str,
        options: &VerificationOptions,
    ) -> Result<VerificationResult, VerifierError> {
        let plan = self.plan(options)?;
        Ok(self.run(content, plan).await)
    }

    /// Verifies `contents` in chunks of `batch_size`, concurrently within a chunk.
    ///
    /// Chunks are separated by the configured pacing delay (none after the last). Results keep
    /// input order and every input gets a slot, even if its task fails.
    #[instrument(skip(self, contents, options), fields(total = contents.len()))]
    pub async fn verify_batch(
        &self,
        contents: &[String],
        options: &VerificationOptions,
    ) -> Result<BatchVerificationResult, VerifierError> {
        let batch_size = options.batch_size.unwrap_or(self.config.batch_size);
        check_batch_size(batch_size)?;
        let base_plan = self.plan(options)?;

        let total = contents.len();
        let pacing = Duration::from_millis(self.config.batch_delay_ms);
        let mut results = Vec::with_capacity(total);

        for (chunk, items) in contents.chunks(batch_size).enumerate() {
            if chunk > 0 && !pacing.is_zero() {
                debug!(chunk, delay_ms = self.config.batch_delay_ms, "Pacing between chunks");
                tokio::time::sleep(pacing).await;
            }

            let handles: Vec<_> = items
                .iter()
                .enumerate()
                .map(|(offset, content)| {
                    let position = BatchPosition {
                        index: chunk * batch_size + offset,
                        total,
                        chunk,
                    };
                    let verifier = self.clone();
                    let content = content.clone();
                    let options = options.at_position(position);
                    tokio::spawn(
                        async move { verifier.verify(&content, &options).await }
                            .in_current_span(),
                    )
                })
                .collect();

            for (offset, joined) in join_all(handles).await.into_iter().enumerate() {
                let index = chunk * batch_size + offset;
                let result = match joined {
                    Ok(Ok(result)) => result,
                    Ok(Err(err)) => {
                        self.failed_slot(
                            &contents[index],
                            &base_plan,
                            index,
                            chunk,
                            total,
                            err.to_string(),
                        )
                        .await
                    }
                    Err(join_err) => {
                        warn!(index, error = %join_err, "Batch item task failed");
                        self.failed_slot(
                            &contents[index],
                            &base_plan,
                            index,
                            chunk,
                            total,
                            format!("verification task failed: {}", join_err),
                        )
                        .await
                    }
                };
                results.push(result);
            }
        }

        let batch = BatchVerificationResult::from_results(results);
        info!(
            total = batch.total,
            valid = batch.valid,
            invalid = batch.invalid,
            total_tokens = batch.total_tokens,
            "Batch verification complete"
        );
        Ok(batch)
    }

    /// Snapshot of the effective configuration.
    pub fn stats(&self) -> VerifierStats {
        let descriptor = self.provider.descriptor();
        VerifierStats {
            provider: descriptor.kind,
            model: self.default_model().to_string(),
            fast_model: descriptor.fast_model.to_string(),
            accurate_model: descriptor.accurate_model.to_string(),
            base_url: self
                .config
                .base_url
                .clone()
                .unwrap_or_else(|| descriptor.base_url.to_string()),
            max_retries: self.config.max_retries,
            timeout_ms: self.config.timeout_ms,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            batch_size: self.config.batch_size,
            batch_delay_ms: self.config.batch_delay_ms,
            criteria: self.config.criteria.clone(),
            error_reporting_enabled: self.config.error_reporting_enabled,
            input_cost_per_1k: descriptor.input_cost_per_1k,
            output_cost_per_1k: descriptor.output_cost_per_1k,
        }
    }

    /// Sends a trivial prompt once and checks the reply for the expected token.
    #[instrument(skip(self), fields(provider = %self.provider.descriptor().kind))]
    pub async fn test_connection(&self) -> bool {
        let params = CallParams {
            model: self.default_model().to_string(),
            temperature: 0.0,
            max_tokens: CONNECTION_TEST_MAX_TOKENS,
            timeout: Duration::from_millis(self.config.timeout_ms),
        };
        let outcome = self.call_with_retries(&connection_test_prompt(), &params, 0).await;

        match outcome.response {
            Ok(response) => {
                let ok = replied_with_token(&response.text);
                info!(ok, "Connection test finished");
                ok
            }
            Err(err) => {
                warn!(error = %err, "Connection test failed");
                false
            }
        }
    }

    fn default_model(&self) -> &str {
        self.provider
            .descriptor()
            .resolve_model(self.config.model.as_deref())
    }

    fn plan(&self, options: &VerificationOptions) -> Result<CallPlan, ConfigError> {
        let temperature = options.temperature.unwrap_or(self.config.temperature);
        let max_tokens = options.max_tokens.unwrap_or(self.config.max_tokens);
        let timeout_ms = options.timeout_ms.unwrap_or(self.config.timeout_ms);
        let max_retries = options.max_retries.unwrap_or(self.config.max_retries);
        check_temperature(temperature)?;
        check_max_tokens(max_tokens)?;
        check_timeout_ms(timeout_ms)?;
        check_max_retries(max_retries)?;

        let model = match options.model.as_deref() {
            Some(requested) => self.provider.descriptor().resolve_model(Some(requested)),
            None => self.default_model(),
        };

        Ok(CallPlan {
            params: CallParams {
                model: model.to_string(),
                temperature,
                max_tokens,
                timeout: Duration::from_millis(timeout_ms),
            },
            max_retries,
            criteria: options
                .criteria
                .clone()
                .unwrap_or_else(|| self.config.criteria.clone())
                .normalized(),
            context: options.context.clone(),
            verification_type: options
                .verification_type
                .clone()
                .unwrap_or_else(|| DEFAULT_VERIFICATION_TYPE.to_string()),
            batch: options.batch,
        })
    }

    async fn run(&self, content: &str, plan: CallPlan) -> VerificationResult {
        let started = Instant::now();
        let verification_id = Uuid::new_v4();

        let prompt = build_prompt(content, &plan.criteria, plan.context.as_deref());
        let outcome = self
            .call_with_retries(&prompt, &plan.params, plan.max_retries)
            .await;

        let result = match outcome.response {
            Ok(response) => {
                let mut result = parse_response(&response.text, content, &plan.criteria);
                result.metrics = self.metrics_for(&prompt, &response, &plan, started);
                result
            }
            Err(err) => {
                let result =
                    self.error_result(content, &plan, &err, outcome.attempts, started.elapsed());
                self.report_failure(&plan, &err, &result);
                result
            }
        };

        let result = self.finish(result, &plan, verification_id, outcome.attempts);
        self.record(&result).await;
        result
    }

    /// Calling/Retrying loop. `max_retries` counts re-attempts after the first call.
    async fn call_with_retries(
        &self,
        prompt: &str,
        params: &CallParams,
        max_retries: u32,
    ) -> CallOutcome {
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            let response =
                match tokio::time::timeout(params.timeout, self.provider.invoke(prompt, params))
                    .await
                {
                    Ok(response) => response,
                    Err(_) => Err(ProviderError::timeout(format!(
                        "{} request timed out after {}ms",
                        self.provider.descriptor().kind,
                        params.timeout.as_millis()
                    ))),
                };

            let err = match response {
                Ok(response) => {
                    return CallOutcome {
                        response: Ok(response),
                        attempts,
                    };
                }
                Err(err) => err,
            };

            let retryable = is_retryable(&err);
            if !retryable || attempts > max_retries {
                warn!(
                    attempt = attempts,
                    retryable,
                    status = err.status,
                    code = err.code.as_deref().unwrap_or(""),
                    error = %err,
                    "Provider call failed"
                );
                return CallOutcome {
                    response: Err(err),
                    attempts,
                };
            }

            let delay = backoff_delay(attempts);
            warn!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                status = err.status,
                error = %err,
                "Retryable provider error, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn metrics_for(
        &self,
        prompt: &str,
        response: &RawProviderResponse,
        plan: &CallPlan,
        started: Instant,
    ) -> VerificationMetrics {
        let descriptor = self.provider.descriptor();
        let (usage, estimated_usage) = match response.usage {
            Some(usage) => (usage, false),
            None => (
                TokenUsage::new(estimate_tokens(prompt), estimate_tokens(&response.text)),
                true,
            ),
        };

        VerificationMetrics {
            latency_ms: elapsed_ms(started.elapsed()),
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            total_tokens: usage.total(),
            cost: descriptor.cost(&usage),
            model: plan.params.model.clone(),
            provider: descriptor.kind.to_string(),
            timestamp: Utc::now(),
            estimated_usage,
        }
    }

    /// DoneError: invalid, zero confidence, no token usage, every category not checked.
    fn error_result(
        &self,
        content: &str,
        plan: &CallPlan,
        err: &ProviderError,
        attempts: u32,
        elapsed: Duration,
    ) -> VerificationResult {
        let provider = self.provider.descriptor().kind.as_str();
        let retryable = is_retryable(err);

        let mut metrics = VerificationMetrics::zeroed(provider, &plan.params.model);
        metrics.latency_ms = elapsed_ms(elapsed);

        let suggestion = if retryable {
            "Retry the verification later"
        } else {
            "Check the provider configuration and request parameters"
        };

        VerificationResult {
            is_valid: false,
            confidence: 0.0,
            reason: format!("Verification failed: {}", err.message),
            issues: vec![format!("Provider error after {} attempt(s): {}", attempts, err.message)],
            suggestions: vec![suggestion.to_string()],
            categories: not_checked_categories(),
            metrics,
            provider: String::new(),
            model: String::new(),
            error: Some(err.message.clone()),
            metadata: ResultMetadata {
                input_chars: content.chars().count(),
                error_kind: Some(err.kind().to_string()),
                error_code: err.code.clone(),
                error_status: err.status,
                retryable: Some(retryable),
                ..Default::default()
            },
        }
    }

    /// Stamps identity fields shared by both terminal states.
    fn finish(
        &self,
        mut result: VerificationResult,
        plan: &CallPlan,
        verification_id: Uuid,
        attempts: u32,
    ) -> VerificationResult {
        result.provider = self.provider.descriptor().kind.to_string();
        result.model = plan.params.model.clone();
        result.metadata.verification_id = verification_id;
        result.metadata.verification_type = plan.verification_type.clone();
        result.metadata.attempts = attempts;
        result.metadata.batch = plan.batch;
        result
    }

    /// Error slot for a batch item whose task never produced a result.
    async fn failed_slot(
        &self,
        content: &str,
        base_plan: &CallPlan,
        index: usize,
        chunk: usize,
        total: usize,
        message: String,
    ) -> VerificationResult {
        let mut plan = base_plan.clone();
        plan.batch = Some(BatchPosition {
            index,
            total,
            chunk,
        });

        let err = ProviderError::new(message);
        let result = self.error_result(content, &plan, &err, 0, Duration::ZERO);
        self.report_failure(&plan, &err, &result);
        let result = self.finish(result, &plan, Uuid::new_v4(), 0);
        self.record(&result).await;
        result
    }

    fn report_failure(&self, plan: &CallPlan, err: &ProviderError, result: &VerificationResult) {
        if !self.config.error_reporting_enabled {
            return;
        }

        let report = ErrorReport::new(format!("LLM verification failed: {}", err.message))
            .with_tag("provider", self.provider.descriptor().kind.as_str())
            .with_tag("model", plan.params.model.clone())
            .with_tag("verification_type", plan.verification_type.clone())
            .with_tag("error_kind", err.kind())
            .with_tag(
                "retryable",
                result.metadata.retryable.unwrap_or(false).to_string(),
            )
            .with_extras(json!({
                "status": err.status,
                "code": err.code,
                "inputChars": result.metadata.input_chars,
                "latencyMs": result.metrics.latency_ms,
                "batch": plan.batch,
            }));
        self.reporter.capture(report);
    }

    /// Writes the outcome to the metrics sink. Sink failures are logged and dropped.
    async fn record(&self, result: &VerificationResult) {
        let record = MetricsRecord {
            operation: METRICS_OPERATION.to_string(),
            execution_time_ms: result.metrics.latency_ms,
            tokens_used: result.metrics.total_tokens,
            cost: result.metrics.cost,
            success: !result.is_error(),
            error_message: result.error.clone(),
            metadata: json!({
                "verificationId": result.metadata.verification_id,
                "verificationType": result.metadata.verification_type,
                "provider": result.provider,
                "model": result.model,
                "isValid": result.is_valid,
                "confidence": result.confidence,
                "parseMethod": result.metadata.parse_method,
                "attempts": result.metadata.attempts,
                "estimatedUsage": result.metrics.estimated_usage,
                "categories": category_flags(result),
            }),
            timestamp: Utc::now(),
        };

        if let Err(e) = self.metrics.record(record).await {
            warn!(error = %e, "Failed to record verification metrics");
        }

        debug!(
            latency_ms = result.metrics.latency_ms,
            tokens = result.metrics.total_tokens,
            parse_method = ?result.metadata.parse_method,
            is_valid = result.is_valid,
            "Verification finished"
        );
    }
}

fn category_flags(result: &VerificationResult) -> BTreeMap<&str, bool> {
    result
        .categories
        .iter()
        .map(|(name, category)| (name.as_str(), category.passed))
        .collect()
}

/// True when the reply contains the connection-test token as a whole word.
fn replied_with_token(text: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|word| word.eq_ignore_ascii_case(CONNECTION_TEST_TOKEN))
}

fn estimate_tokens(text: &str) -> u64 {
    text.chars().count().div_ceil(CHARS_PER_TOKEN) as u64
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
