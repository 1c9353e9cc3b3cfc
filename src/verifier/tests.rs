use super::*;
use crate::model::{Category, ParseMethod};
use crate::provider::descriptor::OPENAI;
use crate::provider::mock::{DEFAULT_MOCK_USAGE, MockProvider, MockReply};
use crate::sink::{FailingMetricsSink, RecordingErrorReporter, RecordingMetricsSink};

struct Harness {
    verifier: Verifier,
    provider: Arc<MockProvider>,
    metrics: Arc<RecordingMetricsSink>,
    reporter: Arc<RecordingErrorReporter>,
}

fn test_config() -> Config {
    Config {
        api_key: Some("test-key".to_string()),
        ..Default::default()
    }
}

fn harness_with(config: Config, provider: MockProvider) -> Harness {
    let provider = Arc::new(provider);
    let metrics = Arc::new(RecordingMetricsSink::new());
    let reporter = Arc::new(RecordingErrorReporter::new());
    let verifier = Verifier::with_components(
        config,
        provider.clone(),
        metrics.clone(),
        reporter.clone(),
    )
    .expect("valid config");
    Harness {
        verifier,
        provider,
        metrics,
        reporter,
    }
}

fn harness(provider: MockProvider) -> Harness {
    harness_with(test_config(), provider)
}

fn verdict(reason: &str) -> String {
    format!(
        r#"{{"isValid": true, "confidence": 0.8, "reason": "{}", "issues": [], "suggestions": []}}"#,
        reason
    )
}

#[tokio::test]
async fn test_verify_success_populates_metrics() {
    let h = harness(MockProvider::new());

    let result = h
        .verifier
        .verify("A tidy listing for garden maintenance.", &VerificationOptions::new())
        .await
        .unwrap();

    assert!(result.is_valid);
    assert_eq!(result.confidence, 0.9);
    assert!(result.error.is_none());
    assert_eq!(result.provider, "openai");
    assert_eq!(result.model, "gpt-4o-mini");
    assert_eq!(result.parse_method(), Some(ParseMethod::Json));
    for category in Category::ALL {
        assert!(result.category(category.as_str()).is_some());
    }
    assert!(result.category("moderation").unwrap().is_not_checked());

    assert_eq!(result.metrics.input_tokens, DEFAULT_MOCK_USAGE.input_tokens);
    assert_eq!(result.metrics.output_tokens, DEFAULT_MOCK_USAGE.output_tokens);
    assert_eq!(result.metrics.total_tokens, DEFAULT_MOCK_USAGE.total());
    assert!((result.metrics.cost - OPENAI.cost(&DEFAULT_MOCK_USAGE)).abs() < 1e-12);
    assert!(!result.metrics.estimated_usage);
    assert_eq!(result.metadata.attempts, 1);
    assert_eq!(result.metadata.verification_type, "content");

    let records = h.metrics.records();
    assert_eq!(records.len(), 1);
    assert!(records[0].success);
    assert_eq!(records[0].operation, "llm_verification");
    assert_eq!(records[0].tokens_used, 160);
    assert!(h.reporter.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_retry_twice_then_succeed() {
    let h = harness(MockProvider::scripted([
        MockReply::status(429, "Too Many Requests"),
        MockReply::status(429, "Too Many Requests"),
    ]));

    let result = h
        .verifier
        .verify("content", &VerificationOptions::new())
        .await
        .unwrap();

    assert!(result.is_valid);
    assert!(result.error.is_none());
    assert_eq!(result.metadata.attempts, 3);

    let calls = h.provider.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].at - calls[0].at, Duration::from_secs(1));
    assert_eq!(calls[2].at - calls[1].at, Duration::from_secs(2));

    assert_eq!(h.metrics.len(), 1);
    assert!(h.reporter.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_yield_error_result() {
    let h = harness(MockProvider::scripted(
        (0..10).map(|_| MockReply::status(500, "Internal Server Error")),
    ));

    let result = h
        .verifier
        .verify("content", &VerificationOptions::new().with_max_retries(3))
        .await
        .unwrap();

    assert_eq!(h.provider.call_count(), 4);
    assert!(!result.is_valid);
    assert_eq!(result.confidence, 0.0);
    assert!(result.error.is_some());
    assert!(result.reason.contains("Internal Server Error"));
    assert_eq!(result.metadata.attempts, 4);
    assert_eq!(result.metadata.error_status, Some(500));
    assert_eq!(result.metadata.error_kind.as_deref(), Some("http"));
    assert_eq!(result.metadata.retryable, Some(true));
    assert_eq!(result.categories.len(), 7);
    assert!(result.categories.values().all(|c| c.is_not_checked()));
    assert_eq!(result.metrics.total_tokens, 0);
    assert_eq!(result.metrics.cost, 0.0);
    assert_eq!(result.metrics.latency_ms, 7000);
    assert_eq!(result.provider, "openai");

    let records = h.metrics.records();
    assert_eq!(records.len(), 1);
    assert!(!records[0].success);
    assert!(records[0].error_message.is_some());

    let reports = h.reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].tags["provider"], "openai");
    assert_eq!(reports[0].tags["retryable"], "true");
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_error_stops_immediately() {
    let h = harness(MockProvider::scripted([MockReply::status(
        401,
        "Incorrect API key provided",
    )]));

    let started = Instant::now();
    let result = h
        .verifier
        .verify("content", &VerificationOptions::new())
        .await
        .unwrap();

    assert_eq!(h.provider.call_count(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(!result.is_valid);
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.metadata.retryable, Some(false));
    assert_eq!(result.metadata.error_status, Some(401));
}

#[tokio::test(start_paused = true)]
async fn test_transport_errors_are_retried() {
    let h = harness(MockProvider::scripted([MockReply::transport(
        "ECONNRESET",
        "connection reset by peer",
    )]));

    let result = h
        .verifier
        .verify("content", &VerificationOptions::new())
        .await
        .unwrap();

    assert!(result.is_valid);
    assert_eq!(h.provider.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_retryable() {
    let h = harness(MockProvider::scripted([MockReply::Hang, MockReply::Hang]));

    let result = h
        .verifier
        .verify(
            "content",
            &VerificationOptions::new()
                .with_timeout_ms(500)
                .with_max_retries(1),
        )
        .await
        .unwrap();

    assert_eq!(h.provider.call_count(), 2);
    assert!(result.is_error());
    assert_eq!(result.metadata.error_code.as_deref(), Some("ETIMEDOUT"));
    assert_eq!(result.metadata.retryable, Some(true));
    // 500ms timeout, 1s backoff, 500ms timeout
    assert_eq!(result.metrics.latency_ms, 2000);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_then_success() {
    let h = harness(MockProvider::scripted([MockReply::Hang]));

    let result = h
        .verifier
        .verify("content", &VerificationOptions::new().with_timeout_ms(250))
        .await
        .unwrap();

    assert!(result.is_valid);
    assert_eq!(result.metadata.attempts, 2);
}

#[tokio::test]
async fn test_invalid_options_are_configuration_errors() {
    let h = harness(MockProvider::new());

    let cases = [
        VerificationOptions::new().with_temperature(2.5),
        VerificationOptions::new().with_max_tokens(0),
        VerificationOptions::new().with_timeout_ms(0),
        VerificationOptions::new().with_max_retries(0),
        VerificationOptions::new().with_max_retries(11),
    ];

    for options in cases {
        let err = h.verifier.verify("content", &options).await.unwrap_err();
        assert!(matches!(
            err,
            VerifierError::Configuration(ConfigError::OutOfRange { .. })
        ));
    }

    assert_eq!(h.provider.call_count(), 0);
    assert!(h.metrics.is_empty());
}

#[tokio::test]
async fn test_failing_metrics_sink_is_swallowed() {
    let provider = Arc::new(MockProvider::new());
    let sink = Arc::new(FailingMetricsSink::new());
    let verifier = Verifier::with_components(
        test_config(),
        provider,
        sink.clone(),
        Arc::new(RecordingErrorReporter::new()),
    )
    .unwrap();

    let result = verifier
        .verify("content", &VerificationOptions::new())
        .await
        .unwrap();

    assert!(result.is_valid);
    assert_eq!(sink.attempts(), 1);
}

#[tokio::test]
async fn test_error_reporting_can_be_disabled() {
    let config = Config {
        error_reporting_enabled: false,
        ..test_config()
    };
    let h = harness_with(
        config,
        MockProvider::scripted([MockReply::status(403, "forbidden")]),
    );

    let result = h
        .verifier
        .verify("content", &VerificationOptions::new())
        .await
        .unwrap();

    assert!(result.is_error());
    assert!(h.reporter.is_empty());
    assert_eq!(h.metrics.len(), 1);
}

#[tokio::test]
async fn test_usage_is_estimated_when_missing() {
    let reply = verdict("fine");
    let h = harness(MockProvider::scripted([MockReply::text(reply.clone())]));

    let result = h
        .verifier
        .verify("content", &VerificationOptions::new())
        .await
        .unwrap();

    let prompt = &h.provider.calls()[0].prompt;
    assert!(result.metrics.estimated_usage);
    assert_eq!(
        result.metrics.input_tokens,
        prompt.chars().count().div_ceil(4) as u64
    );
    assert_eq!(
        result.metrics.output_tokens,
        reply.chars().count().div_ceil(4) as u64
    );
    assert!(result.metrics.cost > 0.0);
}

#[tokio::test]
async fn test_free_text_reply_is_not_an_error() {
    let h = harness(MockProvider::scripted([MockReply::text(
        "isValid: true, confidence is about 0.9, reason: looks fine",
    )]));

    let result = h
        .verifier
        .verify("content", &VerificationOptions::new())
        .await
        .unwrap();

    assert!(result.is_valid);
    assert!((result.confidence - 0.9).abs() < 1e-9);
    assert!(result.categories.is_empty());
    assert_eq!(result.parse_method(), Some(ParseMethod::FreeText));
    assert!(!result.is_error());
    assert_eq!(h.provider.call_count(), 1);
    assert!(h.metrics.records()[0].success);
}

#[tokio::test]
async fn test_options_override_model_and_criteria() {
    let h = harness(MockProvider::new());
    let options = VerificationOptions::new()
        .with_model("accurate")
        .with_verification_type("listing")
        .with_context("Marketplace listing title")
        .with_criteria(VerificationCriteria::only(&[Category::Toxicity]));

    let result = h.verifier.verify("content", &options).await.unwrap();

    let call = &h.provider.calls()[0];
    assert_eq!(call.model, "gpt-4o");
    assert!(call.prompt.contains("Marketplace listing title"));
    assert_eq!(result.model, "gpt-4o");
    assert_eq!(result.metadata.verification_type, "listing");
    assert_eq!(result.categories.len(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_batch_preserves_order_and_paces_chunks() {
    let provider = MockProvider::new();
    for name in ["item-alpha", "item-bravo", "item-charlie", "item-delta"] {
        provider.on_prompt_containing(name, MockReply::text(verdict(name)));
    }
    provider.delay_prompt_containing("item-alpha", Duration::from_millis(300));
    provider.delay_prompt_containing("item-charlie", Duration::from_millis(200));
    let h = harness(provider);

    let contents: Vec<String> = ["item-alpha", "item-bravo", "item-charlie", "item-delta"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let started = Instant::now();
    let batch = h
        .verifier
        .verify_batch(&contents, &VerificationOptions::new().with_batch_size(2))
        .await
        .unwrap();

    assert_eq!(batch.total, 4);
    assert_eq!(batch.valid, 4);
    for (result, name) in batch.results.iter().zip(&contents) {
        assert_eq!(&result.reason, name);
    }
    assert_eq!(
        batch.results[2].metadata.batch,
        Some(BatchPosition {
            index: 2,
            total: 4,
            chunk: 1
        })
    );

    let calls = h.provider.calls();
    assert_eq!(calls.len(), 4);
    let offset = |needle: &str| {
        calls
            .iter()
            .find(|c| c.prompt.contains(needle))
            .map(|c| c.at - started)
            .unwrap()
    };
    assert_eq!(offset("item-alpha"), Duration::ZERO);
    assert_eq!(offset("item-bravo"), Duration::ZERO);
    // slowest of the first chunk (300ms) plus 1s pacing
    assert_eq!(offset("item-charlie"), Duration::from_millis(1300));
    assert_eq!(offset("item-delta"), Duration::from_millis(1300));
    // no pacing after the last chunk
    assert_eq!(started.elapsed(), Duration::from_millis(1500));

    assert_eq!(h.metrics.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_batch_isolates_item_failures() {
    let provider = MockProvider::new();
    provider.on_prompt_containing("item-bad", MockReply::status(401, "unauthorized"));
    let h = harness(provider);

    let contents = vec![
        "item-one".to_string(),
        "item-bad".to_string(),
        "item-three".to_string(),
    ];
    let batch = h
        .verifier
        .verify_batch(&contents, &VerificationOptions::new())
        .await
        .unwrap();

    assert_eq!(batch.results.len(), 3);
    assert!(batch.results[0].is_valid);
    assert!(batch.results[1].is_error());
    assert!(batch.results[2].is_valid);
    assert_eq!(batch.valid, 2);
    assert_eq!(batch.invalid, 1);
    assert_eq!(batch.summary["errors"], 1);
    assert_eq!(h.reporter.len(), 1);
}

#[tokio::test]
async fn test_batch_empty_input() {
    let h = harness(MockProvider::new());
    let batch = h
        .verifier
        .verify_batch(&[], &VerificationOptions::new())
        .await
        .unwrap();

    assert_eq!(batch.total, 0);
    assert_eq!(batch.average_confidence, 0.0);
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn test_batch_rejects_zero_batch_size() {
    let h = harness(MockProvider::new());
    let err = h
        .verifier
        .verify_batch(
            &["x".to_string()],
            &VerificationOptions::new().with_batch_size(0),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, VerifierError::Configuration(_)));
    assert_eq!(h.provider.call_count(), 0);
}

#[test]
fn test_stats_reflect_config() {
    let config = Config {
        model: Some("fast".to_string()),
        max_retries: 5,
        ..test_config()
    };
    let h = harness_with(config, MockProvider::new());

    let stats = h.verifier.stats();
    assert_eq!(stats.provider, crate::provider::ProviderKind::OpenAi);
    assert_eq!(stats.model, "gpt-4o-mini");
    assert_eq!(stats.accurate_model, "gpt-4o");
    assert_eq!(stats.base_url, "https://api.openai.com");
    assert_eq!(stats.max_retries, 5);
    assert_eq!(stats.batch_size, 3);
}

#[tokio::test]
async fn test_connection_check() {
    let h = harness(MockProvider::scripted([
        MockReply::text("OK"),
        MockReply::text("nope"),
        MockReply::status(500, "down"),
    ]));

    assert!(h.verifier.test_connection().await);
    assert!(!h.verifier.test_connection().await);
    assert!(!h.verifier.test_connection().await);
    assert_eq!(h.provider.call_count(), 3);
    assert!(h.metrics.is_empty());
}

#[tokio::test]
async fn test_connection_check_matches_whole_word() {
    let h = harness(MockProvider::scripted([
        MockReply::text("BROKEN"),
        MockReply::text("token limit reached"),
        MockReply::text("  ok.\n"),
        MockReply::text("Status: OK"),
    ]));

    assert!(!h.verifier.test_connection().await);
    assert!(!h.verifier.test_connection().await);
    assert!(h.verifier.test_connection().await);
    assert!(h.verifier.test_connection().await);
    assert_eq!(h.provider.call_count(), 4);
}

#[test]
fn test_new_requires_api_key() {
    let err = Verifier::new(Config::default()).unwrap_err();
    assert!(matches!(
        err,
        VerifierError::Configuration(ConfigError::MissingApiKey { .. })
    ));

    let verifier = Verifier::new(test_config()).expect("builds with a key");
    assert_eq!(verifier.stats().model, "gpt-4o-mini");
}

#[tokio::test]
async fn test_custom_criteria_from_options_are_normalized() {
    let h = harness(MockProvider::new());
    let mut criteria = VerificationCriteria::default();
    criteria.custom.insert("Toxicity".to_string());
    criteria.custom.insert("bad\"name".to_string());

    let result = h
        .verifier
        .verify("content", &VerificationOptions::new().with_criteria(criteria))
        .await
        .unwrap();

    assert_eq!(result.categories.len(), 7);
    let prompt = &h.provider.calls()[0].prompt;
    assert!(!prompt.contains("bad\"name"));
    assert!(!prompt.contains("\"Toxicity\""));
}
