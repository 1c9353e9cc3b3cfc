//! Provider adapters against a local stub endpoint.

mod common;

use std::time::Duration;

use serde_json::json;

use veracity::is_retryable;
use veracity::provider::{
    AnthropicProvider, CallParams, GeminiProvider, HttpTransport, HuggingFaceProvider,
    LlmProvider, OllamaProvider, OpenAiProvider, TokenUsage,
};

use common::fixtures::{
    TEST_API_KEY, anthropic_message, gemini_response, huggingface_response, ollama_response,
    openai_completion, openai_error,
};
use common::upstream::{StubUpstream, closed_port_url};

fn params(model: &str) -> CallParams {
    CallParams {
        model: model.to_string(),
        temperature: 0.1,
        max_tokens: 256,
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_openai_request_and_response_shape() {
    let stub = StubUpstream::spawn().await;
    stub.reply(200, openai_completion("hello", 12, 3));
    let provider = OpenAiProvider::new(HttpTransport::new(stub.url(), TEST_API_KEY));

    let response = provider
        .invoke("verify this", &params("gpt-4o-mini"))
        .await
        .expect("call should succeed");

    assert_eq!(response.text, "hello");
    assert_eq!(response.usage, Some(TokenUsage::new(12, 3)));

    let request = &stub.requests()[0];
    assert_eq!(request.path, "/v1/chat/completions");
    assert_eq!(
        request.headers.get("authorization").map(String::as_str),
        Some("Bearer sk-test-key")
    );
    assert_eq!(request.body["model"], "gpt-4o-mini");
    assert_eq!(request.body["max_tokens"], 256);
    assert_eq!(request.body["messages"][0]["role"], "user");
    assert_eq!(request.body["messages"][0]["content"], "verify this");
}

#[tokio::test]
async fn test_openai_rate_limit_maps_to_retryable_error() {
    let stub = StubUpstream::spawn().await;
    stub.reply(
        429,
        openai_error("Rate limit reached for gpt-4o-mini", "rate_limit_exceeded"),
    );
    let provider = OpenAiProvider::new(HttpTransport::new(stub.url(), TEST_API_KEY));

    let err = provider
        .invoke("p", &params("gpt-4o-mini"))
        .await
        .unwrap_err();

    assert_eq!(err.status, Some(429));
    assert_eq!(err.code.as_deref(), Some("rate_limit_exceeded"));
    assert!(err.message.contains("Rate limit reached"));
    assert!(is_retryable(&err));
}

#[tokio::test]
async fn test_openai_auth_failure_is_terminal() {
    let stub = StubUpstream::spawn().await;
    stub.reply(
        401,
        openai_error("Incorrect API key provided", "invalid_api_key"),
    );
    let provider = OpenAiProvider::new(HttpTransport::new(stub.url(), "wrong"));

    let err = provider
        .invoke("p", &params("gpt-4o-mini"))
        .await
        .unwrap_err();

    assert_eq!(err.status, Some(401));
    assert!(!is_retryable(&err));
}

#[tokio::test]
async fn test_anthropic_request_and_response_shape() {
    let stub = StubUpstream::spawn().await;
    stub.reply(200, anthropic_message("verdict", 20, 7));
    let provider = AnthropicProvider::new(HttpTransport::new(stub.url(), TEST_API_KEY));

    let response = provider
        .invoke("judge", &params("claude-3-haiku-20240307"))
        .await
        .unwrap();

    assert_eq!(response.text, "verdict");
    assert_eq!(response.usage, Some(TokenUsage::new(20, 7)));

    let request = &stub.requests()[0];
    assert_eq!(request.path, "/v1/messages");
    assert_eq!(
        request.headers.get("x-api-key").map(String::as_str),
        Some(TEST_API_KEY)
    );
    assert_eq!(
        request.headers.get("anthropic-version").map(String::as_str),
        Some("2023-06-01")
    );
    assert_eq!(request.body["messages"][0]["content"], "judge");
    assert_eq!(request.body["max_tokens"], 256);
}

#[tokio::test]
async fn test_gemini_request_and_response_shape() {
    let stub = StubUpstream::spawn().await;
    stub.reply(200, gemini_response("ok", 30, 9));
    let provider = GeminiProvider::new(HttpTransport::new(stub.url(), TEST_API_KEY));

    let response = provider
        .invoke("judge", &params("gemini-1.5-flash"))
        .await
        .unwrap();

    assert_eq!(response.text, "ok");
    assert_eq!(response.usage, Some(TokenUsage::new(30, 9)));

    let request = &stub.requests()[0];
    assert_eq!(
        request.path,
        "/v1beta/models/gemini-1.5-flash:generateContent"
    );
    assert_eq!(
        request.headers.get("x-goog-api-key").map(String::as_str),
        Some(TEST_API_KEY)
    );
    assert_eq!(request.body["contents"][0]["parts"][0]["text"], "judge");
    assert_eq!(request.body["generationConfig"]["maxOutputTokens"], 256);
}

#[tokio::test]
async fn test_huggingface_has_no_usage() {
    let stub = StubUpstream::spawn().await;
    stub.reply(200, huggingface_response("generated"));
    let provider = HuggingFaceProvider::new(HttpTransport::new(stub.url(), TEST_API_KEY));

    let response = provider
        .invoke("judge", &params("mistralai/Mistral-7B-Instruct-v0.2"))
        .await
        .unwrap();

    assert_eq!(response.text, "generated");
    assert!(response.usage.is_none());

    let request = &stub.requests()[0];
    assert_eq!(request.path, "/models/mistralai/Mistral-7B-Instruct-v0.2");
    assert_eq!(request.body["inputs"], "judge");
    assert_eq!(request.body["parameters"]["max_new_tokens"], 256);
    assert_eq!(request.body["parameters"]["return_full_text"], false);
}

#[tokio::test]
async fn test_huggingface_model_loading_error() {
    let stub = StubUpstream::spawn().await;
    stub.reply(503, json!({"error": "Model is currently loading"}));
    let provider = HuggingFaceProvider::new(HttpTransport::new(stub.url(), TEST_API_KEY));

    let err = provider.invoke("judge", &params("m")).await.unwrap_err();
    assert_eq!(err.status, Some(503));
    assert!(err.message.contains("Model is currently loading"));
    assert!(is_retryable(&err));
}

#[tokio::test]
async fn test_ollama_request_and_response_shape() {
    let stub = StubUpstream::spawn().await;
    stub.reply(200, ollama_response("local verdict", 40, 11));
    let provider = OllamaProvider::new(HttpTransport::new(stub.url(), ""));

    let response = provider.invoke("judge", &params("llama3.1")).await.unwrap();

    assert_eq!(response.text, "local verdict");
    assert_eq!(response.usage, Some(TokenUsage::new(40, 11)));

    let request = &stub.requests()[0];
    assert_eq!(request.path, "/api/generate");
    assert!(!request.headers.contains_key("authorization"));
    assert_eq!(request.body["stream"], false);
    assert_eq!(request.body["options"]["num_predict"], 256);
}

#[tokio::test]
async fn test_connection_refused_is_retryable() {
    let provider = OpenAiProvider::new(HttpTransport::new(closed_port_url().await, TEST_API_KEY));

    let err = provider
        .invoke("p", &params("gpt-4o-mini"))
        .await
        .unwrap_err();

    assert!(err.status.is_none());
    assert_eq!(err.code.as_deref(), Some("ECONNREFUSED"));
    assert_eq!(err.kind(), "transport");
    assert!(is_retryable(&err));
}

#[tokio::test]
async fn test_request_timeout_is_retryable() {
    let stub = StubUpstream::spawn().await;
    stub.delay(Duration::from_secs(2))
        .reply(200, openai_completion("late", 1, 1));
    let provider = OpenAiProvider::new(HttpTransport::new(stub.url(), TEST_API_KEY));

    let mut call = params("gpt-4o-mini");
    call.timeout = Duration::from_millis(100);
    let err = provider.invoke("p", &call).await.unwrap_err();

    assert_eq!(err.code.as_deref(), Some("ETIMEDOUT"));
    assert!(is_retryable(&err));
}
