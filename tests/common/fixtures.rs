//! Test fixtures for integration tests.

use serde_json::{Value, json};

use veracity::config::Config;
use veracity::provider::ProviderKind;

pub const TEST_API_KEY: &str = "sk-test-key";

/// A complete, schema-conforming verdict as the model would write it.
pub fn verdict_text(is_valid: bool, confidence: f64, reason: &str) -> String {
    json!({
        "isValid": is_valid,
        "confidence": confidence,
        "reason": reason,
        "issues": [],
        "suggestions": [],
        "categories": {
            "toxicity": {"passed": true, "score": 0.97, "explanation": "Polite"},
            "factuality": {"passed": is_valid, "score": confidence, "explanation": "Checked"},
            "coherence": {"passed": true, "score": 0.9, "explanation": "Clear"},
            "relevance": {"passed": true, "score": 0.85, "explanation": "On topic"},
            "safety": {"passed": true, "score": 0.99, "explanation": "Safe"}
        }
    })
    .to_string()
}

pub fn openai_completion(text: &str, prompt_tokens: u64, completion_tokens: u64) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": prompt_tokens,
            "completion_tokens": completion_tokens,
            "total_tokens": prompt_tokens + completion_tokens
        }
    })
}

pub fn openai_error(message: &str, code: &str) -> Value {
    json!({"error": {"message": message, "type": "requests", "code": code}})
}

pub fn anthropic_message(text: &str, input_tokens: u64, output_tokens: u64) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "usage": {"input_tokens": input_tokens, "output_tokens": output_tokens}
    })
}

pub fn gemini_response(text: &str, prompt_tokens: u64, candidate_tokens: u64) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": prompt_tokens,
            "candidatesTokenCount": candidate_tokens,
            "totalTokenCount": prompt_tokens + candidate_tokens
        }
    })
}

pub fn huggingface_response(text: &str) -> Value {
    json!([{"generated_text": text}])
}

pub fn ollama_response(text: &str, prompt_eval: u64, eval: u64) -> Value {
    json!({
        "model": "llama3.1",
        "response": text,
        "done": true,
        "prompt_eval_count": prompt_eval,
        "eval_count": eval
    })
}

/// Config pointing `provider` at `base_url`, with fast batch pacing.
pub fn config_for(provider: ProviderKind, base_url: &str) -> Config {
    Config {
        provider,
        api_key: Some(TEST_API_KEY.to_string()),
        base_url: Some(base_url.to_string()),
        batch_delay_ms: 10,
        ..Default::default()
    }
}
