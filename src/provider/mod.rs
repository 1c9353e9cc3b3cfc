//! LLM provider adapters.
//!
//! Each provider implements [`LlmProvider`]: exactly one HTTP call per [`invoke`], normalized to
//! [`RawProviderResponse`]. Adapters never retry; the verifier owns retry policy.
//!
//! [`invoke`]: LlmProvider::invoke

pub mod anthropic;
pub mod descriptor;
pub mod error;
pub mod gemini;
pub mod http;
pub mod huggingface;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod ollama;
pub mod openai;


use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};

pub use anthropic::AnthropicProvider;
pub use descriptor::{EndpointShape, ProviderDescriptor, ProviderKind};
pub use error::ProviderError;
pub use gemini::GeminiProvider;
pub use http::HttpTransport;
pub use huggingface::HuggingFaceProvider;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCall, MockProvider, MockReply};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Token counts reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    /// Builds usage from optional counts; `None` unless at least one count is present.
    pub fn from_counts(input: Option<u64>, output: Option<u64>) -> Option<Self> {
        match (input, output) {
            (None, None) => None,
            (input, output) => Some(Self::new(input.unwrap_or(0), output.unwrap_or(0))),
        }
    }
}

/// Normalized provider reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProviderResponse {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Resolved per-call request parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CallParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Uniform call contract over a completion endpoint.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Static model and pricing table for this provider.
    fn descriptor(&self) -> &'static ProviderDescriptor;

    /// Performs exactly one completion request.
    async fn invoke(
        &self,
        prompt: &str,
        params: &CallParams,
    ) -> Result<RawProviderResponse, ProviderError>;
}

/// Builds the adapter selected by `config.provider`.
pub fn build_provider(config: &Config) -> Result<Arc<dyn LlmProvider>, ConfigError> {
    let descriptor = config.provider.descriptor();

    let api_key = match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ if descriptor.requires_api_key => {
            return Err(ConfigError::MissingApiKey {
                provider: config.provider.as_str(),
            });
        }
        _ => String::new(),
    };

    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| descriptor.base_url.to_string());
    let transport = HttpTransport::new(base_url, api_key);

    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(transport)),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(transport)),
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(transport)),
        ProviderKind::HuggingFace => Arc::new(HuggingFaceProvider::new(transport)),
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(transport)),
    };

    Ok(provider)
}
