use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::descriptor::{OLLAMA, ProviderDescriptor};
use super::{CallParams, HttpTransport, LlmProvider, ProviderError, RawProviderResponse, TokenUsage};

const GENERATE_PATH: &str = "/api/generate";

/// Local Ollama `/api/generate` adapter. No credentials.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    transport: HttpTransport,
}

impl OllamaProvider {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    prompt_eval_count: Option<u64>,
    eval_count: Option<u64>,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &OLLAMA
    }

    #[instrument(skip(self, prompt), fields(provider = "ollama", model = %params.model))]
    async fn invoke(
        &self,
        prompt: &str,
        params: &CallParams,
    ) -> Result<RawProviderResponse, ProviderError> {
        let body = GenerateRequest {
            model: &params.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: params.temperature,
                num_predict: params.max_tokens,
            },
        };

        let response: GenerateResponse = self
            .transport
            .post_json(
                OLLAMA.kind.as_str(),
                &self.transport.url(GENERATE_PATH),
                &[],
                &body,
                params.timeout,
            )
            .await?;

        let usage = TokenUsage::from_counts(response.prompt_eval_count, response.eval_count);
        Ok(RawProviderResponse {
            text: response.response,
            usage,
        })
    }
}
