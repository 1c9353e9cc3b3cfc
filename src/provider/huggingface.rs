use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::descriptor::{HUGGINGFACE, ProviderDescriptor};
use super::{CallParams, HttpTransport, LlmProvider, ProviderError, RawProviderResponse};

/// Hugging Face Inference API text-generation adapter. Reports no token usage.
#[derive(Debug, Clone)]
pub struct HuggingFaceProvider {
    transport: HttpTransport,
}

impl HuggingFaceProvider {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

#[derive(Debug, Serialize)]
struct TextGenerationRequest<'a> {
    inputs: &'a str,
    parameters: TextGenerationParameters,
}

#[derive(Debug, Serialize)]
struct TextGenerationParameters {
    temperature: f32,
    max_new_tokens: u32,
    return_full_text: bool,
}

/// The endpoint answers with either a list of generations or a single object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextGenerationResponse {
    Many(Vec<Generation>),
    One(Generation),
}

#[derive(Debug, Deserialize)]
struct Generation {
    #[serde(default)]
    generated_text: String,
}

#[async_trait]
impl LlmProvider for HuggingFaceProvider {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &HUGGINGFACE
    }

    #[instrument(skip(self, prompt), fields(provider = "huggingface", model = %params.model))]
    async fn invoke(
        &self,
        prompt: &str,
        params: &CallParams,
    ) -> Result<RawProviderResponse, ProviderError> {
        let body = TextGenerationRequest {
            inputs: prompt,
            parameters: TextGenerationParameters {
                temperature: params.temperature,
                max_new_tokens: params.max_tokens,
                return_full_text: false,
            },
        };
        let headers = [(
            "authorization",
            format!("Bearer {}", self.transport.api_key()),
        )];

        let response: TextGenerationResponse = self
            .transport
            .post_json(
                HUGGINGFACE.kind.as_str(),
                &self.transport.url(&format!("/models/{}", params.model)),
                &headers,
                &body,
                params.timeout,
            )
            .await?;

        let text = match response {
            TextGenerationResponse::Many(generations) => generations
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .unwrap_or_default(),
            TextGenerationResponse::One(generation) => generation.generated_text,
        };

        Ok(RawProviderResponse { text, usage: None })
    }
}
