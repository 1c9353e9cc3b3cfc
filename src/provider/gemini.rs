use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::descriptor::{GEMINI, ProviderDescriptor};
use super::{CallParams, HttpTransport, LlmProvider, ProviderError, RawProviderResponse, TokenUsage};

/// Google Gemini `generateContent` adapter.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    transport: HttpTransport,
}

impl GeminiProvider {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    fn endpoint(&self, model: &str) -> String {
        self.transport
            .url(&format!("/v1beta/models/{}:generateContent", model))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &GEMINI
    }

    #[instrument(skip(self, prompt), fields(provider = "gemini", model = %params.model))]
    async fn invoke(
        &self,
        prompt: &str,
        params: &CallParams,
    ) -> Result<RawProviderResponse, ProviderError> {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
            },
        };
        let headers = [("x-goog-api-key", self.transport.api_key().to_string())];

        let response: GenerateResponse = self
            .transport
            .post_json(
                GEMINI.kind.as_str(),
                &self.endpoint(&params.model),
                &headers,
                &body,
                params.timeout,
            )
            .await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        let usage = response.usage_metadata.and_then(|u| {
            TokenUsage::from_counts(u.prompt_token_count, u.candidates_token_count)
        });

        Ok(RawProviderResponse { text, usage })
    }
}
