use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::descriptor::{ANTHROPIC, ProviderDescriptor};
use super::{CallParams, HttpTransport, LlmProvider, ProviderError, RawProviderResponse, TokenUsage};

const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages adapter.
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    transport: HttpTransport,
}

impl AnthropicProvider {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &ANTHROPIC
    }

    #[instrument(skip(self, prompt), fields(provider = "anthropic", model = %params.model))]
    async fn invoke(
        &self,
        prompt: &str,
        params: &CallParams,
    ) -> Result<RawProviderResponse, ProviderError> {
        let body = MessagesRequest {
            model: &params.model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };
        let headers = [
            ("x-api-key", self.transport.api_key().to_string()),
            ("anthropic-version", ANTHROPIC_VERSION.to_string()),
        ];

        let response: MessagesResponse = self
            .transport
            .post_json(
                ANTHROPIC.kind.as_str(),
                &self.transport.url(MESSAGES_PATH),
                &headers,
                &body,
                params.timeout,
            )
            .await?;

        let text = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        let usage = response
            .usage
            .and_then(|u| TokenUsage::from_counts(u.input_tokens, u.output_tokens));

        Ok(RawProviderResponse { text, usage })
    }
}
