use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::descriptor::{OPENAI, ProviderDescriptor};
use super::{CallParams, HttpTransport, LlmProvider, ProviderError, RawProviderResponse, TokenUsage};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// OpenAI chat-completions adapter.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    transport: HttpTransport,
}

impl OpenAiProvider {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &OPENAI
    }

    #[instrument(skip(self, prompt), fields(provider = "openai", model = %params.model))]
    async fn invoke(
        &self,
        prompt: &str,
        params: &CallParams,
    ) -> Result<RawProviderResponse, ProviderError> {
        let body = ChatRequest {
            model: &params.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };
        let headers = [(
            "authorization",
            format!("Bearer {}", self.transport.api_key()),
        )];

        let response: ChatResponse = self
            .transport
            .post_json(
                OPENAI.kind.as_str(),
                &self.transport.url(CHAT_COMPLETIONS_PATH),
                &headers,
                &body,
                params.timeout,
            )
            .await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let usage = response
            .usage
            .and_then(|u| TokenUsage::from_counts(u.prompt_tokens, u.completion_tokens));

        Ok(RawProviderResponse { text, usage })
    }
}
