use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::descriptor::{OPENAI, ProviderDescriptor};
use super::{CallParams, LlmProvider, ProviderError, RawProviderResponse, TokenUsage};

/// Well-formed verdict returned when nothing else is scripted.
pub const DEFAULT_MOCK_REPLY: &str = r#"{
  "isValid": true,
  "confidence": 0.9,
  "reason": "Content is accurate and appropriate",
  "issues": [],
  "suggestions": [],
  "categories": {
    "toxicity": {"passed": true, "score": 0.95, "explanation": "No toxic language"},
    "factuality": {"passed": true, "score": 0.9, "explanation": "Claims are accurate"},
    "coherence": {"passed": true, "score": 0.92, "explanation": "Well structured"},
    "relevance": {"passed": true, "score": 0.88, "explanation": "On topic"},
    "safety": {"passed": true, "score": 0.97, "explanation": "No harmful content"}
  }
}"#;

pub const DEFAULT_MOCK_USAGE: TokenUsage = TokenUsage {
    input_tokens: 120,
    output_tokens: 40,
};

/// One scripted provider outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String, Option<TokenUsage>),
    Error(ProviderError),
    /// Never completes; exercises the call timeout.
    Hang,
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into(), None)
    }

    pub fn with_usage(text: impl Into<String>, input_tokens: u64, output_tokens: u64) -> Self {
        Self::Text(
            text.into(),
            Some(TokenUsage::new(input_tokens, output_tokens)),
        )
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Error(ProviderError::http(status, message))
    }

    pub fn transport(code: &str, message: impl Into<String>) -> Self {
        Self::Error(ProviderError::transport(code, message))
    }
}

/// A recorded [`LlmProvider::invoke`] call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub prompt: String,
    pub model: String,
    pub at: Instant,
}

#[derive(Default)]
struct MockState {
    script: VecDeque<MockReply>,
    rules: Vec<(String, MockReply)>,
    delays: Vec<(String, Duration)>,
    calls: Vec<MockCall>,
}

/// Scripted in-memory provider.
///
/// Reply selection per call: the first rule whose needle occurs in the prompt, then the next
/// scripted reply, then [`DEFAULT_MOCK_REPLY`].
pub struct MockProvider {
    descriptor: &'static ProviderDescriptor,
    state: Mutex<MockState>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_descriptor(&OPENAI)
    }

    pub fn with_descriptor(descriptor: &'static ProviderDescriptor) -> Self {
        Self {
            descriptor,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Queues replies consumed in order, one per call.
    pub fn scripted(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let provider = Self::new();
        provider.push_replies(replies);
        provider
    }

    pub fn push_reply(&self, reply: MockReply) {
        self.state.lock().script.push_back(reply);
    }

    pub fn push_replies(&self, replies: impl IntoIterator<Item = MockReply>) {
        self.state.lock().script.extend(replies);
    }

    /// Answers every prompt containing `needle` with `reply`.
    pub fn on_prompt_containing(&self, needle: impl Into<String>, reply: MockReply) {
        self.state.lock().rules.push((needle.into(), reply));
    }

    /// Delays every prompt containing `needle` by `delay` before answering.
    pub fn delay_prompt_containing(&self, needle: impl Into<String>, delay: Duration) {
        self.state.lock().delays.push((needle.into(), delay));
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    fn next_reply(&self, prompt: &str, params: &CallParams) -> (MockReply, Option<Duration>) {
        let mut state = self.state.lock();
        state.calls.push(MockCall {
            prompt: prompt.to_string(),
            model: params.model.clone(),
            at: Instant::now(),
        });

        let delay = state
            .delays
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, d)| *d);

        let ruled = state
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone());

        let reply = ruled
            .or_else(|| state.script.pop_front())
            .unwrap_or_else(|| {
                MockReply::Text(DEFAULT_MOCK_REPLY.to_string(), Some(DEFAULT_MOCK_USAGE))
            });

        (reply, delay)
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        self.descriptor
    }

    async fn invoke(
        &self,
        prompt: &str,
        params: &CallParams,
    ) -> Result<RawProviderResponse, ProviderError> {
        let (reply, delay) = self.next_reply(prompt, params);

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            MockReply::Text(text, usage) => Ok(RawProviderResponse { text, usage }),
            MockReply::Error(err) => Err(err),
            MockReply::Hang => std::future::pending().await,
        }
    }
}
