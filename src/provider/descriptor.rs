use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::TokenUsage;

/// Supported completion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    Gemini,
    Anthropic,
    #[serde(rename = "huggingface")]
    HuggingFace,
    Ollama,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::OpenAi,
        ProviderKind::Gemini,
        ProviderKind::Anthropic,
        ProviderKind::HuggingFace,
        ProviderKind::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Ollama => "ollama",
        }
    }

    pub fn descriptor(&self) -> &'static ProviderDescriptor {
        match self {
            ProviderKind::OpenAi => &OPENAI,
            ProviderKind::Gemini => &GEMINI,
            ProviderKind::Anthropic => &ANTHROPIC,
            ProviderKind::HuggingFace => &HUGGINGFACE,
            ProviderKind::Ollama => &OLLAMA,
        }
    }

    /// Provider-specific environment variable consulted when no generic key is set.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::HuggingFace => Some("HUGGINGFACE_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "ollama" => Ok(Self::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Request/response family a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointShape {
    /// `POST /v1/chat/completions`
    ChatCompletions,
    /// `POST /v1/messages`
    Messages,
    /// `POST /v1beta/models/{model}:generateContent`
    GenerateContent,
    /// `POST /models/{model}`
    TextGeneration,
    /// `POST /api/generate`
    Generate,
}

/// Static, read-only description of a provider: models, endpoint and pricing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderDescriptor {
    pub kind: ProviderKind,
    pub default_model: &'static str,
    pub fast_model: &'static str,
    pub accurate_model: &'static str,
    pub base_url: &'static str,
    pub endpoint: EndpointShape,
    /// USD per 1000 input tokens.
    pub input_cost_per_1k: f64,
    /// USD per 1000 output tokens.
    pub output_cost_per_1k: f64,
    pub requires_api_key: bool,
}

impl ProviderDescriptor {
    /// Resolves `default` / `fast` / `accurate` aliases; other names pass through.
    pub fn resolve_model<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested.map(str::trim) {
            None | Some("") | Some("default") => self.default_model,
            Some("fast") => self.fast_model,
            Some("accurate") => self.accurate_model,
            Some(name) => name,
        }
    }

    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        (usage.input_tokens as f64 / 1000.0) * self.input_cost_per_1k
            + (usage.output_tokens as f64 / 1000.0) * self.output_cost_per_1k
    }
}

pub static OPENAI: ProviderDescriptor = ProviderDescriptor {
    kind: ProviderKind::OpenAi,
    default_model: "gpt-4o-mini",
    fast_model: "gpt-4o-mini",
    accurate_model: "gpt-4o",
    base_url: "https://api.openai.com",
    endpoint: EndpointShape::ChatCompletions,
    input_cost_per_1k: 0.00015,
    output_cost_per_1k: 0.0006,
    requires_api_key: true,
};

pub static GEMINI: ProviderDescriptor = ProviderDescriptor {
    kind: ProviderKind::Gemini,
    default_model: "gemini-1.5-flash",
    fast_model: "gemini-1.5-flash",
    accurate_model: "gemini-1.5-pro",
    base_url: "https://generativelanguage.googleapis.com",
    endpoint: EndpointShape::GenerateContent,
    input_cost_per_1k: 0.000075,
    output_cost_per_1k: 0.0003,
    requires_api_key: true,
};

pub static ANTHROPIC: ProviderDescriptor = ProviderDescriptor {
    kind: ProviderKind::Anthropic,
    default_model: "claude-3-haiku-20240307",
    fast_model: "claude-3-haiku-20240307",
    accurate_model: "claude-3-5-sonnet-20241022",
    base_url: "https://api.anthropic.com",
    endpoint: EndpointShape::Messages,
    input_cost_per_1k: 0.00025,
    output_cost_per_1k: 0.00125,
    requires_api_key: true,
};

pub static HUGGINGFACE: ProviderDescriptor = ProviderDescriptor {
    kind: ProviderKind::HuggingFace,
    default_model: "mistralai/Mistral-7B-Instruct-v0.2",
    fast_model: "mistralai/Mistral-7B-Instruct-v0.2",
    accurate_model: "meta-llama/Meta-Llama-3-70B-Instruct",
    base_url: "https://api-inference.huggingface.co",
    endpoint: EndpointShape::TextGeneration,
    input_cost_per_1k: 0.0,
    output_cost_per_1k: 0.0,
    requires_api_key: true,
};

pub static OLLAMA: ProviderDescriptor = ProviderDescriptor {
    kind: ProviderKind::Ollama,
    default_model: "llama3.1",
    fast_model: "llama3.2",
    accurate_model: "llama3.1:70b",
    base_url: "http://localhost:11434",
    endpoint: EndpointShape::Generate,
    input_cost_per_1k: 0.0,
    output_cost_per_1k: 0.0,
    requires_api_key: false,
};
