//! Shared HTTP plumbing for provider adapters.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::error::ProviderError;

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Connection pool plus endpoint credentials, shared by reference across concurrent calls.
#[derive(Clone)]
pub struct HttpTransport {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: HttpClient::builder()
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POSTs `body` as JSON and decodes the reply as `R`.
    ///
    /// Non-2xx replies become [`ProviderError::http`] carrying the provider's own error message
    /// and code when the body has one.
    pub async fn post_json<B, R>(
        &self,
        provider: &str,
        url: &str,
        headers: &[(&str, String)],
        body: &B,
        timeout: Duration,
    ) -> Result<R, ProviderError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.http.post(url).timeout(timeout).json(body);
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(provider, &e))?;

        let status = response.status();
        debug!(provider = provider, status = status.as_u16(), "Provider responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (message, code) = error_details(&body);
            let mut err = ProviderError::http(
                status.as_u16(),
                format!(
                    "{} returned {}: {}",
                    provider,
                    status,
                    message.unwrap_or_else(|| truncate(&body))
                ),
            );
            err.code = code;
            return Err(err);
        }

        response
            .json::<R>()
            .await
            .map_err(|e| ProviderError::from_reqwest(provider, &e))
    }
}

/// Pulls `message` / `code` out of the common error envelopes:
/// `{"error": {"message", "code"|"type"|"status"}}`, `{"error": "..."}`, `{"message": "..."}`.
fn error_details(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return (None, None);
    };

    let error = value.get("error").unwrap_or(&value);
    if let Some(text) = error.as_str() {
        return (Some(text.to_string()), None);
    }

    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);
    let code = ["code", "type", "status"]
        .iter()
        .filter_map(|k| error.get(*k))
        .find_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

    (message, code)
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut out: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_details_openai_envelope() {
        let body = r#"{"error": {"message": "Rate limit reached", "type": "requests", "code": "rate_limit_exceeded"}}"#;
        let (message, code) = error_details(body);
        assert_eq!(message.as_deref(), Some("Rate limit reached"));
        assert_eq!(code.as_deref(), Some("rate_limit_exceeded"));
    }

    #[test]
    fn test_error_details_gemini_envelope() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        let (message, code) = error_details(body);
        assert_eq!(message.as_deref(), Some("Quota exceeded"));
        assert_eq!(code.as_deref(), Some("429"));
    }

    #[test]
    fn test_error_details_plain_string() {
        let (message, code) = error_details(r#"{"error": "Model is loading"}"#);
        assert_eq!(message.as_deref(), Some("Model is loading"));
        assert!(code.is_none());
    }

    #[test]
    fn test_error_details_non_json() {
        assert_eq!(error_details("<html>502</html>"), (None, None));
    }

    #[test]
    fn test_url_joining() {
        let transport = HttpTransport::new("http://localhost:11434/", "");
        assert_eq!(transport.url("/api/generate"), "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_debug_redacts_key() {
        let transport = HttpTransport::new("https://api.openai.com", "sk-secret");
        assert!(!format!("{:?}", transport).contains("sk-secret"));
    }
}
