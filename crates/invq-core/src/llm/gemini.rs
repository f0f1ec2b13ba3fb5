//! Gemini `generateContent` client over reqwest.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{LanguageModel, Result, RetryPolicy};
use crate::error::LlmError;
use crate::models::config::InvqConfig;

const USER_AGENT: &str = concat!("invq/", env!("CARGO_PKG_VERSION"));

/// Client for one Gemini model.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    /// Create a client for `model` with the given API key.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            base_url: crate::models::config::LlmConfig::default().base_url,
            model: sanitize_model(model),
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
        })
    }

    /// Build the extraction client described by `config`.
    pub fn for_extraction(config: &InvqConfig) -> Result<Self> {
        Self::from_config(config, &config.llm.extraction_model)
    }

    /// Build the question-answering client described by `config`.
    pub fn for_chat(config: &InvqConfig) -> Result<Self> {
        Self::from_config(config, &config.llm.chat_model)
    }

    fn from_config(config: &InvqConfig, model: &str) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| LlmError::MissingApiKey(config.llm.api_key_env.clone()))?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.llm.base_url.clone(),
            model: sanitize_model(model),
            api_key,
            retry: RetryPolicy::from(&config.retry),
        })
    }

    /// Override the REST base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn generate_once(&self, request: &GenerateContentRequest) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed.text().ok_or(LlmError::EmptyResponse)
    }
}

impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(LlmError::EmptyPrompt);
        }

        let request = GenerateContentRequest::user_text(prompt);
        debug!("Sending {} chars to {}", prompt.len(), self.model);

        let text = self
            .retry
            .run(|attempt| {
                trace!("generateContent attempt {}", attempt);
                self.generate_once(&request)
            })
            .await?;

        trace!("Model response:\n{}", text);
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Prefix bare model names with `models/`.
fn sanitize_model(model: impl Into<String>) -> String {
    let model = model.into();
    if model.starts_with("models/") {
        model
    } else {
        format!("models/{}", model)
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

impl GenerateContentRequest {
    fn user_text(text: &str) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(text.to_string()),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts joined.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let request = GenerateContentRequest::user_text("hello");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"contents": [{"role": "user", "parts": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "```json\n"}, {"text": "{}\n```"}]}},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("```json\n{}\n```"));
    }

    #[test]
    fn test_empty_response() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.text(), None);

        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert_eq!(blocked.text(), None);
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new("key", "gemini-2.5-flash")
            .unwrap()
            .with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(client.name(), "models/gemini-2.5-flash");
    }
}
