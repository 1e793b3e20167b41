//! Gemini `generateContent` client
//!
//! One prompt in, one text reply out. Retrying is left to the caller, which
//! asks [`GenerationError::is_retryable`] whether another attempt makes sense.

use crate::config::ModelConfig;
use crate::error::{Result, SmartAtsError};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned no text: {0}")]
    EmptyReply(String),
}

impl GenerationError {
    /// Connection problems, timeouts, rate limiting and server errors are
    /// worth another attempt. Bad requests, auth failures and empty replies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Http(e) => !e.is_decode() && !e.is_builder(),
            GenerationError::Api { status, .. } => *status == 429 || *status >= 500,
            GenerationError::EmptyReply(_) => false,
        }
    }
}

/// Something that turns a prompt into a text reply.
pub trait TextGenerator {
    fn model_name(&self) -> &str;

    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = std::result::Result<String, GenerationError>> + Send;
}

/// Everything the client needs to talk to Gemini, credential included.
#[derive(Clone)]
pub struct GeminiSettings {
    api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>, config: &ModelConfig) -> Self {
        Self {
            api_key: api_key.into(),
            model: config.name.clone(),
            endpoint: config.endpoint.clone(),
            timeout: config.timeout(),
        }
    }

    /// Read the API key from the environment variable named in the config.
    pub fn from_env(config: &ModelConfig) -> Result<Self> {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(config: &ModelConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(&config.api_key_env) {
            Some(key) if !key.trim().is_empty() => Ok(Self::new(key.trim(), config)),
            _ => Err(SmartAtsError::MissingCredential(config.api_key_env.clone())),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint.trim_end_matches('/'), self.model)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
    pub total_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all parts joined.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Why there is no text, as far as the response says.
    fn empty_reason(&self) -> String {
        if let Some(reason) = self.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref()) {
            return format!("prompt blocked ({})", reason);
        }
        match self.candidates.first() {
            None => "no candidates in response".to_string(),
            Some(candidate) => match candidate.finish_reason.as_deref() {
                Some(reason) => format!("empty candidate (finish reason {})", reason),
                None => "empty candidate".to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| SmartAtsError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, settings })
    }
}

impl TextGenerator for GeminiClient {
    fn model_name(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!("Calling {} with a {} char prompt", self.settings.model, prompt.len());

        let response = self
            .http
            .post(self.settings.url())
            .header(API_KEY_HEADER, &self.settings.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &reply.usage_metadata {
            debug!(
                "Gemini usage: prompt_tokens={:?}, reply_tokens={:?}, total={:?}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        reply
            .text()
            .ok_or_else(|| GenerationError::EmptyReply(reply.empty_reason()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_missing_credential() {
        let config = Config::default();
        let result = GeminiSettings::from_lookup(&config.model, |_| None);
        match result {
            Err(SmartAtsError::MissingCredential(var)) => assert_eq!(var, "GOOGLE_API_KEY"),
            other => panic!("expected missing credential, got {:?}", other),
        }

        let blank = GeminiSettings::from_lookup(&config.model, |_| Some("   ".to_string()));
        assert!(matches!(blank, Err(SmartAtsError::MissingCredential(_))));
    }

    #[test]
    fn test_settings_from_lookup() {
        let mut config = Config::default();
        config.model.api_key_env = "ATS_KEY".to_string();
        config.model.endpoint = "http://localhost:9999/models/".to_string();

        let settings = GeminiSettings::from_lookup(&config.model, |name| {
            (name == "ATS_KEY").then(|| "secret".to_string())
        })
        .unwrap()
        .with_model("gemini-pro");

        assert_eq!(settings.url(), "http://localhost:9999/models/gemini-pro:generateContent");
        assert!(!format!("{:?}", settings).contains("secret"));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"JD Match\":"},{"text":"\"90%\"}"}],"role":"model"},"finishReason":"STOP"}]}"#;
        let reply: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(reply.text().as_deref(), Some("{\"JD Match\":\"90%\"}"));
    }

    #[test]
    fn test_blocked_prompt_reason() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let reply: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert!(reply.text().is_none());
        assert_eq!(reply.empty_reason(), "prompt blocked (SAFETY)");
    }

    #[test]
    fn test_retryable_statuses() {
        let api = |status| GenerationError::Api { status, message: String::new() };
        assert!(api(429).is_retryable());
        assert!(api(503).is_retryable());
        assert!(!api(400).is_retryable());
        assert!(!api(403).is_retryable());
        assert!(!GenerationError::EmptyReply("blocked".to_string()).is_retryable());
    }
}
