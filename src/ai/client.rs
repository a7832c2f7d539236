use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemma-3-27b-it";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant that helps people plan their day effectively. Provide concise, actionable advice.";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed API response: {0}")]
    MalformedResponse(String),
}

/// Anything that turns a prompt into free-text plan output.
pub trait PlanGenerator {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, GenerateError>> + Send;
}

/// Connection settings for a chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub endpoint: String,
    pub model: String,
    pub system_prompt: String,
    pub referer: Option<String>,
    pub app_title: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            referer: None,
            app_title: Some("Day Planner".to_string()),
            timeout: Some(Duration::from_secs(60)),
        }
    }
}

/// An absent generator fails every request, e.g. when no API key is configured.
impl<T: PlanGenerator + Sync> PlanGenerator for Option<T> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        match self {
            Some(generator) => generator.generate(prompt).await,
            None => Err(GenerateError::MissingApiKey),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Single-shot client for an OpenAI-style `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    settings: ChatSettings,
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>, settings: ChatSettings) -> Result<Self, GenerateError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerateError::MissingApiKey);
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            api_key,
            settings,
        })
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    async fn complete(&self, body: serde_json::Value) -> Result<String, GenerateError> {
        let mut req = self
            .http
            .post(&self.settings.endpoint)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json");
        if let Some(referer) = &self.settings.referer {
            req = req.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.settings.app_title {
            req = req.header("X-Title", title);
        }

        let resp = req.json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerateError::Status { status, body });
        }

        let api_resp: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| GenerateError::MalformedResponse(e.to_string()))?;
        completion_text(api_resp)
    }

    /// Verify the API key with a minimal request.
    pub async fn test_api_key(&self) -> Result<String, GenerateError> {
        let body = serde_json::json!({
            "model": self.settings.model,
            "max_tokens": 4,
            "messages": [
                { "role": "user", "content": "Reply with OK" }
            ]
        });
        match self.complete(body).await {
            Ok(_) => Ok("API key valid".to_string()),
            Err(GenerateError::Status { status: 401, .. }) => Err(GenerateError::Status {
                status: 401,
                body: "Invalid API key".to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

impl PlanGenerator for ChatClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let body = request_body(&self.settings, prompt);
        log::debug!(
            "Requesting plan from {} (model {})",
            self.settings.endpoint,
            self.settings.model
        );
        self.complete(body).await
    }
}

fn request_body(settings: &ChatSettings, prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "model": settings.model,
        "messages": [
            { "role": "system", "content": settings.system_prompt },
            { "role": "user", "content": prompt }
        ]
    })
}

/// Pull the first choice's message text out of a completion response.
fn completion_text(value: serde_json::Value) -> Result<String, GenerateError> {
    let parsed: CompletionResponse = serde_json::from_value(value)
        .map_err(|e| GenerateError::MalformedResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GenerateError::MalformedResponse("no text in API response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_system_and_user_messages() {
        let body = request_body(&ChatSettings::default(), "plan my day");
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], DEFAULT_SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "plan my day");
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn extracts_first_choice() {
        let value = serde_json::json!({
            "id": "gen-1",
            "choices": [
                { "message": { "role": "assistant", "content": "9:00 - Walk" } },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        });
        assert_eq!(completion_text(value).unwrap(), "9:00 - Walk");
    }

    #[test]
    fn empty_choices_is_malformed() {
        let value = serde_json::json!({ "choices": [] });
        assert!(matches!(
            completion_text(value),
            Err(GenerateError::MalformedResponse(_))
        ));
    }

    #[test]
    fn error_payload_is_malformed() {
        let value = serde_json::json!({ "error": { "message": "rate limited" } });
        assert!(matches!(
            completion_text(value),
            Err(GenerateError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn absent_generator_reports_missing_key() {
        let generator: Option<ChatClient> = None;
        assert!(matches!(
            generator.generate("plan").await,
            Err(GenerateError::MissingApiKey)
        ));
    }

    #[test]
    fn blank_key_rejected() {
        assert!(matches!(
            ChatClient::new("  ", ChatSettings::default()),
            Err(GenerateError::MissingApiKey)
        ));
    }
}
