use super::LanguageModel;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Chat completions API client
pub struct OpenAiClient {
    api_key: String,
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    /// Create a new client against an OpenAI-compatible API root
    pub fn new(api_key: String, api_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            client,
            endpoint: format!("{}/chat/completions", api_url.trim_end_matches('/')),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Set the model to use
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_request(&self, system: &str, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = self.build_request(system, prompt);
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "calling language model");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::upstream(format!(
                    "Failed to reach the language model API: {}",
                    e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status, &error_text));
        }

        let chat: ChatResponse = response.json().await?;
        extract_text(chat)
    }
}

fn classify_status(status: StatusCode, body: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED => AppError::UpstreamAuth(
            "Invalid OpenAI API key. Please check your OPENAI_API_KEY.".to_string(),
        ),
        StatusCode::TOO_MANY_REQUESTS => AppError::UpstreamRateLimit(
            "OpenAI API rate limit exceeded. Please try again later.".to_string(),
        ),
        _ => {
            let excerpt: String = body.chars().take(300).collect();
            AppError::upstream(format!("OpenAI API error ({}): {}", status, excerpt))
        }
    }
}

/// Text of the first choice, trimmed
fn extract_text(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| AppError::upstream("No content in language model response"))
}

// No max_tokens: output length is left to the model
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
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
