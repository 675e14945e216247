use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::config::ModelConfig;

/// Enum-based provider dispatch: Gemini is the primary deployment target,
/// OpenAI-compatible endpoints are supported for local proxies and testing.
#[derive(Debug, Clone)]
pub enum GenerativeProvider {
    Gemini(GeminiClient),
    OpenAI(OpenAIClient),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAI,
}

impl GenerativeProvider {
    pub fn from_config(config: &ModelConfig) -> Self {
        match config.provider {
            ProviderKind::Gemini => GenerativeProvider::Gemini(GeminiClient::new(
                config.api_key.clone(),
                config.base_url.clone(),
                config.model.clone(),
                config.timeout_secs,
            )),
            ProviderKind::OpenAI => GenerativeProvider::OpenAI(OpenAIClient::new(
                config.api_key.clone(),
                config.base_url.clone(),
                config.model.clone(),
                config.timeout_secs,
            )),
        }
    }

    /// Send a single prompt and return the model's text reply. No retries:
    /// a failed call goes straight to the caller's fallback or default.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            GenerativeProvider::Gemini(client) => client.generate(prompt).await,
            GenerativeProvider::OpenAI(client) => client.generate(prompt).await,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            GenerativeProvider::Gemini(_) => "Gemini",
            GenerativeProvider::OpenAI(_) => "OpenAI",
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            GenerativeProvider::Gemini(client) => &client.model,
            GenerativeProvider::OpenAI(client) => &client.model,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: i32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            model: model.unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.7,
                max_output_tokens: 4096,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        info!(
            provider = "Gemini",
            model = %self.model,
            prompt_length = prompt.len(),
            "Making model request"
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                provider = "Gemini",
                status = %status,
                error = %error_text,
                "Model API request failed"
            );
            return Err(anyhow::anyhow!("Gemini API request failed: {}", error_text));
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.first())
            .map(|part| part.text.clone())
            .ok_or_else(|| anyhow::anyhow!("No candidates in Gemini response"))?;

        info!(
            provider = "Gemini",
            response_length = text.len(),
            "Received model response"
        );
        Ok(text)
    }
}

#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: ChatMessage,
}

impl OpenAIClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request_body = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        info!(
            provider = "OpenAI",
            model = %self.model,
            prompt_length = prompt.len(),
            "Making model request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                provider = "OpenAI",
                status = %status,
                error = %error_text,
                "Model API request failed"
            );
            return Err(anyhow::anyhow!("OpenAI API request failed: {}", error_text));
        }

        let openai_response: OpenAIResponse = response.json().await?;
        let text = openai_response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("No choices in OpenAI response"))?;

        info!(
            provider = "OpenAI",
            response_length = text.len(),
            "Received model response"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(provider: ProviderKind) -> ModelConfig {
        ModelConfig {
            api_key: "test-key".to_string(),
            base_url: None,
            provider,
            model: None,
            timeout_secs: 30,
        }
    }

    #[test]
    fn gemini_defaults() {
        let provider = GenerativeProvider::from_config(&test_config(ProviderKind::Gemini));
        assert_eq!(provider.provider_name(), "Gemini");
        assert_eq!(provider.model_name(), "gemini-2.5-flash");
    }

    #[test]
    fn openai_defaults() {
        let provider = GenerativeProvider::from_config(&test_config(ProviderKind::OpenAI));
        assert_eq!(provider.provider_name(), "OpenAI");
        assert_eq!(provider.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn custom_model_and_base_url_are_respected() {
        let mut config = test_config(ProviderKind::Gemini);
        config.model = Some("gemini-2.5-pro".to_string());
        config.base_url = Some("http://localhost:8080/v1beta".to_string());
        let provider = GenerativeProvider::from_config(&config);
        assert_eq!(provider.model_name(), "gemini-2.5-pro");
    }
}
