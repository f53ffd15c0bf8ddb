//! OpenAI-compatible chat completion client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::CompletionClient;
use crate::config::AppConfig;
use crate::errors::FloraRagError;
use crate::errors::Result;

/// Client for OpenAI-compatible `/chat/completions` endpoints (OpenAI,
/// Ollama's OpenAI shim, most gateways).
pub struct ChatCompletionClient {
    endpoint: String,
    api_key: String,
    model: String,
    client: Client,
}

impl ChatCompletionClient {
    /// Create a new completion client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(
        endpoint: String,
        api_key: String,
        model: String,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FloraRagError::Http(e.to_string()))?;

        Ok(Self {
            endpoint,
            api_key,
            model,
            client,
        })
    }

    /// Create a client from application configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.llm_endpoint().to_string(),
            config.llm_key().to_string(),
            config.llm_model().to_string(),
            std::time::Duration::from_secs(config.llm.timeout_secs),
        )
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(
        &self,
        system_instructions: &str,
        user_prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling chat completions API: {} ({})", url, self.model);

        let request_body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_instructions },
                { "role": "user", "content": user_prompt }
            ],
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| FloraRagError::ModelCall(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FloraRagError::ModelCall(format!(
                "Completion API error ({status}): {error_text}"
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| FloraRagError::ModelCall(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| FloraRagError::ModelCall("No response from model".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_deserialization() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("hello")
        );
    }

    #[tokio::test]
    #[ignore = "Requires API key"]
    async fn test_completion_round_trip() {
        let client = ChatCompletionClient::new(
            "https://api.openai.com/v1".to_string(),
            std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            "gpt-3.5-turbo".to_string(),
            std::time::Duration::from_secs(60),
        )
        .unwrap();

        let answer = client
            .complete("You are a florist.", "Say hello.", 0.7, 50)
            .await
            .unwrap();
        assert!(!answer.is_empty());
    }
}
