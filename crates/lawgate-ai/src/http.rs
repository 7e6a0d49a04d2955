//! OpenAI-compatible `/chat/completions` client (OpenRouter by default).

use std::time::Duration;

use async_trait::async_trait;
use lawgate_core::AnalysisConfig;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::completion::{CompletionError, Reply, TextCompletion};

pub struct ChatCompletionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl ChatCompletionClient {
    /// `base_url` is the API root, e.g. `https://openrouter.ai/api/v1`.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.3,
            max_tokens: 1000,
            timeout,
        })
    }

    pub fn from_config(config: &AnalysisConfig, api_key: impl Into<String>) -> Result<Self, CompletionError> {
        let mut client = Self::new(
            &config.completion_url,
            api_key,
            config.completion_model.clone(),
            config.completion_timeout(),
        )?;
        client.temperature = config.temperature;
        client.max_tokens = config.max_tokens;
        Ok(client)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(&self, prompt: &str, context: Option<&Value>) -> Value {
        json!({
            "model": self.model,
            "messages": [{"role": "user", "content": user_message(prompt, context)}],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }
}

fn user_message(prompt: &str, context: Option<&Value>) -> String {
    match context {
        Some(ctx) => {
            let rendered = serde_json::to_string_pretty(ctx).unwrap_or_else(|_| ctx.to_string());
            format!("{prompt}\n\nContext:\n{rendered}")
        }
        None => prompt.to_string(),
    }
}

/// Pull `choices[0].message.content` out of a chat completion response.
fn message_content(body: &Value) -> Result<&str, CompletionError> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .ok_or(CompletionError::EmptyResponse)
}

#[async_trait]
impl TextCompletion for ChatCompletionClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, context: Option<&Value>) -> Result<Reply, CompletionError> {
        let url = self.endpoint();
        info!(model = %self.model, "requesting completion");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("X-Title", "Lawgate")
            .json(&self.request_body(prompt, context))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = resp.json().await.map_err(|e| self.classify(e))?;
        let content = message_content(&body)?;
        debug!(chars = content.len(), "completion received");
        Ok(Reply::from_text(content))
    }
}

impl ChatCompletionClient {
    fn classify(&self, err: reqwest::Error) -> CompletionError {
        if err.is_timeout() {
            CompletionError::Timeout(self.timeout.as_secs())
        } else {
            CompletionError::Http(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ChatCompletionClient {
        ChatCompletionClient::new(
            "https://openrouter.ai/api/v1/",
            "sk-test",
            "test-model",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        assert_eq!(client().endpoint(), "https://openrouter.ai/api/v1/chat/completions");
    }

    #[test]
    fn from_config_copies_sampling_settings() {
        let config = AnalysisConfig {
            temperature: 0.1,
            max_tokens: 200,
            ..AnalysisConfig::default()
        };
        let c = ChatCompletionClient::from_config(&config, "key").unwrap();
        assert_eq!(c.model(), "moonshotai/kimi-k2:free");
        let body = c.request_body("hi", None);
        assert_eq!(body["max_tokens"], 200);
        assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn context_is_appended_to_prompt() {
        let body = client().request_body("Analyze this", Some(&json!({"documents": ["COPPA"]})));
        let content = body["messages"][0]["content"].as_str().unwrap();
        assert!(content.starts_with("Analyze this\n\nContext:\n"));
        assert!(content.contains("COPPA"));
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn extracts_message_content() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "low risk"}}]});
        assert_eq!(message_content(&body).unwrap(), "low risk");
    }

    #[test]
    fn missing_or_blank_content_is_empty_response() {
        assert!(matches!(
            message_content(&json!({"choices": []})),
            Err(CompletionError::EmptyResponse)
        ));
        assert!(matches!(
            message_content(&json!({"choices": [{"message": {"content": "  "}}]})),
            Err(CompletionError::EmptyResponse)
        ));
    }
}
