//! Groq chat-completion client (OpenAI-compatible API).
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::{ChatModel, ChatOptions, LlmError, Message, Role};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com";

pub struct GroqChat {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GroqChat {
    pub fn new(api_key: &str, base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing Groq API key");
        anyhow::ensure!(!model.trim().is_empty(), "missing chat model name");

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Groq HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the request body for the chat completions endpoint.
    fn build_request_body(&self, messages: &[Message], options: &ChatOptions) -> serde_json::Value {
        let api_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::System => "system",
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    "content": m.content,
                })
            })
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });

        if options.json_object {
            body["response_format"] = json!({ "type": "json_object" });
        }

        body
    }
}

#[async_trait]
impl ChatModel for GroqChat {
    async fn complete(
        &self,
        messages: Vec<Message>,
        options: ChatOptions,
    ) -> Result<String, LlmError> {
        let url = format!("{}/openai/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&messages, &options);

        debug!("chat completion via {} (json={})", self.model, options.json_object);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: serde_json::Value = response.json().await?;
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing choices[0].message.content".into()))?
            .to_string();

        Ok(content)
    }
}
