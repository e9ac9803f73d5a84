//! Claude messages API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{extract_text, join_url, read_json, TextProvider};
use crate::ai::error::AiError;
use crate::ai::types::PromptPair;
use crate::config::ProviderCredentials;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeProvider {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl ClaudeProvider {
    pub fn new(client: Client, credentials: &ProviderCredentials) -> Self {
        Self {
            client,
            model: credentials.model.clone(),
            api_key: credentials.api_key.clone(),
            base_url: credentials.base_url.clone(),
        }
    }
}

#[async_trait]
impl TextProvider for ClaudeProvider {
    fn name(&self) -> &str {
        "claude"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &PromptPair, max_tokens: u32) -> Result<String, AiError> {
        let body = json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "system": prompt.system,
            "messages": [{ "role": "user", "content": prompt.user }],
        });

        let response = self
            .client
            .post(join_url(&self.base_url, "v1/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::http(self.name(), e))?;

        let value = read_json(self.name(), response).await?;
        let content = value
            .get("content")
            .ok_or_else(|| AiError::missing(self.name(), "content"))?;

        Ok(extract_text(content).unwrap_or_default().trim().to_string())
    }
}
