//! OpenAI-compatible chat completions (OpenAI, DeepSeek, Mistral).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{extract_text, join_url, read_json, TextProvider};
use crate::ai::error::AiError;
use crate::ai::types::PromptPair;
use crate::config::ProviderCredentials;

pub struct OpenAiCompatibleProvider {
    client: Client,
    name: String,
    model: String,
    api_key: String,
    base_url: String,
    temperature: f32,
}

impl OpenAiCompatibleProvider {
    pub fn new(client: Client, name: &str, credentials: &ProviderCredentials) -> Self {
        Self {
            client,
            name: name.to_string(),
            model: credentials.model.clone(),
            api_key: credentials.api_key.clone(),
            base_url: credentials.base_url.clone(),
            temperature: 0.7,
        }
    }
}

#[async_trait]
impl TextProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &PromptPair, max_tokens: u32) -> Result<String, AiError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "max_tokens": max_tokens,
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(join_url(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::http(&self.name, e))?;

        let value = read_json(&self.name, response).await?;
        let message = value
            .pointer("/choices/0/message/content")
            .ok_or_else(|| AiError::missing(&self.name, "choices[0].message.content"))?;

        Ok(extract_text(message).unwrap_or_default().trim().to_string())
    }
}
