//! Gemini generateContent API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{join_url, read_json, TextProvider};
use crate::ai::error::AiError;
use crate::ai::types::PromptPair;
use crate::config::ProviderCredentials;

pub struct GeminiProvider {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
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
impl TextProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &PromptPair, max_tokens: u32) -> Result<String, AiError> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": prompt.system }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt.user }] }],
            "generationConfig": { "maxOutputTokens": max_tokens },
        });
        let url = join_url(
            &self.base_url,
            &format!("v1beta/models/{}:generateContent", self.model),
        );

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::http(self.name(), e))?;

        let value = read_json(self.name(), response).await?;
        let parts = value
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .ok_or_else(|| AiError::missing(self.name(), "candidates[0].content.parts"))?;

        // Gemini may split one answer across several parts.
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();
        Ok(text.trim().to_string())
    }
}
