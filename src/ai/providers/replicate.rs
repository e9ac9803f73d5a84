//! Replicate predictions API for image models.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{extract_url, join_url, read_json, ImageProvider};
use crate::ai::error::AiError;
use crate::ai::types::ImageSize;
use crate::config::ProviderCredentials;

pub struct ReplicateImageProvider {
    client: Client,
    model: String,
    api_token: String,
    base_url: String,
}

impl ReplicateImageProvider {
    pub fn new(client: Client, credentials: &ProviderCredentials) -> Self {
        Self {
            client,
            model: credentials.model.clone(),
            api_token: credentials.api_key.clone(),
            base_url: credentials.base_url.clone(),
        }
    }
}

fn aspect_ratio(size: ImageSize) -> &'static str {
    match size {
        ImageSize::Square => "1:1",
        ImageSize::Portrait => "4:5",
        ImageSize::Landscape => "16:9",
    }
}

#[async_trait]
impl ImageProvider for ReplicateImageProvider {
    fn name(&self) -> &str {
        "replicate"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, size: ImageSize, seed: u64) -> Result<String, AiError> {
        let body = json!({
            "input": {
                "prompt": prompt,
                "aspect_ratio": aspect_ratio(size),
                "seed": seed,
                "num_outputs": 1,
            }
        });

        // `Prefer: wait` holds the connection until the prediction settles.
        let response = self
            .client
            .post(join_url(
                &self.base_url,
                &format!("v1/models/{}/predictions", self.model),
            ))
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::http(self.name(), e))?;

        let value = read_json(self.name(), response).await?;
        match value.get("status").and_then(Value::as_str) {
            Some("failed") | Some("canceled") => {
                let message = value
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("prediction did not succeed");
                return Err(AiError::JobFailed {
                    provider: self.name().to_string(),
                    message: message.to_string(),
                });
            }
            _ => {}
        }

        value
            .get("output")
            .and_then(extract_url)
            .ok_or_else(|| AiError::missing(self.name(), "output"))
    }
}
