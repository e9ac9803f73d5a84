//! FAL: synchronous image endpoint and queued video jobs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{extract_url, join_url, read_json, ImageProvider, VideoProvider};
use crate::ai::error::AiError;
use crate::ai::types::{GeneratedVideo, ImageSize, VideoRequest};
use crate::config::FalCredentials;

const DEFAULT_VIDEO_SECONDS: u32 = 5;

fn auth_value(api_key: &str) -> String {
    format!("Key {api_key}")
}

fn image_size(size: ImageSize) -> &'static str {
    match size {
        ImageSize::Square => "square_hd",
        ImageSize::Portrait => "portrait_4_3",
        ImageSize::Landscape => "landscape_16_9",
    }
}

pub struct FalImageProvider {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl FalImageProvider {
    pub fn new(client: Client, credentials: &FalCredentials, timeout: Duration) -> Self {
        Self {
            client,
            model: credentials.image_model.clone(),
            api_key: credentials.api_key.clone(),
            base_url: credentials.base_url.clone(),
            timeout,
        }
    }
}

#[async_trait]
impl ImageProvider for FalImageProvider {
    fn name(&self) -> &str {
        "fal"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, size: ImageSize, seed: u64) -> Result<String, AiError> {
        let body = json!({
            "prompt": prompt,
            "image_size": image_size(size),
            "seed": seed,
            "num_images": 1,
            "enable_safety_checker": true,
        });

        let response = self
            .client
            .post(join_url(&self.base_url, &self.model))
            .header(reqwest::header::AUTHORIZATION, auth_value(&self.api_key))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::http(self.name(), e))?;

        let value = read_json(self.name(), response).await?;
        value
            .get("images")
            .and_then(extract_url)
            .ok_or_else(|| AiError::missing(self.name(), "images[0].url"))
    }
}

#[derive(Debug, Deserialize)]
struct QueueSubmission {
    request_id: String,
    status_url: Option<String>,
    response_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueueStatus {
    status: String,
    #[serde(default)]
    error: Option<String>,
}

pub struct FalVideoProvider {
    client: Client,
    model: String,
    api_key: String,
    queue_url: String,
    poll_interval: Duration,
    max_wait: Duration,
}

impl FalVideoProvider {
    pub fn new(
        client: Client,
        credentials: &FalCredentials,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Self {
        Self {
            client,
            model: credentials.video_model.clone(),
            api_key: credentials.api_key.clone(),
            queue_url: credentials.queue_url.clone(),
            poll_interval,
            max_wait,
        }
    }

    async fn submit(&self, request: &VideoRequest, duration: u32) -> Result<QueueSubmission, AiError> {
        let mut body = json!({
            "prompt": request.prompt,
            "duration": duration.to_string(),
        });
        if let Some(ratio) = aspect_ratio(request.width, request.height) {
            body["aspect_ratio"] = json!(ratio);
        }
        if let Some(image_url) = request.image_url.as_deref().filter(|u| !u.is_empty()) {
            body["image_url"] = json!(image_url);
        }

        let response = self
            .client
            .post(join_url(&self.queue_url, &self.model))
            .header(reqwest::header::AUTHORIZATION, auth_value(&self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::http(self.name(), e))?;

        let value = read_json(self.name(), response).await?;
        serde_json::from_value(value).map_err(|e| AiError::decode(self.name(), e))
    }

    async fn get_json(&self, url: &str) -> Result<Value, AiError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, auth_value(&self.api_key))
            .send()
            .await
            .map_err(|e| AiError::http(self.name(), e))?;
        read_json(self.name(), response).await
    }

    /// Poll the job until it completes, fails or exceeds `max_wait`.
    async fn wait_for_completion(&self, request_id: &str, status_url: &str) -> Result<(), AiError> {
        let deadline = tokio::time::Instant::now() + self.max_wait;
        loop {
            let value = self.get_json(status_url).await?;
            let QueueStatus { status, error } =
                serde_json::from_value(value).map_err(|e| AiError::decode(self.name(), e))?;

            tracing::debug!(
                provider = self.name(),
                request_id = %request_id,
                status = %status,
                "video job status"
            );

            match status.as_str() {
                "COMPLETED" => {
                    if let Some(error) = error.filter(|e| !e.is_empty()) {
                        return Err(AiError::JobFailed {
                            provider: self.name().to_string(),
                            message: error,
                        });
                    }
                    return Ok(());
                }
                "FAILED" | "ERROR" | "CANCELLED" => {
                    return Err(AiError::JobFailed {
                        provider: self.name().to_string(),
                        message: error.unwrap_or_else(|| status.clone()),
                    });
                }
                _ => {}
            }

            if tokio::time::Instant::now() + self.poll_interval > deadline {
                return Err(AiError::Timeout {
                    provider: self.name().to_string(),
                    request_id: request_id.to_string(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn aspect_ratio(width: Option<u32>, height: Option<u32>) -> Option<&'static str> {
    match (width, height) {
        (Some(w), Some(h)) if w > h => Some("16:9"),
        (Some(w), Some(h)) if w < h => Some("9:16"),
        (Some(_), Some(_)) => Some("1:1"),
        _ => None,
    }
}

#[async_trait]
impl VideoProvider for FalVideoProvider {
    fn name(&self) -> &str {
        "fal"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &VideoRequest) -> Result<GeneratedVideo, AiError> {
        let duration = request.duration.unwrap_or(DEFAULT_VIDEO_SECONDS);
        let submission = self.submit(request, duration).await?;
        let request_base = join_url(
            &self.queue_url,
            &format!("{}/requests/{}", self.model, submission.request_id),
        );
        let status_url = submission
            .status_url
            .unwrap_or_else(|| format!("{request_base}/status"));
        let response_url = submission.response_url.unwrap_or(request_base);

        tracing::info!(
            provider = self.name(),
            request_id = %submission.request_id,
            "video job submitted"
        );

        self.wait_for_completion(&submission.request_id, &status_url)
            .await?;

        let result = self.get_json(&response_url).await?;
        let url = result
            .pointer("/video/url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AiError::missing(self.name(), "video.url"))?;

        Ok(GeneratedVideo {
            url: url.to_string(),
            provider: self.name().to_string(),
            model: self.model.clone(),
            prompt: request.prompt.clone(),
            duration,
            request_id: submission.request_id,
        })
    }
}
