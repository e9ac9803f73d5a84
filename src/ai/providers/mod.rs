/*!
 * Provider Adapters
 * One reqwest-backed client per hosted text/image/video service
 */
pub mod anthropic;
pub mod fal;
pub mod gemini;
pub mod openai;
pub mod replicate;

use async_trait::async_trait;
use serde_json::Value;

use super::error::AiError;
use super::types::{GeneratedVideo, ImageSize, PromptPair, VideoRequest};

pub use anthropic::ClaudeProvider;
pub use fal::{FalImageProvider, FalVideoProvider};
pub use gemini::GeminiProvider;
pub use openai::OpenAiCompatibleProvider;
pub use replicate::ReplicateImageProvider;

/// Upstream error bodies are truncated to this many characters.
const MAX_ERROR_BODY: usize = 500;

#[async_trait]
pub trait TextProvider: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;
    async fn complete(&self, prompt: &PromptPair, max_tokens: u32) -> Result<String, AiError>;
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;
    /// Produce one image and return its URL.
    async fn generate(&self, prompt: &str, size: ImageSize, seed: u64) -> Result<String, AiError>;
}

#[async_trait]
pub trait VideoProvider: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;
    async fn generate(&self, request: &VideoRequest) -> Result<GeneratedVideo, AiError>;
}

/// Turn a non-2xx response into `AiError::Upstream`.
pub(crate) async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, AiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AiError::Upstream {
        provider: provider.to_string(),
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY).collect(),
    })
}

pub(crate) async fn read_json(provider: &str, response: reqwest::Response) -> Result<Value, AiError> {
    let response = ensure_success(provider, response).await?;
    response
        .json::<Value>()
        .await
        .map_err(|e| AiError::decode(provider, e))
}

/// Pull generated text out of whatever shape a provider answered with:
/// a bare string, an object carrying `content`/`text`, or an array whose
/// first usable element wins.
pub fn extract_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(extract_text),
        Value::Object(map) => ["content", "text", "output"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(extract_text),
        _ => None,
    }
}

/// First URL in a string, an array of strings, or objects carrying `url`.
pub fn extract_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.starts_with("http") || s.starts_with("data:") => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(extract_url),
        Value::Object(map) => map.get("url").and_then(extract_url),
        _ => None,
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
