//! Request and result shapes shared by every provider adapter.

use serde::{Deserialize, Serialize};

use super::error::AiError;

/// Kind of text the generator is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    Caption,
    AdCopy,
    Hashtags,
    ImagePrompt,
    CampaignStrategy,
}

impl ContentType {
    pub const ALL: [ContentType; 5] = [
        ContentType::Caption,
        ContentType::AdCopy,
        ContentType::Hashtags,
        ContentType::ImagePrompt,
        ContentType::CampaignStrategy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Caption => "caption",
            ContentType::AdCopy => "ad-copy",
            ContentType::Hashtags => "hashtags",
            ContentType::ImagePrompt => "image-prompt",
            ContentType::CampaignStrategy => "campaign-strategy",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| AiError::UnsupportedType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentLength {
    Short,
    Medium,
    Long,
}

/// Per-request knobs that shape the prompt wording.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentOptions {
    pub provider: Option<String>,
    pub tone: Option<String>,
    pub platform: Option<String>,
    pub length: Option<ContentLength>,
    pub locale: Option<String>,
    pub audience: Option<String>,
    pub max_tokens: Option<u32>,
}

impl ContentOptions {
    pub fn with_provider(provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::default()
        }
    }
}

/// System/user prompt pair handed to a text provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Normalized text result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub content: String,
    pub provider: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub model: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    #[default]
    Square,
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    pub provider: Option<String>,
    pub count: Option<usize>,
    #[serde(default)]
    pub size: ImageSize,
}

/// Normalized image result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    pub provider: String,
    pub model: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequest {
    pub prompt: String,
    pub image_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<u32>,
}

/// Normalized video result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVideo {
    pub url: String,
    pub provider: String,
    pub model: String,
    pub prompt: String,
    pub duration: u32,
    pub request_id: String,
}

/// Marketing facts about one campaign, the subject of composite generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignBrief {
    pub campaign_name: String,
    pub business_name: Option<String>,
    pub business_intro: String,
    pub campaign_goal: Option<String>,
    pub target_audience: Option<String>,
    pub budget: Option<f64>,
    pub platforms: Vec<String>,
    pub tone: Option<String>,
    pub locale: Option<String>,
}

/// Output of composite generation. Every field is always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignContent {
    pub caption: String,
    pub ad_copy: String,
    pub hashtags: Vec<String>,
    pub image_prompt: String,
    pub image_url: String,
    pub generated_images: Vec<GeneratedImage>,
}

impl CampaignContent {
    pub fn is_empty(&self) -> bool {
        self.caption.is_empty()
            && self.ad_copy.is_empty()
            && self.hashtags.is_empty()
            && self.image_prompt.is_empty()
            && self.generated_images.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationStage {
    Caption,
    AdCopy,
    Hashtags,
    ImagePrompt,
    Images,
    Strategy,
}

impl From<ContentType> for GenerationStage {
    fn from(value: ContentType) -> Self {
        match value {
            ContentType::Caption => GenerationStage::Caption,
            ContentType::AdCopy => GenerationStage::AdCopy,
            ContentType::Hashtags => GenerationStage::Hashtags,
            ContentType::ImagePrompt => GenerationStage::ImagePrompt,
            ContentType::CampaignStrategy => GenerationStage::Strategy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: GenerationStage,
    pub provider: String,
    pub error: String,
}

/// Which composite stages degraded to an empty placeholder, and why.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationDiagnostics {
    pub failures: Vec<StageFailure>,
}

impl GenerationDiagnostics {
    pub fn record(&mut self, stage: GenerationStage, provider: &str, error: &AiError) {
        tracing::warn!(
            stage = ?stage,
            provider = %provider,
            error = %error,
            "content generation stage failed"
        );
        self.failures.push(StageFailure {
            stage,
            provider: provider.to_string(),
            error: error.to_string(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, stage: GenerationStage) -> bool {
        self.failures.iter().any(|f| f.stage == stage)
    }
}
