/*!
 * AI Content Generation
 * Fans one logical request out to interchangeable text/image/video providers
 * and reconciles partial failures into normalized results
 */
pub mod error;
pub mod prompts;
pub mod providers;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use reqwest::Client;

use crate::config::AiConfig;
pub use error::AiError;
use providers::{
    ClaudeProvider, FalImageProvider, FalVideoProvider, GeminiProvider, ImageProvider,
    OpenAiCompatibleProvider, ReplicateImageProvider, TextProvider, VideoProvider,
};
pub use types::*;

/// Upper bound on images per `generate_image` call.
pub const MAX_IMAGES_PER_REQUEST: usize = 4;

/// Upper bound on distinct providers in one parallel fan-out.
pub const MAX_PARALLEL_PROVIDERS: usize = 8;

/// Provider choices and limits applied when a request does not name its own.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub default_provider: String,
    pub campaign_text_provider: String,
    pub campaign_image_provider: String,
    pub campaign_image_count: usize,
    pub max_tokens: u32,
}

impl From<&AiConfig> for GenerationSettings {
    fn from(config: &AiConfig) -> Self {
        Self {
            default_provider: config.default_provider.clone(),
            campaign_text_provider: config.campaign_text_provider.clone(),
            campaign_image_provider: config.campaign_image_provider.clone(),
            campaign_image_count: config.campaign_image_count,
            max_tokens: config.max_tokens,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::from(&AiConfig::default())
    }
}

/// Registry of provider clients, built once at startup and shared read-only.
pub struct AiService {
    text_providers: HashMap<String, Arc<dyn TextProvider>>,
    image_providers: HashMap<String, Arc<dyn ImageProvider>>,
    video_provider: Option<Arc<dyn VideoProvider>>,
    settings: GenerationSettings,
}

impl AiService {
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            text_providers: HashMap::new(),
            image_providers: HashMap::new(),
            video_provider: None,
            settings,
        }
    }

    pub fn with_text_provider(mut self, provider: Arc<dyn TextProvider>) -> Self {
        self.text_providers
            .insert(provider.name().to_string(), provider);
        self
    }

    pub fn with_image_provider(mut self, provider: Arc<dyn ImageProvider>) -> Self {
        self.image_providers
            .insert(provider.name().to_string(), provider);
        self
    }

    pub fn with_video_provider(mut self, provider: Arc<dyn VideoProvider>) -> Self {
        self.video_provider = Some(provider);
        self
    }

    /// Register every provider whose credentials are configured.
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .user_agent(concat!("campaign-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AiError::http("client", e))?;

        let mut service = Self::new(GenerationSettings::from(config));

        if let Some(creds) = &config.openai {
            service = service.with_text_provider(Arc::new(OpenAiCompatibleProvider::new(
                client.clone(),
                "openai",
                creds,
            )));
        }
        if let Some(creds) = &config.deepseek {
            service = service.with_text_provider(Arc::new(OpenAiCompatibleProvider::new(
                client.clone(),
                "deepseek",
                creds,
            )));
        }
        if let Some(creds) = &config.mistral {
            service = service.with_text_provider(Arc::new(OpenAiCompatibleProvider::new(
                client.clone(),
                "mistral",
                creds,
            )));
        }
        if let Some(creds) = &config.claude {
            service =
                service.with_text_provider(Arc::new(ClaudeProvider::new(client.clone(), creds)));
        }
        if let Some(creds) = &config.gemini {
            service =
                service.with_text_provider(Arc::new(GeminiProvider::new(client.clone(), creds)));
        }
        if let Some(creds) = &config.replicate {
            service = service
                .with_image_provider(Arc::new(ReplicateImageProvider::new(client.clone(), creds)));
        }
        if let Some(creds) = &config.fal {
            service = service
                .with_image_provider(Arc::new(FalImageProvider::new(
                    client.clone(),
                    creds,
                    config.image_timeout,
                )))
                .with_video_provider(Arc::new(FalVideoProvider::new(
                    client.clone(),
                    creds,
                    config.video_poll_interval,
                    config.video_max_wait,
                )));
        }

        tracing::info!(
            text = ?service.text_provider_names(),
            image = ?service.image_provider_names(),
            video = ?service.video_provider_name(),
            "AI providers registered"
        );

        Ok(service)
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn text_provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.text_providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn image_provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.image_providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn video_provider_name(&self) -> Option<String> {
        self.video_provider.as_ref().map(|p| p.name().to_string())
    }

    fn text_provider(&self, name: &str) -> Result<&Arc<dyn TextProvider>, AiError> {
        self.text_providers
            .get(name)
            .ok_or_else(|| AiError::UnsupportedProvider(name.to_string()))
    }

    /// Generate one piece of text with a single provider.
    pub async fn generate_content(
        &self,
        content_type: ContentType,
        prompt: &str,
        options: &ContentOptions,
    ) -> Result<GeneratedContent, AiError> {
        let provider_name = options
            .provider
            .as_deref()
            .unwrap_or(&self.settings.default_provider);
        let provider = self.text_provider(provider_name)?;
        let pair = prompts::build_prompt(content_type, prompt, options);
        let max_tokens = options.max_tokens.unwrap_or(self.settings.max_tokens);

        tracing::debug!(
            provider = provider.name(),
            content_type = %content_type,
            "generating content"
        );

        let content = provider.complete(&pair, max_tokens).await?;
        Ok(GeneratedContent {
            content,
            provider: provider.name().to_string(),
            content_type,
            model: provider.model().to_string(),
        })
    }

    /// Issue the same request to every listed provider concurrently and keep
    /// the successes, in the order the providers were listed.
    ///
    /// Never fails: when every provider errors the result is empty. Repeated
    /// names are called once, and at most `MAX_PARALLEL_PROVIDERS` are called.
    pub async fn generate_content_parallel(
        &self,
        content_type: ContentType,
        prompt: &str,
        options: &ContentOptions,
        providers: &[String],
        max_results: usize,
    ) -> Vec<GeneratedContent> {
        let mut providers = unique_providers(providers);
        if providers.len() > MAX_PARALLEL_PROVIDERS {
            tracing::warn!(
                requested = providers.len(),
                limit = MAX_PARALLEL_PROVIDERS,
                "parallel provider list truncated"
            );
            providers.truncate(MAX_PARALLEL_PROVIDERS);
        }

        let calls = providers.iter().map(|name| {
            let options = ContentOptions {
                provider: Some(name.clone()),
                ..options.clone()
            };
            async move {
                let result = self.generate_content(content_type, prompt, &options).await;
                (options.provider, result)
            }
        });

        join_all(calls)
            .await
            .into_iter()
            .filter_map(|(provider, result)| match result {
                Ok(content) => Some(content),
                Err(e) => {
                    tracing::warn!(
                        provider = provider.as_deref().unwrap_or_default(),
                        content_type = %content_type,
                        error = %e,
                        "provider failed during parallel generation"
                    );
                    None
                }
            })
            .take(max_results)
            .collect()
    }

    /// Generate `count` images concurrently, each with a fresh random seed.
    ///
    /// Sub-requests that fail or return no URL are dropped; the returned list
    /// is never empty.
    pub async fn generate_image(
        &self,
        prompt: &str,
        options: &ImageOptions,
    ) -> Result<Vec<GeneratedImage>, AiError> {
        let provider_name = options
            .provider
            .as_deref()
            .unwrap_or(&self.settings.campaign_image_provider);
        let provider = self
            .image_providers
            .get(provider_name)
            .ok_or_else(|| AiError::UnsupportedProvider(provider_name.to_string()))?;
        let count = options.count.unwrap_or(1).clamp(1, MAX_IMAGES_PER_REQUEST);

        let calls = (0..count).map(|_| {
            let seed = u64::from(rand::random::<u32>());
            provider.generate(prompt, options.size, seed)
        });

        let images: Vec<GeneratedImage> = join_all(calls)
            .await
            .into_iter()
            .filter_map(|result| match result {
                Ok(url) if !url.is_empty() => Some(GeneratedImage {
                    url,
                    provider: provider.name().to_string(),
                    model: provider.model().to_string(),
                    prompt: prompt.to_string(),
                }),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "image sub-request failed"
                    );
                    None
                }
            })
            .collect();

        if images.is_empty() {
            return Err(AiError::NoImages {
                provider: provider.name().to_string(),
            });
        }
        Ok(images)
    }

    pub async fn generate_video(&self, request: &VideoRequest) -> Result<GeneratedVideo, AiError> {
        let provider = self
            .video_provider
            .as_ref()
            .ok_or_else(|| AiError::UnsupportedProvider("video".to_string()))?;
        provider.generate(request).await
    }

    /// Produce every content field for one campaign.
    ///
    /// Stages run one after another with the campaign text provider. A failing
    /// stage leaves its field empty and is recorded in the diagnostics; this
    /// never returns an error.
    pub async fn generate_campaign_content(
        &self,
        brief: &CampaignBrief,
    ) -> (CampaignContent, GenerationDiagnostics) {
        let subject = prompts::campaign_subject(brief);
        let provider = self.settings.campaign_text_provider.clone();
        let base = campaign_options(brief, &provider);
        let mut diagnostics = GenerationDiagnostics::default();

        let caption = self
            .text_stage(ContentType::Caption, &subject, &base, &mut diagnostics)
            .await;
        let ad_copy = self
            .text_stage(ContentType::AdCopy, &subject, &base, &mut diagnostics)
            .await;
        let hashtag_options = ContentOptions {
            length: Some(ContentLength::Medium),
            ..base.clone()
        };
        let hashtags = prompts::parse_hashtags(
            &self
                .text_stage(ContentType::Hashtags, &subject, &hashtag_options, &mut diagnostics)
                .await,
        );
        let image_prompt = self
            .text_stage(ContentType::ImagePrompt, &subject, &base, &mut diagnostics)
            .await;

        let mut content = CampaignContent {
            caption,
            ad_copy,
            hashtags,
            image_prompt,
            ..CampaignContent::default()
        };

        if !content.image_prompt.is_empty() {
            let image_options = ImageOptions {
                provider: Some(self.settings.campaign_image_provider.clone()),
                count: Some(self.settings.campaign_image_count),
                size: ImageSize::Square,
            };
            match self.generate_image(&content.image_prompt, &image_options).await {
                Ok(images) => {
                    content.image_url = images
                        .first()
                        .map(|image| image.url.clone())
                        .unwrap_or_default();
                    content.generated_images = images;
                }
                Err(e) => diagnostics.record(
                    GenerationStage::Images,
                    &self.settings.campaign_image_provider,
                    &e,
                ),
            }
        }

        tracing::info!(
            campaign = %brief.campaign_name,
            failed_stages = diagnostics.failures.len(),
            images = content.generated_images.len(),
            "campaign content generated"
        );

        (content, diagnostics)
    }

    /// Write a fresh image prompt for the campaign and render images from it.
    pub async fn regenerate_campaign_image(
        &self,
        brief: &CampaignBrief,
    ) -> Result<(String, Vec<GeneratedImage>), AiError> {
        let subject = prompts::campaign_subject(brief);
        let options = campaign_options(brief, &self.settings.campaign_text_provider);
        let prompt = self
            .generate_content(ContentType::ImagePrompt, &subject, &options)
            .await?
            .content;
        if prompt.is_empty() {
            return Err(AiError::missing(
                &self.settings.campaign_text_provider,
                "content",
            ));
        }

        let image_options = ImageOptions {
            provider: Some(self.settings.campaign_image_provider.clone()),
            count: Some(self.settings.campaign_image_count),
            size: ImageSize::Square,
        };
        let images = self.generate_image(&prompt, &image_options).await?;
        Ok((prompt, images))
    }

    async fn text_stage(
        &self,
        content_type: ContentType,
        subject: &str,
        options: &ContentOptions,
        diagnostics: &mut GenerationDiagnostics,
    ) -> String {
        match self.generate_content(content_type, subject, options).await {
            Ok(generated) => generated.content,
            Err(e) => {
                let provider = options.provider.as_deref().unwrap_or_default();
                diagnostics.record(content_type.into(), provider, &e);
                String::new()
            }
        }
    }
}

/// Drop repeated provider names, keeping first-seen order.
pub fn unique_providers(providers: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(providers.len().min(MAX_PARALLEL_PROVIDERS));
    for name in providers {
        if !unique.contains(name) {
            unique.push(name.clone());
        }
    }
    unique
}

fn campaign_options(brief: &CampaignBrief, provider: &str) -> ContentOptions {
    ContentOptions {
        provider: Some(provider.to_string()),
        tone: brief.tone.clone(),
        platform: brief.platforms.first().cloned(),
        locale: brief.locale.clone(),
        audience: brief.target_audience.clone(),
        ..ContentOptions::default()
    }
}
