/**
 * AI Routes
 * Direct access to the content, image, and video generators
 */
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::ai::{
    unique_providers, ContentOptions, ContentType, GeneratedContent, GeneratedImage,
    GeneratedVideo, ImageOptions, ImageSize, VideoRequest, MAX_PARALLEL_PROVIDERS,
};
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::routes::required;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(rename = "type")]
    pub content_type: String,
    pub prompt: String,
    pub provider: Option<String>,
    #[serde(default)]
    pub options: ContentOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelGenerateRequest {
    #[serde(rename = "type")]
    pub content_type: String,
    pub prompt: String,
    #[serde(default)]
    pub providers: Vec<String>,
    pub max_results: Option<usize>,
    #[serde(default)]
    pub options: ContentOptions,
}

#[derive(Debug, Serialize)]
pub struct ParallelGenerateResponse {
    pub results: Vec<GeneratedContent>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub prompt: String,
    pub provider: Option<String>,
    pub count: Option<usize>,
    #[serde(default)]
    pub size: ImageSize,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub images: Vec<GeneratedImage>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDefaults {
    pub text_provider: String,
    pub campaign_text_provider: String,
    pub campaign_image_provider: String,
    pub campaign_image_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub text: Vec<String>,
    pub image: Vec<String>,
    pub video: Option<String>,
    pub defaults: ProviderDefaults,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/ai/generate
pub async fn generate(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<GenerateRequest>,
) -> AppResult<Json<GeneratedContent>> {
    let content_type: ContentType = payload.content_type.parse()?;
    let prompt = required(&payload.prompt, "prompt")?;
    let options = ContentOptions {
        provider: payload.provider.or(payload.options.provider.clone()),
        ..payload.options
    };

    let generated = state.ai.generate_content(content_type, &prompt, &options).await?;
    Ok(Json(generated))
}

/// POST /api/ai/generate/parallel
///
/// An empty provider list fans out to every registered text provider. Repeated
/// names are called once.
pub async fn generate_parallel(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<ParallelGenerateRequest>,
) -> AppResult<Json<ParallelGenerateResponse>> {
    let content_type: ContentType = payload.content_type.parse()?;
    let prompt = required(&payload.prompt, "prompt")?;

    let providers = if payload.providers.is_empty() {
        state.ai.text_provider_names()
    } else {
        unique_providers(&payload.providers)
    };
    if providers.len() > MAX_PARALLEL_PROVIDERS {
        return Err(AppError::Validation(format!(
            "at most {MAX_PARALLEL_PROVIDERS} distinct providers per request"
        )));
    }
    let max_results = match payload.max_results {
        Some(0) => {
            return Err(AppError::Validation(
                "maxResults must be at least 1".to_string(),
            ))
        }
        Some(n) => n,
        None => providers.len(),
    };

    let results = state
        .ai
        .generate_content_parallel(content_type, &prompt, &payload.options, &providers, max_results)
        .await;

    Ok(Json(ParallelGenerateResponse {
        count: results.len(),
        results,
    }))
}

/// POST /api/ai/image
pub async fn generate_image(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<ImageRequest>,
) -> AppResult<Json<ImageResponse>> {
    let prompt = required(&payload.prompt, "prompt")?;
    let options = ImageOptions {
        provider: payload.provider,
        count: payload.count,
        size: payload.size,
    };

    let images = state.ai.generate_image(&prompt, &options).await?;
    Ok(Json(ImageResponse {
        count: images.len(),
        images,
    }))
}

/// POST /api/ai/video
pub async fn generate_video(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(mut payload): Json<VideoRequest>,
) -> AppResult<Json<GeneratedVideo>> {
    payload.prompt = required(&payload.prompt, "prompt")?;
    let video = state.ai.generate_video(&payload).await?;
    Ok(Json(video))
}

/// GET /api/ai/providers
pub async fn list_providers(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Json<ProvidersResponse> {
    let settings = state.ai.settings();
    Json(ProvidersResponse {
        text: state.ai.text_provider_names(),
        image: state.ai.image_provider_names(),
        video: state.ai.video_provider_name(),
        defaults: ProviderDefaults {
            text_provider: settings.default_provider.clone(),
            campaign_text_provider: settings.campaign_text_provider.clone(),
            campaign_image_provider: settings.campaign_image_provider.clone(),
            campaign_image_count: settings.campaign_image_count,
        },
    })
}
