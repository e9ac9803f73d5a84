/**
 * Campaign Routes
 * CRUD for campaigns plus AI generation of their creative content
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::{GeneratedImage, GeneratedVideo, GenerationDiagnostics, VideoRequest};
use crate::auth::AuthUser;
use crate::db::models::{Campaign, CampaignDetails, CampaignStatus};
use crate::db::Store;
use crate::error::{AppError, AppResult, SuccessResponse};
use crate::routes::required;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    #[serde(flatten)]
    pub details: CampaignDetails,
    pub generate_content: Option<bool>,
}

/// Every field optional; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaignRequest {
    pub campaign_name: Option<String>,
    pub business_name: Option<String>,
    pub business_intro: Option<String>,
    pub campaign_goal: Option<String>,
    pub target_audience: Option<String>,
    pub budget: Option<f64>,
    pub platforms: Option<Vec<String>>,
    pub tone: Option<String>,
    pub locale: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<CampaignStatus>,
}

/// Manual edits to generated fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiContentUpdate {
    pub caption: Option<String>,
    pub ad_copy: Option<String>,
    pub hashtags: Option<Vec<String>>,
    pub image_prompt: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsDelta {
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub spend: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResponse {
    pub campaign: Campaign,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<GenerationDiagnostics>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignVideoResponse {
    pub campaign: Campaign,
    pub video: GeneratedVideo,
}

// ============================================================================
// Helpers
// ============================================================================

/// Fetch a campaign and check it belongs to `user`: 404 when absent, 403 when
/// owned by someone else. Call before reading or mutating anything.
pub(crate) async fn load_owned_campaign(
    store: &dyn Store,
    id: Uuid,
    user: &AuthUser,
) -> AppResult<Campaign> {
    let campaign = store
        .find_campaign(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))?;

    if !campaign.is_owned_by(user.id) {
        tracing::warn!(campaign_id = %id, user_id = %user.id, "campaign access denied");
        return Err(AppError::Forbidden(
            "You do not have access to this campaign".to_string(),
        ));
    }
    Ok(campaign)
}

fn validate_dates(details: &CampaignDetails) -> AppResult<()> {
    if let (Some(start), Some(end)) = (details.start_date, details.end_date) {
        if end < start {
            return Err(AppError::Validation(
                "endDate must not be before startDate".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_budget(budget: Option<f64>) -> AppResult<()> {
    match budget {
        Some(b) if !b.is_finite() || b < 0.0 => Err(AppError::Validation(
            "budget must be a non-negative number".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Run the composite generator and persist the outcome.
///
/// The campaign is stored as `generating` first so concurrent readers see the
/// job in flight. It ends `active` when anything was produced and `failed`
/// otherwise; a fully failed run leaves earlier content untouched.
async fn generate_and_store(
    state: &AppState,
    store: &dyn Store,
    campaign: &mut Campaign,
) -> AppResult<GenerationDiagnostics> {
    campaign.status = CampaignStatus::Generating;
    campaign.touch();
    store.update_campaign(campaign).await?;

    let (content, diagnostics) = state.ai.generate_campaign_content(&campaign.brief()).await;
    let before = campaign.clone();

    if content.is_empty() {
        tracing::warn!(campaign_id = %campaign.id, "campaign generation produced nothing");
        campaign.status = CampaignStatus::Failed;
        campaign.touch();
    } else {
        campaign.apply_generated(content);
        campaign.status = CampaignStatus::Active;
    }

    if let Err(e) = store.update_campaign(campaign).await {
        // Never leave the stored document stuck in `generating`.
        *campaign = before;
        campaign.status = CampaignStatus::Failed;
        campaign.touch();
        if let Err(fallback) = store.update_campaign(campaign).await {
            tracing::error!(
                campaign_id = %campaign.id,
                error = %fallback,
                "could not mark campaign as failed"
            );
        }
        return Err(e.into());
    }

    Ok(diagnostics)
}

fn first_url(images: &[GeneratedImage]) -> Option<String> {
    images.first().map(|image| image.url.clone())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/campaigns
pub async fn create_campaign(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCampaignRequest>,
) -> AppResult<impl IntoResponse> {
    let mut details = payload.details;
    details.campaign_name = required(&details.campaign_name, "campaignName")?;
    details.business_intro = required(&details.business_intro, "businessIntro")?;
    validate_budget(details.budget)?;
    validate_dates(&details)?;

    let store = state.store()?;
    let mut campaign = Campaign::new(user.id, details);
    store.insert_campaign(&campaign).await?;

    tracing::info!(campaign_id = %campaign.id, user_id = %user.id, "campaign created");

    let diagnostics = if payload.generate_content.unwrap_or(true) {
        Some(generate_and_store(&state, store, &mut campaign).await?)
    } else {
        None
    };

    Ok((
        StatusCode::CREATED,
        Json(CampaignResponse {
            campaign,
            diagnostics,
        }),
    ))
}

/// GET /api/campaigns
pub async fn list_campaigns(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Campaign>>> {
    Ok(Json(state.store()?.list_campaigns(user.id).await?))
}

/// GET /api/campaigns/{id}
pub async fn get_campaign(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Campaign>> {
    let campaign = load_owned_campaign(state.store()?, id, &user).await?;
    Ok(Json(campaign))
}

/// PUT /api/campaigns/{id}
///
/// A changed `businessIntro` triggers image regeneration. If that fails the
/// stored image fields are kept as they were.
pub async fn update_campaign(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCampaignRequest>,
) -> AppResult<Json<Campaign>> {
    let store = state.store()?;
    let mut campaign = load_owned_campaign(store, id, &user).await?;

    validate_budget(payload.budget)?;

    let intro_changed = match &payload.business_intro {
        Some(intro) => intro.trim() != campaign.details.business_intro.trim(),
        None => false,
    };

    let details = &mut campaign.details;
    if let Some(name) = payload.campaign_name {
        details.campaign_name = required(&name, "campaignName")?;
    }
    if let Some(intro) = payload.business_intro {
        details.business_intro = required(&intro, "businessIntro")?;
    }
    if payload.business_name.is_some() {
        details.business_name = payload.business_name;
    }
    if payload.campaign_goal.is_some() {
        details.campaign_goal = payload.campaign_goal;
    }
    if payload.target_audience.is_some() {
        details.target_audience = payload.target_audience;
    }
    if payload.budget.is_some() {
        details.budget = payload.budget;
    }
    if let Some(platforms) = payload.platforms {
        details.platforms = platforms;
    }
    if payload.tone.is_some() {
        details.tone = payload.tone;
    }
    if payload.locale.is_some() {
        details.locale = payload.locale;
    }
    if payload.start_date.is_some() {
        details.start_date = payload.start_date;
    }
    if payload.end_date.is_some() {
        details.end_date = payload.end_date;
    }
    validate_dates(details)?;

    if let Some(status) = payload.status {
        campaign.status = status;
    }

    if intro_changed {
        match state.ai.regenerate_campaign_image(&campaign.brief()).await {
            Ok((prompt, images)) => {
                campaign.assets.image_prompt = prompt;
                campaign.assets.image_url = first_url(&images);
                campaign.assets.generated_images = images;
            }
            Err(e) => {
                tracing::warn!(
                    campaign_id = %campaign.id,
                    stage = "image-regeneration",
                    provider = %state.ai.settings().campaign_image_provider,
                    error = %e,
                    "image regeneration failed; keeping previous image"
                );
            }
        }
    }

    campaign.touch();
    store.update_campaign(&campaign).await?;
    Ok(Json(campaign))
}

/// PATCH /api/campaigns/{id}/ai-content
pub async fn update_ai_content(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AiContentUpdate>,
) -> AppResult<Json<Campaign>> {
    let store = state.store()?;
    let mut campaign = load_owned_campaign(store, id, &user).await?;

    let assets = &mut campaign.assets;
    if let Some(caption) = payload.caption {
        assets.caption = caption;
    }
    if let Some(ad_copy) = payload.ad_copy {
        assets.ad_copy = ad_copy;
    }
    if let Some(hashtags) = payload.hashtags {
        assets.hashtags = hashtags
            .into_iter()
            .map(|tag| tag.trim().trim_start_matches('#').to_string())
            .filter(|tag| !tag.is_empty())
            .map(|tag| format!("#{tag}"))
            .collect();
    }
    if let Some(image_prompt) = payload.image_prompt {
        assets.image_prompt = image_prompt;
    }
    if let Some(image_url) = payload.image_url {
        assets.image_url = Some(image_url).filter(|url| !url.is_empty());
    }
    if let Some(video_url) = payload.video_url {
        assets.video_url = Some(video_url).filter(|url| !url.is_empty());
    }

    campaign.touch();
    store.update_campaign(&campaign).await?;
    Ok(Json(campaign))
}

/// POST /api/campaigns/{id}/generate
pub async fn generate_campaign(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CampaignResponse>> {
    let store = state.store()?;
    let mut campaign = load_owned_campaign(store, id, &user).await?;
    let diagnostics = generate_and_store(&state, store, &mut campaign).await?;

    Ok(Json(CampaignResponse {
        campaign,
        diagnostics: Some(diagnostics),
    }))
}

/// POST /api/campaigns/{id}/video
///
/// Uses the stored image prompt (or the business intro) and the current
/// image as the first frame. Provider failures are returned to the caller.
pub async fn generate_campaign_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CampaignVideoResponse>> {
    let store = state.store()?;
    let mut campaign = load_owned_campaign(store, id, &user).await?;

    let prompt = if campaign.assets.image_prompt.trim().is_empty() {
        campaign.details.business_intro.clone()
    } else {
        campaign.assets.image_prompt.clone()
    };
    let request = VideoRequest {
        prompt,
        image_url: campaign.assets.image_url.clone(),
        ..VideoRequest::default()
    };

    let video = state.ai.generate_video(&request).await?;

    campaign.assets.video_url = Some(video.url.clone());
    campaign.touch();
    store.update_campaign(&campaign).await?;

    tracing::info!(campaign_id = %campaign.id, request_id = %video.request_id, "campaign video stored");
    Ok(Json(CampaignVideoResponse { campaign, video }))
}

/// DELETE /api/campaigns/{id}
pub async fn delete_campaign(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    let store = state.store()?;
    load_owned_campaign(store, id, &user).await?;
    store.delete_campaign(id).await?;

    tracing::info!(campaign_id = %id, "campaign deleted");
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/campaigns/{id}/analytics
pub async fn record_analytics(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(delta): Json<AnalyticsDelta>,
) -> AppResult<Json<Campaign>> {
    if delta.impressions < 0
        || delta.clicks < 0
        || delta.conversions < 0
        || !delta.spend.is_finite()
        || delta.spend < 0.0
    {
        return Err(AppError::Validation(
            "analytics deltas must be non-negative".to_string(),
        ));
    }

    let store = state.store()?;
    let mut campaign = load_owned_campaign(store, id, &user).await?;

    let analytics = &mut campaign.analytics;
    analytics.impressions = analytics.impressions.saturating_add(delta.impressions);
    analytics.clicks = analytics.clicks.saturating_add(delta.clicks);
    analytics.conversions = analytics.conversions.saturating_add(delta.conversions);
    analytics.spend += delta.spend;

    campaign.touch();
    store.update_campaign(&campaign).await?;
    Ok(Json(campaign))
}

#[cfg(test)]
mod tests {
    use crate::ai::testing::{FakeImage, FakeText, FakeVideo};
    use crate::ai::AiService;
    use crate::db::models::CampaignStatus;
    use crate::db::Store;
    use crate::routes::test_support::{fake_settings, send, FlakyStore, Harness};
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn working_ai() -> AiService {
        AiService::new(fake_settings())
            .with_text_provider(FakeText::ok("alpha", "Fresh #coffee #morning"))
            .with_image_provider(FakeImage::ok("painter"))
            .with_video_provider(Arc::new(FakeVideo))
    }

    async fn create(h: &Harness, token: &str, body: Value) -> (StatusCode, Value) {
        send(h.app(), Method::POST, "/api/campaigns", Some(token), Some(body)).await
    }

    fn brief() -> Value {
        json!({
            "campaignName": "Morning Rush",
            "businessName": "Bean There",
            "businessIntro": "Neighbourhood coffee shop",
            "platforms": ["instagram"],
            "budget": 250.0
        })
    }

    #[tokio::test]
    async fn test_create_generates_content_and_activates() {
        let h = Harness::new(working_ai());
        let (_, token) = h.user("owner@example.com").await;

        let (status, body) = create(&h, &token, brief()).await;
        assert_eq!(status, StatusCode::CREATED);

        let campaign = &body["campaign"];
        assert_eq!(campaign["status"], "active");
        assert_eq!(campaign["caption"], "Fresh #coffee #morning");
        assert_eq!(campaign["hashtags"], json!(["#coffee", "#morning"]));
        assert_eq!(campaign["generatedImages"].as_array().unwrap().len(), 2);
        assert!(campaign["imageUrl"].as_str().unwrap().starts_with("https://images.test/"));
        assert_eq!(body["diagnostics"]["failures"], json!([]));
    }

    #[tokio::test]
    async fn test_create_with_failing_image_keeps_text_and_reports_stage() {
        let ai = AiService::new(fake_settings())
            .with_text_provider(FakeText::ok("alpha", "Hello"))
            .with_image_provider(FakeImage::failing("painter"));
        let h = Harness::new(ai);
        let (_, token) = h.user("owner@example.com").await;

        let (status, body) = create(&h, &token, brief()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["campaign"]["status"], "active");
        assert_eq!(body["campaign"]["caption"], "Hello");
        assert!(body["campaign"]["imageUrl"].is_null());

        let failures = body["diagnostics"]["failures"].as_array().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0]["stage"], "images");
    }

    #[tokio::test]
    async fn test_create_with_everything_failing_marks_failed() {
        let ai = AiService::new(fake_settings())
            .with_text_provider(FakeText::failing("alpha"))
            .with_image_provider(FakeImage::ok("painter"));
        let h = Harness::new(ai);
        let (_, token) = h.user("owner@example.com").await;

        let (status, body) = create(&h, &token, brief()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["campaign"]["status"], "failed");
        // Image stage is skipped without a prompt, so only the four text stages fail.
        assert_eq!(body["diagnostics"]["failures"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_create_without_generation_stays_draft() {
        let h = Harness::new(working_ai());
        let (_, token) = h.user("owner@example.com").await;

        let mut body = brief();
        body["generateContent"] = json!(false);
        let (status, body) = create(&h, &token, body).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["campaign"]["status"], "draft");
        assert!(body.get("diagnostics").is_none());
    }

    #[tokio::test]
    async fn test_create_requires_name_and_intro() {
        let h = Harness::new(working_ai());
        let (_, token) = h.user("owner@example.com").await;

        let (status, body) = create(&h, &token, json!({"campaignName": "x"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "businessIntro is required");
    }

    #[tokio::test]
    async fn test_create_rejects_negative_budget_and_inverted_dates() {
        let h = Harness::new(working_ai());
        let (_, token) = h.user("owner@example.com").await;

        let mut body = brief();
        body["budget"] = json!(-1);
        assert_eq!(create(&h, &token, body).await.0, StatusCode::BAD_REQUEST);

        let mut body = brief();
        body["startDate"] = json!("2026-06-10");
        body["endDate"] = json!("2026-06-01");
        assert_eq!(create(&h, &token, body).await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_campaign_routes_require_auth() {
        let h = Harness::new(working_ai());
        let (status, _) = send(h.app(), Method::GET, "/api/campaigns", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_returns_only_callers_campaigns() {
        let h = Harness::new(working_ai());
        let (_, alice) = h.user("alice@example.com").await;
        let (_, bob) = h.user("bob@example.com").await;

        let mut first = brief();
        first["generateContent"] = json!(false);
        create(&h, &alice, first.clone()).await;
        first["campaignName"] = json!("Second");
        create(&h, &alice, first.clone()).await;
        create(&h, &bob, first).await;

        let (status, body) = send(h.app(), Method::GET, "/api/campaigns", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = body.as_array().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["campaignName"], "Second");
    }

    #[tokio::test]
    async fn test_get_unknown_campaign_is_not_found() {
        let h = Harness::new(working_ai());
        let (_, token) = h.user("owner@example.com").await;
        let uri = format!("/api/campaigns/{}", uuid::Uuid::new_v4());
        let (status, _) = send(h.app(), Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_foreign_campaign_is_forbidden_for_every_operation() {
        let h = Harness::new(working_ai());
        let (_, owner) = h.user("owner@example.com").await;
        let (_, intruder) = h.user("intruder@example.com").await;

        let (_, created) = create(&h, &owner, brief()).await;
        let id = created["campaign"]["id"].as_str().unwrap().to_string();
        let before = h
            .store
            .find_campaign(id.parse().unwrap())
            .await
            .unwrap()
            .unwrap();

        let attempts = [
            (Method::GET, format!("/api/campaigns/{id}"), None),
            (
                Method::PUT,
                format!("/api/campaigns/{id}"),
                Some(json!({"campaignName": "Hijacked", "businessIntro": "Other"})),
            ),
            (
                Method::PATCH,
                format!("/api/campaigns/{id}/ai-content"),
                Some(json!({"caption": "pwned"})),
            ),
            (Method::POST, format!("/api/campaigns/{id}/generate"), None),
            (Method::POST, format!("/api/campaigns/{id}/video"), None),
            (
                Method::POST,
                format!("/api/campaigns/{id}/analytics"),
                Some(json!({"clicks": 5})),
            ),
            (Method::DELETE, format!("/api/campaigns/{id}"), None),
        ];

        for (method, uri, body) in attempts {
            let (status, _) = send(h.app(), method.clone(), &uri, Some(&intruder), body).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        }

        let after = h
            .store
            .find_campaign(id.parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_update_with_new_intro_regenerates_image() {
        let h = Harness::new(working_ai());
        let (_, token) = h.user("owner@example.com").await;
        let (_, created) = create(&h, &token, brief()).await;
        let id = created["campaign"]["id"].as_str().unwrap();
        let old_url = created["campaign"]["imageUrl"].clone();

        let (status, body) = send(
            h.app(),
            Method::PUT,
            &format!("/api/campaigns/{id}"),
            Some(&token),
            Some(json!({"businessIntro": "Now also a bakery"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["businessIntro"], "Now also a bakery");
        assert_ne!(body["imageUrl"], old_url);
        assert_eq!(body["generatedImages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_keeps_image_when_regeneration_fails() {
        let h = Harness::new(working_ai());
        let (user, token) = h.user("owner@example.com").await;

        // Seed a campaign that already has an image.
        let (_, created) = create(&h, &token, brief()).await;
        let id: uuid::Uuid = created["campaign"]["id"].as_str().unwrap().parse().unwrap();
        let seeded = h.store.find_campaign(id).await.unwrap().unwrap();
        assert_eq!(seeded.user_id, user.id);

        // Same store, but every image request now fails.
        let broken = AiService::new(fake_settings())
            .with_text_provider(FakeText::ok("alpha", "new prompt"))
            .with_image_provider(FakeImage::failing("painter"));
        let mut state = h.state.clone();
        state.ai = Arc::new(broken);

        let (status, body) = send(
            crate::create_app(state),
            Method::PUT,
            &format!("/api/campaigns/{id}"),
            Some(&token),
            Some(json!({"businessIntro": "Completely different business"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["businessIntro"], "Completely different business");
        assert_eq!(body["imageUrl"], json!(seeded.assets.image_url));
        assert_eq!(body["imagePrompt"], json!(seeded.assets.image_prompt));
        assert_eq!(
            body["generatedImages"].as_array().unwrap().len(),
            seeded.assets.generated_images.len()
        );
    }

    #[tokio::test]
    async fn test_generate_keeps_stored_images_when_image_stage_fails() {
        let h = Harness::new(working_ai());
        let (_, token) = h.user("owner@example.com").await;
        let (_, created) = create(&h, &token, brief()).await;
        let id: uuid::Uuid = created["campaign"]["id"].as_str().unwrap().parse().unwrap();
        let seeded = h.store.find_campaign(id).await.unwrap().unwrap();
        assert!(seeded.assets.image_url.is_some());

        let broken = AiService::new(fake_settings())
            .with_text_provider(FakeText::ok("alpha", "Second run #latte"))
            .with_image_provider(FakeImage::failing("painter"));
        let mut state = h.state.clone();
        state.ai = Arc::new(broken);

        let (status, body) = send(
            crate::create_app(state),
            Method::POST,
            &format!("/api/campaigns/{id}/generate"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["campaign"]["status"], "active");
        assert_eq!(body["campaign"]["caption"], "Second run #latte");
        assert_eq!(body["diagnostics"]["failures"][0]["stage"], "images");

        let stored = h.store.find_campaign(id).await.unwrap().unwrap();
        assert_eq!(stored.assets.image_url, seeded.assets.image_url);
        assert_eq!(stored.assets.image_prompt, seeded.assets.image_prompt);
        assert_eq!(stored.assets.generated_images, seeded.assets.generated_images);
    }

    #[tokio::test]
    async fn test_generate_marks_failed_when_final_save_fails() {
        let h = Harness::new(working_ai());
        let (_, token) = h.user("owner@example.com").await;
        let mut body = brief();
        body["generateContent"] = json!(false);
        let (_, created) = create(&h, &token, body).await;
        let id: uuid::Uuid = created["campaign"]["id"].as_str().unwrap().parse().unwrap();

        let flaky: Arc<dyn Store> = Arc::new(FlakyStore {
            inner: h.store.clone(),
            fail_on: CampaignStatus::Active,
        });
        let mut state = h.state.clone();
        state.store = Some(flaky);

        let (status, _) = send(
            crate::create_app(state),
            Method::POST,
            &format!("/api/campaigns/{id}/generate"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let stored = h.store.find_campaign(id).await.unwrap().unwrap();
        assert_eq!(stored.status, CampaignStatus::Failed);
        assert!(stored.assets.caption.is_empty());
    }

    #[tokio::test]
    async fn test_update_same_intro_does_not_regenerate() {
        let painter = FakeImage::ok("painter");
        let ai = AiService::new(fake_settings())
            .with_text_provider(FakeText::ok("alpha", "copy"))
            .with_image_provider(painter.clone());
        let h = Harness::new(ai);
        let (_, token) = h.user("owner@example.com").await;
        let (_, created) = create(&h, &token, brief()).await;
        let id = created["campaign"]["id"].as_str().unwrap();
        let calls_after_create = painter.calls();

        let (status, body) = send(
            h.app(),
            Method::PUT,
            &format!("/api/campaigns/{id}"),
            Some(&token),
            Some(json!({"businessIntro": "Neighbourhood coffee shop", "status": "completed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(painter.calls(), calls_after_create);
    }

    #[tokio::test]
    async fn test_patch_ai_content_normalizes_hashtags() {
        let h = Harness::new(working_ai());
        let (_, token) = h.user("owner@example.com").await;
        let (_, created) = create(&h, &token, brief()).await;
        let id = created["campaign"]["id"].as_str().unwrap();

        let (status, body) = send(
            h.app(),
            Method::PATCH,
            &format!("/api/campaigns/{id}/ai-content"),
            Some(&token),
            Some(json!({"caption": "Edited", "hashtags": ["latte", "#espresso", " "]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["caption"], "Edited");
        assert_eq!(body["hashtags"], json!(["#latte", "#espresso"]));
        assert_eq!(body["adCopy"], created["campaign"]["adCopy"]);
    }

    #[tokio::test]
    async fn test_generate_video_stores_url() {
        let h = Harness::new(working_ai());
        let (_, token) = h.user("owner@example.com").await;
        let (_, created) = create(&h, &token, brief()).await;
        let id = created["campaign"]["id"].as_str().unwrap();

        let (status, body) = send(
            h.app(),
            Method::POST,
            &format!("/api/campaigns/{id}/video"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["video"]["url"], "https://videos.test/clip.mp4");
        assert_eq!(body["campaign"]["videoUrl"], "https://videos.test/clip.mp4");
    }

    #[tokio::test]
    async fn test_generate_video_without_provider_is_service_unavailable() {
        let ai = AiService::new(fake_settings()).with_text_provider(FakeText::ok("alpha", "x"));
        let h = Harness::new(ai);
        let (_, token) = h.user("owner@example.com").await;
        let mut body = brief();
        body["generateContent"] = json!(false);
        let (_, created) = create(&h, &token, body).await;
        let id = created["campaign"]["id"].as_str().unwrap();

        let (status, _) = send(
            h.app(),
            Method::POST,
            &format!("/api/campaigns/{id}/video"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_regenerate_existing_campaign() {
        let h = Harness::new(working_ai());
        let (_, token) = h.user("owner@example.com").await;
        let mut body = brief();
        body["generateContent"] = json!(false);
        let (_, created) = create(&h, &token, body).await;
        let id = created["campaign"]["id"].as_str().unwrap();

        let (status, body) = send(
            h.app(),
            Method::POST,
            &format!("/api/campaigns/{id}/generate"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["campaign"]["status"], "active");
        assert!(body["diagnostics"]["failures"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analytics_accumulate_and_reject_negatives() {
        let h = Harness::new(working_ai());
        let (_, token) = h.user("owner@example.com").await;
        let mut body = brief();
        body["generateContent"] = json!(false);
        let (_, created) = create(&h, &token, body).await;
        let uri = format!(
            "/api/campaigns/{}/analytics",
            created["campaign"]["id"].as_str().unwrap()
        );

        for _ in 0..2 {
            let (status, _) = send(
                h.app(),
                Method::POST,
                &uri,
                Some(&token),
                Some(json!({"impressions": 100, "clicks": 7, "spend": 1.5})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(
            h.app(),
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({"conversions": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analytics"]["impressions"], 200);
        assert_eq!(body["analytics"]["clicks"], 14);
        assert_eq!(body["analytics"]["conversions"], 1);
        assert_eq!(body["analytics"]["spend"], 3.0);

        let (status, _) = send(
            h.app(),
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({"clicks": -3})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_campaign() {
        let h = Harness::new(working_ai());
        let (_, token) = h.user("owner@example.com").await;
        let (_, created) = create(&h, &token, brief()).await;
        let uri = format!("/api/campaigns/{}", created["campaign"]["id"].as_str().unwrap());

        let (status, body) = send(h.app(), Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _) = send(h.app(), Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
