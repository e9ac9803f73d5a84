/**
 * Deployment Routes
 * Records of a campaign being pushed to an ad platform
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::models::{Deployment, DeploymentStatus};
use crate::error::{AppError, AppResult};
use crate::routes::campaigns::load_owned_campaign;
use crate::state::AppState;

pub const SUPPORTED_PLATFORMS: [&str; 6] = [
    "facebook",
    "instagram",
    "google",
    "tiktok",
    "linkedin",
    "twitter",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentRequest {
    pub platform: String,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeploymentRequest {
    pub status: DeploymentStatus,
    pub error: Option<String>,
}

fn normalize_platform(platform: &str) -> AppResult<String> {
    let platform = platform.trim().to_lowercase();
    if SUPPORTED_PLATFORMS.contains(&platform.as_str()) {
        Ok(platform)
    } else {
        Err(AppError::Validation(format!(
            "Unsupported platform '{platform}'. Expected one of: {}",
            SUPPORTED_PLATFORMS.join(", ")
        )))
    }
}

/// POST /api/campaigns/{id}/deployments
pub async fn create_deployment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(campaign_id): Path<Uuid>,
    Json(payload): Json<CreateDeploymentRequest>,
) -> AppResult<impl IntoResponse> {
    let platform = normalize_platform(&payload.platform)?;

    let store = state.store()?;
    let campaign = load_owned_campaign(store, campaign_id, &user).await?;

    let now = Utc::now();
    let deployment = Deployment {
        id: Uuid::new_v4(),
        campaign_id: campaign.id,
        platform,
        status: DeploymentStatus::Scheduled,
        scheduled_at: payload.scheduled_at,
        error: None,
        created_at: now,
        updated_at: now,
    };
    store.insert_deployment(&deployment).await?;

    tracing::info!(
        deployment_id = %deployment.id,
        campaign_id = %campaign.id,
        platform = %deployment.platform,
        "deployment scheduled"
    );
    Ok((StatusCode::CREATED, Json(deployment)))
}

/// GET /api/campaigns/{id}/deployments
pub async fn list_deployments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(campaign_id): Path<Uuid>,
) -> AppResult<Json<Vec<Deployment>>> {
    let store = state.store()?;
    load_owned_campaign(store, campaign_id, &user).await?;
    Ok(Json(store.list_deployments(campaign_id).await?))
}

/// PATCH /api/deployments/{id}
pub async fn update_deployment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDeploymentRequest>,
) -> AppResult<Json<Deployment>> {
    let store = state.store()?;
    let deployment = store
        .find_deployment(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Deployment not found".to_string()))?;
    load_owned_campaign(store, deployment.campaign_id, &user).await?;

    // An error message only makes sense on a failed deployment.
    let error = match payload.status {
        DeploymentStatus::Failed => payload.error.filter(|e| !e.trim().is_empty()),
        _ => None,
    };

    let updated = store
        .update_deployment_status(id, payload.status, error, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound("Deployment not found".to_string()))?;

    tracing::info!(deployment_id = %id, status = updated.status.as_str(), "deployment updated");
    Ok(Json(updated))
}
