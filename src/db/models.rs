//! Database Models - documents persisted by the store (used by sqlx/serde).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::{CampaignBrief, CampaignContent, GeneratedImage};

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Pro => "pro",
            SubscriptionPlan::Enterprise => "enterprise",
        }
    }
}

impl std::str::FromStr for SubscriptionPlan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionPlan::Free),
            "pro" => Ok(SubscriptionPlan::Pro),
            "enterprise" => Ok(SubscriptionPlan::Enterprise),
            other => Err(format!("unknown plan '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub website: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub preferred_provider: Option<String>,
    pub locale: Option<String>,
    pub email_notifications: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            preferred_provider: None,
            locale: None,
            email_notifications: true,
        }
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub external_auth_id: Option<String>,
    pub profile: UserProfile,
    pub settings: UserSettings,
    pub plan: SubscriptionPlan,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user for insertion
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
}

/// Partial profile update; `None` leaves the field as stored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub username: Option<String>,
    pub profile: Option<UserProfile>,
    pub settings: Option<UserSettings>,
}

impl User {
    pub fn apply(&mut self, update: UserUpdate) {
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(profile) = update.profile {
            self.profile = profile;
        }
        if let Some(settings) = update.settings {
            self.settings = settings;
        }
        self.updated_at = Utc::now();
    }
}

/// Refresh token model
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

// ============================================================================
// Campaigns
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Generating,
    Active,
    Failed,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Generating => "generating",
            CampaignStatus::Active => "active",
            CampaignStatus::Failed => "failed",
            CampaignStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "generating" => Ok(CampaignStatus::Generating),
            "active" => Ok(CampaignStatus::Active),
            "failed" => Ok(CampaignStatus::Failed),
            "completed" => Ok(CampaignStatus::Completed),
            other => Err(format!("unknown campaign status '{other}'")),
        }
    }
}

/// Free-form marketing fields supplied by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignDetails {
    pub campaign_name: String,
    pub business_name: Option<String>,
    pub business_intro: String,
    pub campaign_goal: Option<String>,
    pub target_audience: Option<String>,
    pub budget: Option<f64>,
    pub platforms: Vec<String>,
    pub tone: Option<String>,
    pub locale: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Generated content attached to a campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignAssets {
    pub caption: String,
    pub ad_copy: String,
    pub hashtags: Vec<String>,
    pub image_prompt: String,
    pub image_url: Option<String>,
    pub generated_images: Vec<GeneratedImage>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignAnalytics {
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub spend: f64,
}

/// Campaign model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: CampaignStatus,
    #[serde(flatten)]
    pub details: CampaignDetails,
    #[serde(flatten)]
    pub assets: CampaignAssets,
    pub analytics: CampaignAnalytics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(user_id: Uuid, details: CampaignDetails) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            status: CampaignStatus::Draft,
            details,
            assets: CampaignAssets::default(),
            analytics: CampaignAnalytics::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    pub fn brief(&self) -> CampaignBrief {
        CampaignBrief {
            campaign_name: self.details.campaign_name.clone(),
            business_name: self.details.business_name.clone(),
            business_intro: self.details.business_intro.clone(),
            campaign_goal: self.details.campaign_goal.clone(),
            target_audience: self.details.target_audience.clone(),
            budget: self.details.budget,
            platforms: self.details.platforms.clone(),
            tone: self.details.tone.clone(),
            locale: self.details.locale.clone(),
        }
    }

    /// Merge a generation run into the stored assets.
    ///
    /// Only fields the run produced are replaced. The image prompt, URL and
    /// gallery move together and are kept when no image came back, unless no
    /// prompt was stored yet. The video is left alone.
    pub fn apply_generated(&mut self, content: CampaignContent) {
        if !content.caption.is_empty() {
            self.assets.caption = content.caption;
        }
        if !content.ad_copy.is_empty() {
            self.assets.ad_copy = content.ad_copy;
        }
        if !content.hashtags.is_empty() {
            self.assets.hashtags = content.hashtags;
        }
        if !content.generated_images.is_empty() {
            self.assets.image_prompt = content.image_prompt;
            self.assets.image_url = Some(content.image_url)
                .filter(|url| !url.is_empty())
                .or_else(|| content.generated_images.first().map(|image| image.url.clone()));
            self.assets.generated_images = content.generated_images;
        } else if self.assets.image_prompt.is_empty() {
            self.assets.image_prompt = content.image_prompt;
        }
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ============================================================================
// Deployments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Scheduled,
    Success,
    Failed,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Scheduled => "scheduled",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for DeploymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(DeploymentStatus::Scheduled),
            "success" => Ok(DeploymentStatus::Success),
            "failed" => Ok(DeploymentStatus::Failed),
            other => Err(format!("unknown deployment status '{other}'")),
        }
    }
}

/// Deployment model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub platform: String,
    pub status: DeploymentStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Contact / Newsletter
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
