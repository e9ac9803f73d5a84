//! Postgres-backed store. Campaign fields that evolve with the product are
//! kept as JSONB documents; identity and lifecycle columns stay relational.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::models::{
    Campaign, CampaignAnalytics, CampaignAssets, CampaignDetails, ContactMessage, Deployment,
    DeploymentStatus, NewUser, RefreshToken, User, UserProfile, UserSettings,
};
use super::store::{Store, StoreError, StoreResult};

pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

/// Maps unique violations to `Conflict(field)`.
fn conflict_on_unique(err: sqlx::Error, field: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(field.to_string())
        }
        _ => StoreError::Database(err),
    }
}

fn parse_column<T>(value: &str) -> StoreResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse().map_err(StoreError::Corrupt)
}

// ============================================================================
// Rows
// ============================================================================

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: Option<String>,
    external_auth_id: Option<String>,
    profile: Json<UserProfile>,
    settings: Json<UserSettings>,
    plan: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            external_auth_id: row.external_auth_id,
            profile: row.profile.0,
            settings: row.settings.0,
            plan: parse_column(&row.plan)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CampaignRow {
    id: Uuid,
    user_id: Uuid,
    status: String,
    details: Json<CampaignDetails>,
    assets: Json<CampaignAssets>,
    analytics: Json<CampaignAnalytics>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = StoreError;

    fn try_from(row: CampaignRow) -> StoreResult<Self> {
        Ok(Campaign {
            id: row.id,
            user_id: row.user_id,
            status: parse_column(&row.status)?,
            details: row.details.0,
            assets: row.assets.0,
            analytics: row.analytics.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct DeploymentRow {
    id: Uuid,
    campaign_id: Uuid,
    platform: String,
    status: String,
    scheduled_at: Option<DateTime<Utc>>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DeploymentRow> for Deployment {
    type Error = StoreError;

    fn try_from(row: DeploymentRow) -> StoreResult<Self> {
        Ok(Deployment {
            id: row.id,
            campaign_id: row.campaign_id,
            platform: row.platform,
            status: parse_column(&row.status)?,
            scheduled_at: row.scheduled_at,
            error: row.error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, external_auth_id, profile, \
                            settings, plan, created_at, updated_at";
const CAMPAIGN_COLUMNS: &str =
    "id, user_id, status, details, assets, analytics, created_at, updated_at";
const DEPLOYMENT_COLUMNS: &str =
    "id, campaign_id, platform, status, scheduled_at, error, created_at, updated_at";

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").fetch_one(self.pool.as_ref()).await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (username, email, password_hash) \
             VALUES ($1, lower(trim($2)), $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        row.try_into()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = lower(trim($1))"
        ))
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool.as_ref())
                .await?;

        row.map(User::try_from).transpose()
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            "UPDATE users SET username = $2, profile = $3, settings = $4, plan = $5, \
             updated_at = $6 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(Json(&user.profile))
        .bind(Json(&user.settings))
        .bind(user.plan.as_str())
        .bind(user.updated_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn save_refresh_token(&self, token: RefreshToken) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at, revoked) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.revoked)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| conflict_on_unique(e, "refresh token"))?;
        Ok(())
    }

    async fn find_active_refresh_token(
        &self,
        token_hash: &str,
    ) -> StoreResult<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, (Uuid, String, DateTime<Utc>, bool)>(
            "SELECT user_id, token_hash, expires_at, revoked FROM refresh_tokens \
             WHERE token_hash = $1 AND revoked = false AND expires_at > now()",
        )
        .bind(token_hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|(user_id, token_hash, expires_at, revoked)| RefreshToken {
            user_id,
            token_hash,
            expires_at,
            revoked,
        }))
    }

    async fn revoke_refresh_token(&self, token_hash: &str) -> StoreResult<()> {
        sqlx::query("UPDATE refresh_tokens SET revoked = true WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn revoke_user_refresh_tokens(&self, user_id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE refresh_tokens SET revoked = true WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO campaigns (id, user_id, status, details, assets, analytics, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(campaign.id)
        .bind(campaign.user_id)
        .bind(campaign.status.as_str())
        .bind(Json(&campaign.details))
        .bind(Json(&campaign.assets))
        .bind(Json(&campaign.analytics))
        .bind(campaign.created_at)
        .bind(campaign.updated_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn find_campaign(&self, id: Uuid) -> StoreResult<Option<Campaign>> {
        let row: Option<CampaignRow> = sqlx::query_as(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Campaign::try_from).transpose()
    }

    async fn list_campaigns(&self, user_id: Uuid) -> StoreResult<Vec<Campaign>> {
        let rows: Vec<CampaignRow> = sqlx::query_as(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE user_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(Campaign::try_from).collect()
    }

    async fn update_campaign(&self, campaign: &Campaign) -> StoreResult<()> {
        sqlx::query(
            "UPDATE campaigns SET status = $2, details = $3, assets = $4, analytics = $5, \
             updated_at = $6 WHERE id = $1",
        )
        .bind(campaign.id)
        .bind(campaign.status.as_str())
        .bind(Json(&campaign.details))
        .bind(Json(&campaign.assets))
        .bind(Json(&campaign.analytics))
        .bind(campaign.updated_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn delete_campaign(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_deployment(&self, deployment: &Deployment) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO deployments (id, campaign_id, platform, status, scheduled_at, error, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(deployment.id)
        .bind(deployment.campaign_id)
        .bind(&deployment.platform)
        .bind(deployment.status.as_str())
        .bind(deployment.scheduled_at)
        .bind(&deployment.error)
        .bind(deployment.created_at)
        .bind(deployment.updated_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn find_deployment(&self, id: Uuid) -> StoreResult<Option<Deployment>> {
        let row: Option<DeploymentRow> = sqlx::query_as(&format!(
            "SELECT {DEPLOYMENT_COLUMNS} FROM deployments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Deployment::try_from).transpose()
    }

    async fn list_deployments(&self, campaign_id: Uuid) -> StoreResult<Vec<Deployment>> {
        let rows: Vec<DeploymentRow> = sqlx::query_as(&format!(
            "SELECT {DEPLOYMENT_COLUMNS} FROM deployments WHERE campaign_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(campaign_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(Deployment::try_from).collect()
    }

    async fn update_deployment_status(
        &self,
        id: Uuid,
        status: DeploymentStatus,
        error: Option<String>,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Deployment>> {
        let row: Option<DeploymentRow> = sqlx::query_as(&format!(
            "UPDATE deployments SET status = $2, error = $3, updated_at = $4 \
             WHERE id = $1 RETURNING {DEPLOYMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(error)
        .bind(at)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Deployment::try_from).transpose()
    }

    async fn save_contact_message(&self, message: &ContactMessage) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO contact_messages (id, name, email, subject, message, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(message.id)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.subject)
        .bind(&message.message)
        .bind(message.created_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn subscribe_newsletter(&self, email: &str) -> StoreResult<bool> {
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            "INSERT INTO newsletter_subscribers (email) VALUES (lower(trim($1))) \
             ON CONFLICT (email) DO NOTHING RETURNING id",
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(inserted.is_some())
    }
}
