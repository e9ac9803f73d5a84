//! Persistence port shared by the Postgres and in-memory backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    Campaign, ContactMessage, Deployment, DeploymentStatus, NewUser, RefreshToken, User,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness rule was violated; carries the offending field.
    #[error("{0} already exists")]
    Conflict(String),

    #[error("stored record is corrupt: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Backend name reported by health checks.
    fn backend(&self) -> &'static str;

    /// Round-trip to the backing service.
    async fn ping(&self) -> StoreResult<()>;

    // users
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn update_user(&self, user: &User) -> StoreResult<()>;

    // refresh tokens
    async fn save_refresh_token(&self, token: RefreshToken) -> StoreResult<()>;
    /// Returns the token only if it is unrevoked and unexpired.
    async fn find_active_refresh_token(&self, token_hash: &str)
        -> StoreResult<Option<RefreshToken>>;
    async fn revoke_refresh_token(&self, token_hash: &str) -> StoreResult<()>;
    async fn revoke_user_refresh_tokens(&self, user_id: Uuid) -> StoreResult<()>;

    // campaigns
    async fn insert_campaign(&self, campaign: &Campaign) -> StoreResult<()>;
    async fn find_campaign(&self, id: Uuid) -> StoreResult<Option<Campaign>>;
    /// Newest first.
    async fn list_campaigns(&self, user_id: Uuid) -> StoreResult<Vec<Campaign>>;
    async fn update_campaign(&self, campaign: &Campaign) -> StoreResult<()>;
    /// Removes the campaign and its deployments.
    async fn delete_campaign(&self, id: Uuid) -> StoreResult<bool>;

    // deployments
    async fn insert_deployment(&self, deployment: &Deployment) -> StoreResult<()>;
    async fn find_deployment(&self, id: Uuid) -> StoreResult<Option<Deployment>>;
    /// Newest first.
    async fn list_deployments(&self, campaign_id: Uuid) -> StoreResult<Vec<Deployment>>;
    async fn update_deployment_status(
        &self,
        id: Uuid,
        status: DeploymentStatus,
        error: Option<String>,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Deployment>>;

    // contact / newsletter
    async fn save_contact_message(&self, message: &ContactMessage) -> StoreResult<()>;
    /// Returns `true` when the address was not subscribed before.
    async fn subscribe_newsletter(&self, email: &str) -> StoreResult<bool>;
}
