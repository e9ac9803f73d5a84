//! Router harness shared by the handler tests.

use std::sync::Arc;

use async_trait::async_trait;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::ai::{AiService, GenerationSettings};
use crate::auth::create_access_token;
use crate::config::{AiConfig, AppConfig};
use crate::db::models::{
    Campaign, CampaignStatus, ContactMessage, Deployment, DeploymentStatus, NewUser, RefreshToken,
    User,
};
use crate::db::{DbConfig, MemoryStore, Store, StoreError, StoreResult};
use crate::state::AppState;

pub const SECRET: &str = "route-test-secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        environment: "test".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: SECRET.to_string(),
        access_token_minutes: 15,
        refresh_token_days: 7,
        db: DbConfig {
            url: None,
            ..DbConfig::default()
        },
        ai: AiConfig::default(),
    }
}

/// Settings pointing every default at the fakes' names.
pub fn fake_settings() -> GenerationSettings {
    GenerationSettings {
        default_provider: "alpha".to_string(),
        campaign_text_provider: "alpha".to_string(),
        campaign_image_provider: "painter".to_string(),
        campaign_image_count: 2,
        max_tokens: 200,
    }
}

pub struct Harness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new(ai: AiService) -> Self {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<dyn Store> = store.clone();
        let state = AppState::new(test_config(), ai, Some(shared));
        Self { state, store }
    }

    /// State without persistence, as in production without a database.
    pub fn without_store(ai: AiService) -> AppState {
        AppState::new(test_config(), ai, None)
    }

    pub fn app(&self) -> Router {
        crate::create_app(self.state.clone())
    }

    /// Creates a user directly in the store and returns it with an access token.
    pub async fn user(&self, email: &str) -> (User, String) {
        let user = self
            .store
            .create_user(NewUser {
                username: email.split('@').next().unwrap_or("user").to_string(),
                email: email.to_string(),
                password_hash: None,
            })
            .await
            .unwrap();
        let token = token_for(user.id, &user.email);
        (user, token)
    }
}

pub fn token_for(user_id: Uuid, email: &str) -> String {
    create_access_token(SECRET, user_id, email, 15).unwrap()
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Delegates to a `MemoryStore` but refuses to save a campaign whose status is
/// `fail_on`.
pub struct FlakyStore {
    pub inner: Arc<MemoryStore>,
    pub fail_on: CampaignStatus,
}

#[async_trait]
impl Store for FlakyStore {
    fn backend(&self) -> &'static str {
        "flaky"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        self.inner.create_user(user).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.find_user(id).await
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        self.inner.update_user(user).await
    }

    async fn save_refresh_token(&self, token: RefreshToken) -> StoreResult<()> {
        self.inner.save_refresh_token(token).await
    }

    async fn find_active_refresh_token(
        &self,
        token_hash: &str,
    ) -> StoreResult<Option<RefreshToken>> {
        self.inner.find_active_refresh_token(token_hash).await
    }

    async fn revoke_refresh_token(&self, token_hash: &str) -> StoreResult<()> {
        self.inner.revoke_refresh_token(token_hash).await
    }

    async fn revoke_user_refresh_tokens(&self, user_id: Uuid) -> StoreResult<()> {
        self.inner.revoke_user_refresh_tokens(user_id).await
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> StoreResult<()> {
        self.inner.insert_campaign(campaign).await
    }

    async fn find_campaign(&self, id: Uuid) -> StoreResult<Option<Campaign>> {
        self.inner.find_campaign(id).await
    }

    async fn list_campaigns(&self, user_id: Uuid) -> StoreResult<Vec<Campaign>> {
        self.inner.list_campaigns(user_id).await
    }

    async fn update_campaign(&self, campaign: &Campaign) -> StoreResult<()> {
        if campaign.status == self.fail_on {
            return Err(StoreError::Corrupt("campaign write rejected".to_string()));
        }
        self.inner.update_campaign(campaign).await
    }

    async fn delete_campaign(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_campaign(id).await
    }

    async fn insert_deployment(&self, deployment: &Deployment) -> StoreResult<()> {
        self.inner.insert_deployment(deployment).await
    }

    async fn find_deployment(&self, id: Uuid) -> StoreResult<Option<Deployment>> {
        self.inner.find_deployment(id).await
    }

    async fn list_deployments(&self, campaign_id: Uuid) -> StoreResult<Vec<Deployment>> {
        self.inner.list_deployments(campaign_id).await
    }

    async fn update_deployment_status(
        &self,
        id: Uuid,
        status: DeploymentStatus,
        error: Option<String>,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Deployment>> {
        self.inner
            .update_deployment_status(id, status, error, at)
            .await
    }

    async fn save_contact_message(&self, message: &ContactMessage) -> StoreResult<()> {
        self.inner.save_contact_message(message).await
    }

    async fn subscribe_newsletter(&self, email: &str) -> StoreResult<bool> {
        self.inner.subscribe_newsletter(email).await
    }
}
