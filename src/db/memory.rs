//! In-process store used in development without `DATABASE_URL` and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Campaign, ContactMessage, Deployment, DeploymentStatus, NewUser, RefreshToken, User,
    UserProfile, UserSettings,
};
use super::store::{Store, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<String, RefreshToken>,
    campaigns: HashMap<Uuid, Campaign>,
    deployments: HashMap<Uuid, Deployment>,
    contact_messages: Vec<ContactMessage>,
    newsletter: Vec<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn contact_messages(&self) -> Vec<ContactMessage> {
        self.tables.read().await.contact_messages.clone()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let email = normalize_email(&user.email);
        if tables.users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict("email".to_string()));
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            email,
            password_hash: user.password_hash,
            external_auth_id: None,
            profile: UserProfile::default(),
            settings: UserSettings::default(),
            plan: Default::default(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        self.tables.write().await.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn save_refresh_token(&self, token: RefreshToken) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .refresh_tokens
            .insert(token.token_hash.clone(), token);
        Ok(())
    }

    async fn find_active_refresh_token(
        &self,
        token_hash: &str,
    ) -> StoreResult<Option<RefreshToken>> {
        let now = Utc::now();
        let tables = self.tables.read().await;
        Ok(tables
            .refresh_tokens
            .get(token_hash)
            .filter(|t| !t.revoked && t.expires_at > now)
            .cloned())
    }

    async fn revoke_refresh_token(&self, token_hash: &str) -> StoreResult<()> {
        if let Some(token) = self.tables.write().await.refresh_tokens.get_mut(token_hash) {
            token.revoked = true;
        }
        Ok(())
    }

    async fn revoke_user_refresh_tokens(&self, user_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        for token in tables.refresh_tokens.values_mut() {
            if token.user_id == user_id {
                token.revoked = true;
            }
        }
        Ok(())
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .campaigns
            .insert(campaign.id, campaign.clone());
        Ok(())
    }

    async fn find_campaign(&self, id: Uuid) -> StoreResult<Option<Campaign>> {
        Ok(self.tables.read().await.campaigns.get(&id).cloned())
    }

    async fn list_campaigns(&self, user_id: Uuid) -> StoreResult<Vec<Campaign>> {
        let tables = self.tables.read().await;
        let mut campaigns: Vec<Campaign> = tables
            .campaigns
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(campaigns)
    }

    async fn update_campaign(&self, campaign: &Campaign) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .campaigns
            .insert(campaign.id, campaign.clone());
        Ok(())
    }

    async fn delete_campaign(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.campaigns.remove(&id).is_some();
        tables.deployments.retain(|_, d| d.campaign_id != id);
        Ok(removed)
    }

    async fn insert_deployment(&self, deployment: &Deployment) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .deployments
            .insert(deployment.id, deployment.clone());
        Ok(())
    }

    async fn find_deployment(&self, id: Uuid) -> StoreResult<Option<Deployment>> {
        Ok(self.tables.read().await.deployments.get(&id).cloned())
    }

    async fn list_deployments(&self, campaign_id: Uuid) -> StoreResult<Vec<Deployment>> {
        let tables = self.tables.read().await;
        let mut deployments: Vec<Deployment> = tables
            .deployments
            .values()
            .filter(|d| d.campaign_id == campaign_id)
            .cloned()
            .collect();
        deployments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(deployments)
    }

    async fn update_deployment_status(
        &self,
        id: Uuid,
        status: DeploymentStatus,
        error: Option<String>,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<Deployment>> {
        let mut tables = self.tables.write().await;
        Ok(tables.deployments.get_mut(&id).map(|deployment| {
            deployment.status = status;
            deployment.error = error;
            deployment.updated_at = at;
            deployment.clone()
        }))
    }

    async fn save_contact_message(&self, message: &ContactMessage) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .contact_messages
            .push(message.clone());
        Ok(())
    }

    async fn subscribe_newsletter(&self, email: &str) -> StoreResult<bool> {
        let email = normalize_email(email);
        let mut tables = self.tables.write().await;
        if tables.newsletter.contains(&email) {
            return Ok(false);
        }
        tables.newsletter.push(email);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::CampaignDetails;
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "ana".to_string(),
            email: email.to_string(),
            password_hash: Some("hash".to_string()),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict_case_insensitive() {
        let store = MemoryStore::new();
        store.create_user(new_user("Ana@Example.com")).await.unwrap();
        let err = store
            .create_user(new_user("ana@example.com "))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(field) if field == "email"));
    }

    #[tokio::test]
    async fn test_refresh_token_lookup_ignores_revoked_and_expired() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@b.co")).await.unwrap();

        store
            .save_refresh_token(RefreshToken {
                user_id: user.id,
                token_hash: "live".to_string(),
                expires_at: Utc::now() + Duration::days(1),
                revoked: false,
            })
            .await
            .unwrap();
        store
            .save_refresh_token(RefreshToken {
                user_id: user.id,
                token_hash: "stale".to_string(),
                expires_at: Utc::now() - Duration::minutes(1),
                revoked: false,
            })
            .await
            .unwrap();

        assert!(store.find_active_refresh_token("live").await.unwrap().is_some());
        assert!(store.find_active_refresh_token("stale").await.unwrap().is_none());

        store.revoke_refresh_token("live").await.unwrap();
        assert!(store.find_active_refresh_token("live").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_campaigns_newest_first_and_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        let mut older = Campaign::new(owner, CampaignDetails::default());
        older.created_at = Utc::now() - Duration::hours(1);
        let newer = Campaign::new(owner, CampaignDetails::default());
        let foreign = Campaign::new(Uuid::new_v4(), CampaignDetails::default());

        for c in [&older, &newer, &foreign] {
            store.insert_campaign(c).await.unwrap();
        }

        let listed = store.list_campaigns(owner).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }

    #[tokio::test]
    async fn test_delete_campaign_cascades_to_deployments() {
        let store = MemoryStore::new();
        let campaign = Campaign::new(Uuid::new_v4(), CampaignDetails::default());
        store.insert_campaign(&campaign).await.unwrap();

        let now = Utc::now();
        let deployment = Deployment {
            id: Uuid::new_v4(),
            campaign_id: campaign.id,
            platform: "facebook".to_string(),
            status: DeploymentStatus::Scheduled,
            scheduled_at: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        store.insert_deployment(&deployment).await.unwrap();

        assert!(store.delete_campaign(campaign.id).await.unwrap());
        assert!(store.find_deployment(deployment.id).await.unwrap().is_none());
        assert!(!store.delete_campaign(campaign.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_newsletter_reports_new_subscriptions_once() {
        let store = MemoryStore::new();
        assert!(store.subscribe_newsletter("x@y.io").await.unwrap());
        assert!(!store.subscribe_newsletter("X@Y.io").await.unwrap());
    }
}
