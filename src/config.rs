/*!
 * Configuration
 * Environment-driven settings, loaded once at startup and injected through AppState
 */
use std::time::Duration;

use crate::db::DbConfig;

/// Default secret; `run()` refuses to start with it in production.
pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub db: DbConfig,
    pub ai: AiConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            environment: env_or("ENVIRONMENT", "development"),
            host: env_or("HOST", "127.0.0.1"),
            port: env_parse("PORT", 3001),
            jwt_secret: env_or("JWT_SECRET", DEFAULT_JWT_SECRET),
            access_token_minutes: env_parse("ACCESS_TOKEN_MINUTES", 15),
            refresh_token_days: env_parse("REFRESH_TOKEN_DAYS", 7),
            db: DbConfig::default(),
            ai: AiConfig::from_env(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Credentials and endpoint for one hosted provider.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl ProviderCredentials {
    fn from_env(key_var: &str, model_var: &str, url_var: &str, model: &str, url: &str) -> Option<Self> {
        env_opt(key_var).map(|api_key| Self {
            api_key,
            model: env_or(model_var, model),
            base_url: env_or(url_var, url),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub default_provider: String,
    pub campaign_text_provider: String,
    pub campaign_image_provider: String,
    pub campaign_image_count: usize,
    pub max_tokens: u32,
    pub openai: Option<ProviderCredentials>,
    pub claude: Option<ProviderCredentials>,
    pub gemini: Option<ProviderCredentials>,
    pub deepseek: Option<ProviderCredentials>,
    pub mistral: Option<ProviderCredentials>,
    pub replicate: Option<ProviderCredentials>,
    pub fal: Option<FalCredentials>,
    pub image_timeout: Duration,
    pub video_poll_interval: Duration,
    pub video_max_wait: Duration,
}

/// FAL serves images synchronously and video through its queue.
#[derive(Debug, Clone)]
pub struct FalCredentials {
    pub api_key: String,
    pub image_model: String,
    pub video_model: String,
    pub base_url: String,
    pub queue_url: String,
}

impl AiConfig {
    pub fn from_env() -> Self {
        Self {
            default_provider: env_or("AI_DEFAULT_PROVIDER", "openai"),
            campaign_text_provider: env_or("AI_CAMPAIGN_TEXT_PROVIDER", "openai"),
            campaign_image_provider: env_or("AI_CAMPAIGN_IMAGE_PROVIDER", "fal"),
            campaign_image_count: env_parse("AI_CAMPAIGN_IMAGE_COUNT", 2),
            max_tokens: env_parse("AI_MAX_TOKENS", 800),
            openai: ProviderCredentials::from_env(
                "OPENAI_API_KEY",
                "OPENAI_MODEL",
                "OPENAI_BASE_URL",
                "gpt-4o-mini",
                "https://api.openai.com/v1",
            ),
            claude: ProviderCredentials::from_env(
                "ANTHROPIC_API_KEY",
                "CLAUDE_MODEL",
                "ANTHROPIC_BASE_URL",
                "claude-3-5-sonnet-latest",
                "https://api.anthropic.com",
            ),
            gemini: ProviderCredentials::from_env(
                "GEMINI_API_KEY",
                "GEMINI_MODEL",
                "GEMINI_BASE_URL",
                "gemini-1.5-flash",
                "https://generativelanguage.googleapis.com",
            ),
            deepseek: ProviderCredentials::from_env(
                "DEEPSEEK_API_KEY",
                "DEEPSEEK_MODEL",
                "DEEPSEEK_BASE_URL",
                "deepseek-chat",
                "https://api.deepseek.com/v1",
            ),
            mistral: ProviderCredentials::from_env(
                "MISTRAL_API_KEY",
                "MISTRAL_MODEL",
                "MISTRAL_BASE_URL",
                "mistral-large-latest",
                "https://api.mistral.ai/v1",
            ),
            replicate: ProviderCredentials::from_env(
                "REPLICATE_API_TOKEN",
                "REPLICATE_IMAGE_MODEL",
                "REPLICATE_BASE_URL",
                "black-forest-labs/flux-schnell",
                "https://api.replicate.com",
            ),
            fal: env_opt("FAL_KEY").map(|api_key| FalCredentials {
                api_key,
                image_model: env_or("FAL_IMAGE_MODEL", "fal-ai/flux/schnell"),
                video_model: env_or(
                    "FAL_VIDEO_MODEL",
                    "fal-ai/kling-video/v1/standard/text-to-video",
                ),
                base_url: env_or("FAL_BASE_URL", "https://fal.run"),
                queue_url: env_or("FAL_QUEUE_URL", "https://queue.fal.run"),
            }),
            image_timeout: Duration::from_secs(env_parse("AI_IMAGE_TIMEOUT_SECS", 60)),
            video_poll_interval: Duration::from_millis(env_parse(
                "AI_VIDEO_POLL_INTERVAL_MS",
                2000,
            )),
            video_max_wait: Duration::from_secs(env_parse("AI_VIDEO_MAX_WAIT_SECS", 600)),
        }
    }
}

impl Default for AiConfig {
    /// No providers registered; used by tests and as a base for overrides.
    fn default() -> Self {
        Self {
            default_provider: "openai".to_string(),
            campaign_text_provider: "openai".to_string(),
            campaign_image_provider: "fal".to_string(),
            campaign_image_count: 2,
            max_tokens: 800,
            openai: None,
            claude: None,
            gemini: None,
            deepseek: None,
            mistral: None,
            replicate: None,
            fal: None,
            image_timeout: Duration::from_secs(60),
            video_poll_interval: Duration::from_millis(2000),
            video_max_wait: Duration::from_secs(600),
        }
    }
}
