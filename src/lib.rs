//! Campaign Backend - library for app logic and testing

pub mod ai;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::ai::{AiError, AiService};
use crate::config::{AppConfig, DEFAULT_JWT_SECRET};
use crate::db::{MemoryStore, PgStore, Store};
use crate::state::AppState;

/// Reasons the server refuses to start.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("JWT_SECRET must be set to a secure, unique value in production")]
    InsecureJwtSecret,

    #[error("invalid HOST/PORT configuration: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("failed to build AI providers: {0}")]
    Ai(#[from] AiError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
/// Falls back to the local frontend dev servers.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();

    Router::new()
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/verify", post(routes::auth::verify_token))
        .route("/api/auth/refresh", post(routes::auth::refresh))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route(
            "/api/users/me",
            get(routes::users::get_me).patch(routes::users::update_me),
        )
        .route(
            "/api/campaigns",
            get(routes::campaigns::list_campaigns).post(routes::campaigns::create_campaign),
        )
        .route(
            "/api/campaigns/{id}",
            get(routes::campaigns::get_campaign)
                .put(routes::campaigns::update_campaign)
                .delete(routes::campaigns::delete_campaign),
        )
        .route(
            "/api/campaigns/{id}/ai-content",
            patch(routes::campaigns::update_ai_content),
        )
        .route(
            "/api/campaigns/{id}/generate",
            post(routes::campaigns::generate_campaign),
        )
        .route(
            "/api/campaigns/{id}/video",
            post(routes::campaigns::generate_campaign_video),
        )
        .route(
            "/api/campaigns/{id}/analytics",
            post(routes::campaigns::record_analytics),
        )
        .route(
            "/api/campaigns/{id}/deployments",
            get(routes::deployments::list_deployments)
                .post(routes::deployments::create_deployment),
        )
        .route(
            "/api/deployments/{id}",
            patch(routes::deployments::update_deployment),
        )
        .route("/api/ai/generate", post(routes::ai::generate))
        .route(
            "/api/ai/generate/parallel",
            post(routes::ai::generate_parallel),
        )
        .route("/api/ai/image", post(routes::ai::generate_image))
        .route("/api/ai/video", post(routes::ai::generate_video))
        .route("/api/ai/providers", get(routes::ai::list_providers))
        .route("/api/contact", post(routes::contact::submit_contact))
        .route("/api/newsletter", post(routes::contact::subscribe_newsletter))
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready))
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        // Global 2 MB request body cap
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
}

/// Pick the persistence backend.
///
/// Postgres when `DATABASE_URL` is set and reachable. Outside production the
/// in-memory store stands in otherwise; in production the store is absent and
/// dependent routes answer 503.
async fn connect_store(config: &AppConfig) -> Option<Arc<dyn Store>> {
    if config.db.url.is_some() {
        match db::init_pool(&config.db).await {
            Ok(pool) => {
                if let Err(e) = db::run_migrations(&pool).await {
                    tracing::error!("Failed to run database migrations: {}", e);
                }
                return Some(Arc::new(PgStore::new(pool)));
            }
            Err(e) => {
                tracing::warn!("Failed to initialize database pool: {}", e);
            }
        }
    } else {
        tracing::info!("DATABASE_URL not set.");
    }

    if config.is_production() {
        tracing::error!("Running without a database; persistence routes will return 503");
        None
    } else {
        tracing::warn!("Using the in-memory store; data is lost on restart");
        Some(Arc::new(MemoryStore::new()))
    }
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    // Guards MUST be held for the programme's lifetime; dropping them early
    // shuts down background log-writer threads and loses buffered log lines.
    let _log_guards = logging::init(&logging::LogConfig::from_env());

    let config = AppConfig::from_env();

    if config.is_production()
        && (config.jwt_secret.is_empty() || config.jwt_secret == DEFAULT_JWT_SECRET)
    {
        tracing::error!("Refusing to start with the default JWT secret in production");
        return Err(StartupError::InsecureJwtSecret);
    }

    let ai = AiService::from_config(&config.ai)?;
    if ai.text_provider_names().is_empty() {
        tracing::warn!("No text providers configured; AI routes will return 503");
    }

    let store = connect_store(&config).await;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app = create_app(AppState::new(config, ai, store));

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::GenerationSettings;
    use crate::routes::test_support::{send, Harness};
    use axum::http::{Method, StatusCode};

    #[test]
    fn test_create_app_returns_router() {
        let _app = create_app(Harness::without_store(AiService::new(
            GenerationSettings::default(),
        )));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let h = Harness::new(AiService::new(GenerationSettings::default()));
        let (status, _) = send(h.app(), Method::GET, "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_persistence_routes_without_store_are_unavailable() {
        let state = Harness::without_store(AiService::new(GenerationSettings::default()));
        let token = crate::routes::test_support::token_for(uuid::Uuid::new_v4(), "x@example.com");
        let (status, body) = send(
            create_app(state),
            Method::GET,
            "/api/campaigns",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Database not available");
    }
}
