/**
 * Health Routes
 * Endpoints for checking backend health status
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::state::AppState;

/// Single service check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Registered provider names
#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub text: Vec<String>,
    pub image: Vec<String>,
    pub video: Option<String>,
}

/// Detailed health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub checks: HealthChecks,
    pub providers: ProviderSummary,
}

/// Health checks for all services
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub database: ServiceCheck,
}

/// Ready check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

async fn check_store(state: &AppState) -> ServiceCheck {
    let Some(store) = state.store.as_ref() else {
        return ServiceCheck {
            status: "unhealthy".to_string(),
            backend: None,
            response_time: None,
            error: Some("Database not configured".to_string()),
        };
    };

    let start = Instant::now();
    match store.ping().await {
        Ok(()) => ServiceCheck {
            status: "healthy".to_string(),
            backend: Some(store.backend().to_string()),
            response_time: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => ServiceCheck {
            status: "unhealthy".to_string(),
            backend: Some(store.backend().to_string()),
            response_time: None,
            error: Some(e.to_string()),
        },
    }
}

/// GET /health - Simple health ping
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/detailed - Detailed health with all checks
pub async fn health_detailed(State(state): State<AppState>) -> impl IntoResponse {
    let database = check_store(&state).await;

    // Overall status stays "ok" so the frontend knows the backend is up.
    let response = DetailedHealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs(),
        checks: HealthChecks { database },
        providers: ProviderSummary {
            text: state.ai.text_provider_names(),
            image: state.ai.image_provider_names(),
            video: state.ai.video_provider_name(),
        },
    };

    (StatusCode::OK, Json(response))
}

/// GET /health/database - Database health check
pub async fn health_database(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(check_store(&state).await))
}

/// GET /health/ready - Readiness check
///
/// Always 200; the frontend reads `status` to decide what to show.
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let reason = match state.store.as_ref() {
        None => Some("Database not configured".to_string()),
        Some(store) => store
            .ping()
            .await
            .err()
            .map(|e| format!("Database not reachable: {e}")),
    };

    let response = ReadyResponse {
        status: if reason.is_none() {
            "ready".to_string()
        } else {
            "not ready".to_string()
        },
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs(),
        reason,
    };

    (StatusCode::OK, Json(response))
}
