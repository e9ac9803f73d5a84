/**
 * Authentication Routes
 * JWT-based authentication with register, login, verify, refresh, and logout
 */
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{
    create_access_token, extract_bearer_token, generate_refresh_token, hash_refresh_token,
    verify_access_token,
};
use crate::db::models::{NewUser, RefreshToken, User};
use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::routes::{is_valid_email, required};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// User info returned to frontend
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.to_string(),
            email: user.email.clone(),
            username: Some(user.username.clone()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by register, login and refresh.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserInfo,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub is_valid: bool,
    pub user: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// bcrypt is CPU-bound; keep it off the async executor.
async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash(&password, DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

async fn password_matches(password: String, password_hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify(&password, &password_hash).unwrap_or(false))
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {e}")))
}

/// Mint an access token and persist a fresh refresh token for `user`.
async fn issue_tokens(state: &AppState, store: &dyn Store, user: &User) -> AppResult<AuthResponse> {
    let access_token = create_access_token(
        &state.config.jwt_secret,
        user.id,
        &user.email,
        state.config.access_token_minutes,
    )
    .map_err(|e| AppError::Internal(format!("failed to create access token: {e}")))?;

    let refresh_token = generate_refresh_token();
    store
        .save_refresh_token(RefreshToken {
            user_id: user.id,
            token_hash: hash_refresh_token(&refresh_token),
            expires_at: Utc::now() + Duration::days(state.config.refresh_token_days),
            revoked: false,
        })
        .await?;

    Ok(AuthResponse {
        success: true,
        user: UserInfo::from(user),
        access_token,
        refresh_token,
    })
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let username = required(&payload.username, "username")?;
    let email = required(&payload.email, "email")?;
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }
    if payload.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    let store = state.store()?;
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".to_string()));
    }

    let password_hash = hash_password(payload.password).await?;
    let user = store
        .create_user(NewUser {
            username,
            email,
            password_hash: Some(password_hash),
        })
        .await?;

    tracing::info!(user_id = %user.id, "user registered");

    let response = issue_tokens(&state, store, &user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let email = required(&payload.email, "email")?;
    if payload.password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }

    let store = state.store()?;
    let user = store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(invalid_credentials)?;

    // Accounts created through an external identity provider have no password.
    let password_hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;
    if !password_matches(payload.password, password_hash).await? {
        tracing::warn!(user_id = %user.id, "failed login attempt");
        return Err(invalid_credentials());
    }

    let response = issue_tokens(&state, store, &user).await?;
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/auth/verify
///
/// Always 200; validity is reported in the body.
pub async fn verify_token(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return Json(VerifyResponse {
            success: false,
            is_valid: false,
            user: None,
            error: Some("No token provided".to_string()),
        });
    };

    match verify_access_token(&state.config.jwt_secret, &token) {
        Ok(claims) => Json(VerifyResponse {
            success: true,
            is_valid: true,
            user: Some(UserInfo {
                user_id: claims.sub,
                email: claims.email,
                username: None,
            }),
            error: None,
        }),
        Err(_) => Json(VerifyResponse {
            success: false,
            is_valid: false,
            user: None,
            error: Some("Invalid or expired token".to_string()),
        }),
    }
}

/// POST /api/auth/refresh
///
/// Rotates the refresh token: the presented one is revoked and a new pair issued.
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<impl IntoResponse> {
    let presented = required(&payload.refresh_token, "refreshToken")?;

    let store = state.store()?;
    let token_hash = hash_refresh_token(&presented);
    let stored = store
        .find_active_refresh_token(&token_hash)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

    store.revoke_refresh_token(&token_hash).await?;

    let user = store
        .find_user(stored.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

    let response = issue_tokens(&state, store, &user).await?;
    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/auth/logout
///
/// Idempotent: always reports success.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    // The body is optional; anything unparsable counts as empty.
    let payload: LogoutRequest = serde_json::from_slice(&body).unwrap_or_default();

    if let Ok(store) = state.store() {
        if let Some(refresh_token) = payload.refresh_token.filter(|t| !t.is_empty()) {
            if let Err(e) = store
                .revoke_refresh_token(&hash_refresh_token(&refresh_token))
                .await
            {
                tracing::warn!("Failed to revoke refresh token on logout: {}", e);
            }
        }

        let access_token = extract_bearer_token(&headers).or(payload.access_token);
        let claims = access_token
            .and_then(|token| verify_access_token(&state.config.jwt_secret, &token).ok());
        if let Some(user_id) = claims.and_then(|c| uuid::Uuid::parse_str(&c.sub).ok()) {
            if let Err(e) = store.revoke_user_refresh_tokens(user_id).await {
                tracing::warn!("Failed to revoke user sessions on logout: {}", e);
            }
        }
    }

    (StatusCode::OK, Json(LogoutResponse { success: true }))
}
