/**
 * User Routes
 * Profile and preference management for the signed-in user
 */
use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::db::models::{User, UserUpdate};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

async fn load_current(state: &AppState, user: &AuthUser) -> AppResult<User> {
    state
        .store()?
        .find_user(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// GET /api/users/me
pub async fn get_me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<User>> {
    Ok(Json(load_current(&state, &user).await?))
}

/// PATCH /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    if let Some(username) = &payload.username {
        if username.trim().is_empty() {
            return Err(AppError::Validation("username cannot be empty".to_string()));
        }
    }
    if let Some(website) = payload.profile.as_ref().and_then(|p| p.website.as_deref()) {
        if !website.is_empty() && !website.starts_with("http://") && !website.starts_with("https://") {
            return Err(AppError::Validation(
                "website must be an http(s) URL".to_string(),
            ));
        }
    }

    let mut current = load_current(&state, &user).await?;
    current.apply(UserUpdate {
        username: payload.username.map(|u| u.trim().to_string()),
        ..payload
    });
    state.store()?.update_user(&current).await?;

    tracing::debug!(user_id = %current.id, "profile updated");
    Ok(Json(current))
}
