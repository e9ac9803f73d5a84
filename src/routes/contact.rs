/**
 * Contact Routes
 * Public contact form and newsletter sign-up
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::ContactMessage;
use crate::error::{AppError, AppResult};
use crate::routes::{is_valid_email, required};
use crate::state::AppState;

const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct NewsletterRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterResponse {
    pub success: bool,
    pub already_subscribed: bool,
}

fn validated_email(email: &str) -> AppResult<String> {
    let email = required(email, "email")?;
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }
    Ok(email)
}

/// POST /api/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> AppResult<impl IntoResponse> {
    let name = required(&payload.name, "name")?;
    let email = validated_email(&payload.email)?;
    let message = required(&payload.message, "message")?;
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::Validation(format!(
            "message must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }

    let record = ContactMessage {
        id: Uuid::new_v4(),
        name,
        email,
        subject: payload
            .subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        message,
        created_at: Utc::now(),
    };
    state.store()?.save_contact_message(&record).await?;

    tracing::info!(message_id = %record.id, "contact message received");
    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            id: record.id,
        }),
    ))
}

/// POST /api/newsletter
///
/// 201 for a new subscriber, 200 when the address was already on the list.
pub async fn subscribe_newsletter(
    State(state): State<AppState>,
    Json(payload): Json<NewsletterRequest>,
) -> AppResult<impl IntoResponse> {
    let email = validated_email(&payload.email)?;
    let created = state.store()?.subscribe_newsletter(&email).await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(NewsletterResponse {
            success: true,
            already_subscribed: !created,
        }),
    ))
}
