/*!
 * Application Errors
 * One error type for every handler, rendered as `{ "error", "message"? }`
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ai::AiError;
use crate::db::StoreError;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Success response (for delete/logout)
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Ai(AiError::UnsupportedProvider(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Ai(AiError::UnsupportedType(_)) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Ai(_) | AppError::Store(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            AppError::Ai(AiError::UnsupportedProvider(_) | AiError::UnsupportedType(_)) => {
                ErrorResponse {
                    error: self.to_string(),
                    message: None,
                }
            }
            // Upstream bodies may echo prompts or keys; keep them in the logs.
            AppError::Ai(err) => ErrorResponse {
                error: "AI provider request failed".to_string(),
                message: Some(match err {
                    AiError::NoImages { .. } => "No images were generated".to_string(),
                    AiError::Timeout { .. } => "The provider did not finish in time".to_string(),
                    _ => "The provider returned an error".to_string(),
                }),
            },
            AppError::Store(StoreError::Conflict(field)) => ErrorResponse {
                error: format!("{field} already exists"),
                message: None,
            },
            AppError::Store(_) | AppError::Internal(_) => ErrorResponse {
                error: "Internal server error".to_string(),
                message: None,
            },
            _ => ErrorResponse {
                error: self.to_string(),
                message: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "{}", self);
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_unsupported_provider_is_service_unavailable() {
        let (status, json) =
            render(AiError::UnsupportedProvider("grok".to_string()).into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "unsupported provider: grok");
        assert!(json.get("message").is_none());
    }

    #[tokio::test]
    async fn test_unsupported_type_is_bad_request() {
        let (status, _) = render(AiError::UnsupportedType("poem".to_string()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upstream_error_hides_provider_body() {
        let err = AiError::Upstream {
            provider: "openai".to_string(),
            status: 401,
            body: "invalid key sk-live-123".to_string(),
        };
        let (status, json) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!json.to_string().contains("sk-live-123"));
    }

    #[tokio::test]
    async fn test_store_conflict_and_database_errors() {
        let (status, json) = render(StoreError::Conflict("email".to_string()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "email already exists");

        let (status, json) = render(StoreError::Corrupt("status".to_string()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");
    }

    #[test]
    fn test_plain_variants_map_to_expected_status() {
        assert_eq!(
            AppError::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Unauthorized("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
