/*!
 * Application State
 * Shared handles injected into every handler through axum's `State`
 */
use std::sync::Arc;
use std::time::Instant;

use crate::ai::AiService;
use crate::config::AppConfig;
use crate::db::Store;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ai: Arc<AiService>,
    /// `None` when persistence is unavailable; dependent routes answer 503.
    pub store: Option<Arc<dyn Store>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, ai: AiService, store: Option<Arc<dyn Store>>) -> Self {
        Self {
            config: Arc::new(config),
            ai: Arc::new(ai),
            store,
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> Result<&dyn Store, AppError> {
        self.store
            .as_deref()
            .ok_or_else(|| AppError::ServiceUnavailable("Database not available".to_string()))
    }
}
