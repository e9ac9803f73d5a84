//! Logging settings resolved from the environment before the subscriber starts.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub production: bool,
    pub level: String,
    pub directory: String,
}

impl LogConfig {
    pub fn from_env() -> Self {
        let production = std::env::var("ENVIRONMENT")
            .map(|env| env == "production")
            .unwrap_or(false);
        Self::new(
            production,
            std::env::var("LOG_LEVEL").ok(),
            std::env::var("LOG_DIR").ok(),
        )
    }

    pub fn new(production: bool, level: Option<String>, directory: Option<String>) -> Self {
        let level = level
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| if production { "info" } else { "debug" }.to_string());
        Self {
            production,
            level,
            directory: directory
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| "logs".to_string()),
        }
    }

    /// Directive used when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> String {
        format!(
            "campaign_backend={},tower_http=debug,axum=debug",
            self.level
        )
    }
}
