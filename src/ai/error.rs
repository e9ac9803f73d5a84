use thiserror::Error;

/// Failures raised by the generator and its provider adapters.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("{provider} request failed: {source}")]
    Http {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned {status}: {body}")]
    Upstream {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} response is missing `{field}`")]
    MissingField { provider: String, field: String },

    #[error("{provider} response could not be decoded: {message}")]
    Decode { provider: String, message: String },

    #[error("{provider} job failed: {message}")]
    JobFailed { provider: String, message: String },

    #[error("{provider} produced no images")]
    NoImages { provider: String },

    #[error("{provider} job {request_id} did not finish in time")]
    Timeout { provider: String, request_id: String },
}

impl AiError {
    pub fn http(provider: &str, source: reqwest::Error) -> Self {
        AiError::Http {
            provider: provider.to_string(),
            source,
        }
    }

    pub fn missing(provider: &str, field: &str) -> Self {
        AiError::MissingField {
            provider: provider.to_string(),
            field: field.to_string(),
        }
    }

    pub fn decode(provider: &str, message: impl std::fmt::Display) -> Self {
        AiError::Decode {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    /// True for configuration problems rather than upstream failures.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AiError::UnsupportedProvider(_))
    }
}
