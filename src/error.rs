use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::tts::FailedAttempt;

/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded: maximum {limit} requests per hour")]
    RateLimitExceeded { limit: usize, retry_after_secs: u64 },

    #[error("TTS provider '{provider}' is warming up, retry in {retry_after_secs} seconds")]
    ProviderWarmingUp {
        provider: String,
        retry_after_secs: u64,
    },

    #[error("All TTS providers failed, please try again later")]
    ProvidersExhausted { attempts: Vec<FailedAttempt> },

    #[error("TTS provider timed out, please try again later")]
    ProviderTimeout { attempts: Vec<FailedAttempt> },

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error body: `error` is always present, the rest only when it helps the caller
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub try_again: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Vec<AttemptSummary>>,
}

/// Provider id and failure class only; provider messages stay in the logs
#[derive(Debug, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub provider: String,
    pub kind: String,
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ProviderWarmingUp { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::ProviderTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::ProvidersExhausted { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimitExceeded { retry_after_secs, .. }
            | Self::ProviderWarmingUp { retry_after_secs, .. } => Some(*retry_after_secs),
            _ => None,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let retry_after_seconds = self.retry_after_secs();
        let try_again = retry_after_seconds.map(|secs| match self {
            Self::RateLimitExceeded { .. } => {
                format!("Please wait {} minutes", secs.div_ceil(60))
            }
            _ => format!("Please retry in {} seconds", secs),
        });

        let (provider, attempts) = match self {
            Self::ProviderWarmingUp { provider, .. } => (Some(provider.clone()), None),
            Self::ProvidersExhausted { attempts } | Self::ProviderTimeout { attempts } => {
                let summaries = attempts
                    .iter()
                    .map(|attempt| AttemptSummary {
                        provider: attempt.provider_id.clone(),
                        kind: attempt.kind.as_str().to_string(),
                    })
                    .collect();
                (None, Some(summaries))
            }
            _ => (None, None),
        };

        ErrorResponse {
            error: self.to_string(),
            retry_after_seconds,
            try_again,
            provider,
            attempts,
        }
    }
}

/// Implement IntoResponse for automatic conversion in handlers
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, status = %status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = %status.as_u16(), "Request rejected");
        }

        let mut response = (status, Json(self.to_response())).into_response();
        if let Some(secs) = self.retry_after_secs() {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;
