use super::fallback::FallbackError;
use crate::error::AppError;
use crate::infrastructure::repositories::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum TtsServiceError {
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error(transparent)]
    Providers(#[from] FallbackError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<TtsServiceError> for AppError {
    fn from(err: TtsServiceError) -> Self {
        match err {
            TtsServiceError::Invalid(msg) => AppError::BadRequest(msg),
            TtsServiceError::Providers(FallbackError::ProviderBusy {
                provider_id,
                retry_after_secs,
                ..
            }) => AppError::ProviderWarmingUp {
                provider: provider_id,
                retry_after_secs,
            },
            TtsServiceError::Providers(err @ FallbackError::AllProvidersExhausted { .. }) => {
                let timed_out = matches!(err.last_error(), Some(ProviderError::Timeout(_)));
                let attempts = err.attempts().to_vec();
                if timed_out {
                    AppError::ProviderTimeout { attempts }
                } else {
                    AppError::ProvidersExhausted { attempts }
                }
            }
            TtsServiceError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}
