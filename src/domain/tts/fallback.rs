use super::audio::AudioFormat;
use crate::infrastructure::repositories::{
    ProviderError, ProviderErrorKind, ProviderRequest, TtsRepository,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Audio produced by the first provider in the chain that succeeded
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub audio_bytes: Vec<u8>,
    pub format: AudioFormat,
    pub source_provider_id: String,
}

/// One failed provider call, kept for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct FailedAttempt {
    pub provider_id: String,
    pub kind: ProviderErrorKind,
    /// Full provider detail; logged, never sent to clients
    #[serde(skip)]
    pub error: ProviderError,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FallbackError {
    #[error("provider '{provider_id}' is warming up, retry in {retry_after_secs} seconds")]
    ProviderBusy {
        provider_id: String,
        retry_after_secs: u64,
        attempts: Vec<FailedAttempt>,
    },
    #[error("all TTS providers failed ({} attempted)", attempts.len())]
    AllProvidersExhausted { attempts: Vec<FailedAttempt> },
}

impl FallbackError {
    pub fn attempts(&self) -> &[FailedAttempt] {
        match self {
            FallbackError::ProviderBusy { attempts, .. } => attempts,
            FallbackError::AllProvidersExhausted { attempts } => attempts,
        }
    }

    /// Error of the last provider tried, the primary diagnostic
    pub fn last_error(&self) -> Option<&ProviderError> {
        self.attempts().last().map(|attempt| &attempt.error)
    }
}

/// Walks an ordered provider chain until one succeeds.
///
/// `Unavailable`, `Timeout` and `Rejected` move on to the next provider.
/// `Busy` ends the walk at once: a warming-up model needs tens of seconds and
/// the caller is better served by a retry hint than by a blocked handler.
/// Nothing is remembered between calls; every request starts at the top.
#[derive(Debug, Clone)]
pub struct FallbackOrchestrator {
    provider_timeout: Duration,
}

impl FallbackOrchestrator {
    pub fn new(provider_timeout: Duration) -> Self {
        Self { provider_timeout }
    }

    pub async fn resolve(
        &self,
        request: &ProviderRequest,
        providers: &[Arc<dyn TtsRepository>],
    ) -> Result<SynthesisResult, FallbackError> {
        let mut attempts = Vec::new();

        for provider in providers {
            let provider_id = provider.descriptor().id.clone();
            let start_time = Instant::now();

            let outcome = match tokio::time::timeout(self.provider_timeout, provider.synthesize(request)).await {
                Ok(Ok(audio)) if audio.bytes.is_empty() => {
                    Err(ProviderError::Unavailable("provider returned no audio".to_string()))
                }
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(format!(
                    "no response within {:?}",
                    self.provider_timeout
                ))),
            };

            match outcome {
                Ok(audio) => {
                    tracing::info!(
                        provider = %provider_id,
                        latency_ms = start_time.elapsed().as_millis(),
                        audio_size_bytes = audio.bytes.len(),
                        format = %audio.format,
                        failed_before = attempts.len(),
                        "TTS synthesis completed"
                    );
                    return Ok(SynthesisResult {
                        audio_bytes: audio.bytes,
                        format: audio.format,
                        source_provider_id: provider_id,
                    });
                }
                Err(ProviderError::Busy { retry_after_secs, detail }) => {
                    tracing::warn!(
                        provider = %provider_id,
                        retry_after_secs,
                        detail = %detail,
                        "Provider is warming up, asking caller to retry"
                    );
                    attempts.push(FailedAttempt {
                        provider_id: provider_id.clone(),
                        kind: ProviderErrorKind::Busy,
                        error: ProviderError::Busy {
                            retry_after_secs,
                            detail,
                        },
                    });
                    return Err(FallbackError::ProviderBusy {
                        provider_id,
                        retry_after_secs,
                        attempts,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        provider = %provider_id,
                        latency_ms = start_time.elapsed().as_millis(),
                        error = %error,
                        "Provider failed, trying next"
                    );
                    attempts.push(FailedAttempt {
                        provider_id,
                        kind: error.kind(),
                        error,
                    });
                }
            }
        }

        tracing::error!(
            attempted = attempts.len(),
            last_error = ?attempts.last().map(|a| a.error.to_string()),
            "All TTS providers failed"
        );
        Err(FallbackError::AllProvidersExhausted { attempts })
    }
}
