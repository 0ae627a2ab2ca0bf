use super::tts_repository::{
    ProviderAudio, ProviderCapabilities, ProviderDescriptor, ProviderError, ProviderHealth,
    ProviderRequest, TtsRepository,
};
use async_trait::async_trait;

/// Stand-in for a provider whose credentials or binaries are missing.
///
/// Keeps its place in the chain so `/status` shows it, and always fails with
/// `Rejected` so the chain moves on.
pub struct UnconfiguredTtsRepository {
    descriptor: ProviderDescriptor,
    reason: String,
}

impl UnconfiguredTtsRepository {
    pub fn new(id: &str, priority: usize, reason: impl Into<String>) -> Self {
        Self {
            descriptor: ProviderDescriptor::new(
                id,
                priority,
                ProviderCapabilities {
                    supports_pitch: false,
                    supports_rate: false,
                    supports_voice_list: false,
                },
            ),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TtsRepository for UnconfiguredTtsRepository {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn synthesize(&self, _request: &ProviderRequest) -> Result<ProviderAudio, ProviderError> {
        Err(ProviderError::Rejected(format!(
            "{} is not configured: {}",
            self.descriptor.id, self.reason
        )))
    }

    async fn health(&self) -> ProviderHealth {
        ProviderHealth::NotConfigured
    }
}
