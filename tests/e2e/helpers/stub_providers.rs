use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tts_relay::domain::tts::AudioFormat;
use tts_relay::infrastructure::repositories::{
    ProviderAudio, ProviderCapabilities, ProviderDescriptor, ProviderError, ProviderRequest,
    TtsRepository,
};

/// Provider with a fixed outcome that counts its calls
pub struct StubProvider {
    descriptor: ProviderDescriptor,
    outcome: Result<ProviderAudio, ProviderError>,
    delay: Duration,
    calls: AtomicUsize,
    last_request: Mutex<Option<ProviderRequest>>,
}

impl StubProvider {
    pub fn succeeding(id: &str, bytes: &[u8], format: AudioFormat) -> Arc<Self> {
        Self::build(
            id,
            Ok(ProviderAudio {
                bytes: bytes.to_vec(),
                format,
            }),
            Duration::ZERO,
        )
    }

    pub fn failing(id: &str, error: ProviderError) -> Arc<Self> {
        Self::build(id, Err(error), Duration::ZERO)
    }

    pub fn hanging(id: &str, delay: Duration) -> Arc<Self> {
        Self::build(
            id,
            Ok(ProviderAudio {
                bytes: b"late".to_vec(),
                format: AudioFormat::Mp3,
            }),
            delay,
        )
    }

    fn build(id: &str, outcome: Result<ProviderAudio, ProviderError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            descriptor: ProviderDescriptor::new(
                id,
                0,
                ProviderCapabilities {
                    supports_pitch: true,
                    supports_rate: true,
                    supports_voice_list: false,
                },
            ),
            outcome,
            delay,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request this provider was asked to synthesize
    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl TtsRepository for StubProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn synthesize(&self, request: &ProviderRequest) -> Result<ProviderAudio, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}
