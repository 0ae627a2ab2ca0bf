use super::http_audio::{map_reqwest_error, read_audio};
use super::tts_repository::{
    ProviderAudio, ProviderCapabilities, ProviderDescriptor, ProviderError, ProviderHealth,
    ProviderRequest, TtsRepository,
};
use crate::domain::tts::AudioFormat;
use crate::infrastructure::process::{ManagedProcess, ProcessState};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

pub const PROVIDER_ID: &str = "piper";

#[derive(Debug, Serialize)]
struct PiperRequest<'a> {
    text: &'a str,
    voice: &'a str,
    length_scale: f32,
}

/// Local Piper HTTP server run as a supervised child process
pub struct PiperTtsRepository {
    http: reqwest::Client,
    base_url: String,
    process: Option<Arc<ManagedProcess>>,
    descriptor: ProviderDescriptor,
}

impl PiperTtsRepository {
    /// `process` is `None` when the server is managed outside this service
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        process: Option<Arc<ManagedProcess>>,
        priority: usize,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            process,
            descriptor: ProviderDescriptor::new(
                PROVIDER_ID,
                priority,
                ProviderCapabilities {
                    supports_pitch: false,
                    supports_rate: true,
                    supports_voice_list: true,
                },
            ),
        }
    }

    async fn ensure_ready(&self) -> Result<(), ProviderError> {
        let Some(process) = &self.process else {
            return Ok(());
        };

        let name = process.name();
        match process.health_check().await {
            ProcessState::Ready => Ok(()),
            ProcessState::Provisioning { retry_after_secs } => Err(ProviderError::Busy {
                retry_after_secs,
                detail: format!("{} is downloading its voice model", name),
            }),
            ProcessState::Starting { retry_after_secs } => Err(ProviderError::Busy {
                retry_after_secs,
                detail: format!("{} server is starting", name),
            }),
            ProcessState::NotStarted => {
                Err(ProviderError::Unavailable(format!("{} server is not running", name)))
            }
            ProcessState::Unresponsive => {
                Err(ProviderError::Unavailable(format!("{} server is not answering", name)))
            }
            ProcessState::Failed(reason) => {
                Err(ProviderError::Unavailable(format!("{} could not be started: {}", name, reason)))
            }
            ProcessState::Exited(status) => {
                Err(ProviderError::Unavailable(format!("{} server exited ({})", name, status)))
            }
        }
    }
}

#[async_trait]
impl TtsRepository for PiperTtsRepository {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn synthesize(&self, request: &ProviderRequest) -> Result<ProviderAudio, ProviderError> {
        let voice = request.voice_for(PROVIDER_ID)?;
        self.ensure_ready().await?;

        let text = request.plain_text();
        let payload = PiperRequest {
            text: &text,
            voice,
            length_scale: length_scale_for_rate(request.rate),
        };

        let response = self
            .http
            .post(format!("{}/", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| map_reqwest_error(PROVIDER_ID, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = format!("HTTP {}: {}", status.as_u16(), body.chars().take(200).collect::<String>());
            return Err(if status.is_server_error() {
                ProviderError::Unavailable(detail)
            } else {
                ProviderError::Rejected(detail)
            });
        }

        read_audio(PROVIDER_ID, response, AudioFormat::Wav).await
    }

    async fn health(&self) -> ProviderHealth {
        match self.ensure_ready().await {
            Ok(()) => ProviderHealth::Ready,
            Err(ProviderError::Busy { .. }) => ProviderHealth::Starting,
            Err(_) => ProviderHealth::Unavailable,
        }
    }
}

/// Piper's length_scale is a duration multiplier: faster speech, smaller scale
fn length_scale_for_rate(rate: i32) -> f32 {
    let speed = (1.0 + rate as f32 / 100.0).clamp(0.25, 4.0);
    1.0 / speed
}
