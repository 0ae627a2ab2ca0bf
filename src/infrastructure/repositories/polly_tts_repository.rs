use super::batching::split_into_batches;
use super::tts_repository::{
    ProviderAudio, ProviderCapabilities, ProviderDescriptor, ProviderError, ProviderRequest,
    TtsRepository,
};
use crate::domain::tts::AudioFormat;
use async_trait::async_trait;
use aws_sdk_polly::{
    error::{ProvideErrorMetadata, SdkError},
    operation::synthesize_speech::SynthesizeSpeechError,
    types::{Engine, OutputFormat, TextType, VoiceId},
    Client as PollyClient,
};
use std::sync::Arc;

/// AWS Polly has a limit of 3000 billed characters per request
const MAX_BATCH_SIZE: usize = 3000;

pub const PROVIDER_ID: &str = "polly";

/// AWS Polly implementation of TTS repository.
///
/// Uses the standard engine because neural voices ignore SSML pitch.
pub struct PollyTtsRepository {
    polly_client: Arc<PollyClient>,
    descriptor: ProviderDescriptor,
}

impl PollyTtsRepository {
    pub fn new(polly_client: Arc<PollyClient>, priority: usize) -> Self {
        Self {
            polly_client,
            descriptor: ProviderDescriptor::new(
                PROVIDER_ID,
                priority,
                ProviderCapabilities {
                    supports_pitch: true,
                    supports_rate: true,
                    supports_voice_list: true,
                },
            ),
        }
    }

    /// Call AWS Polly to synthesize a single SSML batch
    async fn call_polly(&self, ssml: &str, voice_name: &str) -> Result<Vec<u8>, ProviderError> {
        let engine = Engine::Standard;

        tracing::debug!(
            voice = voice_name,
            engine = ?engine,
            output_format = "Mp3",
            ssml_length = ssml.len(),
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly_client
            .synthesize_speech()
            .text(ssml)
            .text_type(TextType::Ssml)
            .voice_id(VoiceId::from(voice_name))
            .output_format(OutputFormat::Mp3)
            .engine(engine)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, voice = voice_name, "AWS Polly synthesize_speech failed");
                map_sdk_error(e)
            })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            ProviderError::Unavailable(format!("failed to read audio stream: {}", e))
        })?;

        Ok(audio_stream.into_bytes().to_vec())
    }
}

#[async_trait]
impl TtsRepository for PollyTtsRepository {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn synthesize(&self, request: &ProviderRequest) -> Result<ProviderAudio, ProviderError> {
        let start_time = std::time::Instant::now();
        let voice = request.voice_for(PROVIDER_ID)?;

        let batches = split_into_batches(&request.text, MAX_BATCH_SIZE);
        let mut merged_audio = Vec::new();

        // MP3 frames concatenate cleanly, so batches are joined byte-wise
        for (index, batch) in batches.iter().enumerate() {
            let ssml = polly_ssml(&request.with_text(batch));
            let audio_data = self.call_polly(&ssml, voice).await?;
            merged_audio.extend(audio_data);

            tracing::debug!(
                batch_index = index,
                total_audio_size = merged_audio.len(),
                "Batch synthesized and merged"
            );
        }

        tracing::info!(
            provider = PROVIDER_ID,
            voice = voice,
            latency_ms = start_time.elapsed().as_millis(),
            batch_count = batches.len(),
            audio_size_bytes = merged_audio.len(),
            "Polly synthesis completed"
        );

        Ok(ProviderAudio {
            bytes: merged_audio,
            format: AudioFormat::Mp3,
        })
    }
}

/// Polly honours both prosody attributes; rate must be an absolute percentage
fn polly_ssml(request: &ProviderRequest) -> String {
    request.ssml(true, true)
}

fn map_sdk_error<R>(err: SdkError<SynthesizeSpeechError, R>) -> ProviderError
where
    R: std::fmt::Debug,
{
    match err {
        SdkError::TimeoutError(_) => ProviderError::Timeout("AWS Polly request timed out".to_string()),
        SdkError::ConstructionFailure(_) => {
            ProviderError::Rejected("AWS Polly request could not be built".to_string())
        }
        SdkError::DispatchFailure(e) => {
            ProviderError::Unavailable(format!("AWS Polly unreachable: {:?}", e))
        }
        SdkError::ResponseError(_) => {
            ProviderError::Unavailable("AWS Polly returned an unreadable response".to_string())
        }
        SdkError::ServiceError(ctx) => classify_service_error(ctx.err()),
        other => ProviderError::Unavailable(format!("AWS Polly error: {:?}", other)),
    }
}

/// Server-side faults and throttling are worth falling through; everything
/// else means the request itself is unacceptable to Polly.
fn classify_service_error(err: &SynthesizeSpeechError) -> ProviderError {
    let detail = err.to_string();

    match err {
        SynthesizeSpeechError::ServiceFailureException(_) => ProviderError::Unavailable(detail),
        _ if matches!(err.code(), Some("ThrottlingException")) => ProviderError::Unavailable(detail),
        _ => ProviderError::Rejected(detail),
    }
}
