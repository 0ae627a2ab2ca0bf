use super::batching::split_into_batches;
use super::tts_repository::{
    ProviderAudio, ProviderCapabilities, ProviderDescriptor, ProviderError, ProviderRequest,
    TtsRepository,
};
use crate::domain::tts::AudioFormat;
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// OpenAI has a limit of 4096 characters per request
const MAX_BATCH_SIZE: usize = 4096;

pub const PROVIDER_ID: &str = "openai";

/// OpenAI TTS implementation of TTS repository
pub struct OpenAiTtsRepository {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    descriptor: ProviderDescriptor,
}

impl OpenAiTtsRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String, priority: usize) -> Self {
        Self {
            client,
            model,
            descriptor: ProviderDescriptor::new(
                PROVIDER_ID,
                priority,
                ProviderCapabilities {
                    supports_pitch: false,
                    supports_rate: true,
                    supports_voice_list: false,
                },
            ),
        }
    }

    fn speech_model(&self) -> SpeechModel {
        match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        }
    }

    /// Call OpenAI TTS API to synthesize a single text batch
    async fn call_openai(&self, text: &str, voice: Voice, speed: f32) -> Result<Vec<u8>, ProviderError> {
        let request = CreateSpeechRequest {
            model: self.speech_model(),
            input: text.to_string(),
            voice,
            response_format: Some(SpeechResponseFormat::Mp3),
            speed: Some(speed),
        };

        let response = self.client.audio().speech(request).await.map_err(|e| {
            tracing::error!(error = %e, model = %self.model, text_length = text.len(), "OpenAI TTS API call failed");
            map_openai_error(e)
        })?;

        Ok(response.bytes.to_vec())
    }
}

#[async_trait]
impl TtsRepository for OpenAiTtsRepository {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn synthesize(&self, request: &ProviderRequest) -> Result<ProviderAudio, ProviderError> {
        let start_time = std::time::Instant::now();
        let voice_name = request.voice_for(PROVIDER_ID)?;
        let voice = parse_voice(voice_name)?;
        let speed = speed_for_rate(request.rate);

        let text = request.plain_text();
        let batches = split_into_batches(&text, MAX_BATCH_SIZE);
        let mut merged_audio = Vec::new();

        for batch in &batches {
            let audio_data = self.call_openai(batch, voice.clone(), speed).await?;
            merged_audio.extend(audio_data);
        }

        tracing::info!(
            provider = PROVIDER_ID,
            model = %self.model,
            voice = voice_name,
            speed,
            latency_ms = start_time.elapsed().as_millis(),
            batch_count = batches.len(),
            audio_size_bytes = merged_audio.len(),
            "OpenAI synthesis completed"
        );

        Ok(ProviderAudio {
            bytes: merged_audio,
            format: AudioFormat::Mp3,
        })
    }
}

fn parse_voice(name: &str) -> Result<Voice, ProviderError> {
    match name.to_lowercase().as_str() {
        "alloy" => Ok(Voice::Alloy),
        "echo" => Ok(Voice::Echo),
        "fable" => Ok(Voice::Fable),
        "onyx" => Ok(Voice::Onyx),
        "nova" => Ok(Voice::Nova),
        "shimmer" => Ok(Voice::Shimmer),
        other => Err(ProviderError::Rejected(format!("unknown OpenAI voice '{}'", other))),
    }
}

/// Map a -100..=100 rate offset onto OpenAI's 0.25..=4.0 speed multiplier
fn speed_for_rate(rate: i32) -> f32 {
    (1.0 + rate as f32 / 100.0).clamp(0.25, 4.0)
}

fn map_openai_error(err: OpenAIError) -> ProviderError {
    match err {
        OpenAIError::Reqwest(e) if e.is_timeout() => ProviderError::Timeout(e.to_string()),
        OpenAIError::Reqwest(e) => ProviderError::Unavailable(e.to_string()),
        OpenAIError::ApiError(api) => {
            let code = api.code.clone().unwrap_or_default();
            let detail = format!("{} ({})", api.message, code);
            match api.r#type.as_deref() {
                Some("server_error") => ProviderError::Unavailable(detail),
                _ if code == "rate_limit_exceeded" => ProviderError::Unavailable(detail),
                _ => ProviderError::Rejected(detail),
            }
        }
        other => ProviderError::Rejected(other.to_string()),
    }
}
