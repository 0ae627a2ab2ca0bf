use super::http_audio::{map_reqwest_error, read_audio};
use super::tts_repository::{
    ProviderAudio, ProviderCapabilities, ProviderDescriptor, ProviderError, ProviderRequest,
    TtsRepository,
};
use crate::domain::tts::AudioFormat;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const PROVIDER_ID: &str = "huggingface";

/// Used when a loading model gives no estimate
const DEFAULT_LOADING_RETRY_SECS: u64 = 20;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct InferenceError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    estimated_time: Option<f64>,
}

/// HuggingFace Inference API implementation of TTS repository.
///
/// Each voice maps to a model id (for example `facebook/mms-tts-eng`). Cold
/// models answer 503 with an `estimated_time`, surfaced as `Busy`.
pub struct HuggingFaceTtsRepository {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    descriptor: ProviderDescriptor,
}

impl HuggingFaceTtsRepository {
    pub fn new(http: reqwest::Client, base_url: String, api_token: String, priority: usize) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            descriptor: ProviderDescriptor::new(
                PROVIDER_ID,
                priority,
                ProviderCapabilities {
                    supports_pitch: false,
                    supports_rate: false,
                    supports_voice_list: false,
                },
            ),
        }
    }
}

#[async_trait]
impl TtsRepository for HuggingFaceTtsRepository {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn synthesize(&self, request: &ProviderRequest) -> Result<ProviderAudio, ProviderError> {
        let model = request.voice_for(PROVIDER_ID)?;
        let text = request.plain_text();
        let url = format!("{}/{}", self.base_url, model);

        tracing::debug!(model = model, text_length = text.len(), "Calling HuggingFace Inference API");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&InferenceRequest { inputs: &text })
            .send()
            .await
            .map_err(|e| map_reqwest_error(PROVIDER_ID, e))?;

        let status = response.status();
        if status.is_success() {
            return read_audio(PROVIDER_ID, response, AudioFormat::Flac).await;
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }
}

fn classify_failure(status: StatusCode, body: &str) -> ProviderError {
    let parsed: Option<InferenceError> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.error.clone())
        .unwrap_or_else(|| body.chars().take(200).collect());
    let detail = format!("HTTP {}: {}", status.as_u16(), message);

    match status {
        StatusCode::SERVICE_UNAVAILABLE => {
            let estimated = parsed.as_ref().and_then(|e| e.estimated_time);
            let loading = estimated.is_some() || message.to_lowercase().contains("loading");
            if loading {
                ProviderError::Busy {
                    retry_after_secs: estimated
                        .map(|secs| secs.ceil().max(1.0) as u64)
                        .unwrap_or(DEFAULT_LOADING_RETRY_SECS),
                    detail,
                }
            } else {
                ProviderError::Unavailable(detail)
            }
        }
        StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => ProviderError::Timeout(detail),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::Unavailable(detail),
        s if s.is_server_error() => ProviderError::Unavailable(detail),
        _ => ProviderError::Rejected(detail),
    }
}
