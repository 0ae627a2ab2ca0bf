use super::tts_repository::{ProviderAudio, ProviderError};
use crate::domain::tts::AudioFormat;
use reqwest::header::CONTENT_TYPE;

/// Classify a transport failure from reqwest
pub fn map_reqwest_error(provider_id: &str, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(format!("{}: {}", provider_id, err))
    } else if err.is_builder() {
        ProviderError::Rejected(format!("{}: {}", provider_id, err))
    } else {
        ProviderError::Unavailable(format!("{}: {}", provider_id, err))
    }
}

/// Read a successful audio response, labelling it by its content type.
///
/// A missing content type falls back to `default_format`; a content type
/// that is not audio we understand is rejected rather than guessed.
pub async fn read_audio(
    provider_id: &str,
    response: reqwest::Response,
    default_format: AudioFormat,
) -> Result<ProviderAudio, ProviderError> {
    let format = match response.headers().get(CONTENT_TYPE) {
        None => default_format,
        Some(value) => {
            let content_type = value.to_str().unwrap_or_default();
            AudioFormat::from_mime(content_type).ok_or_else(|| {
                ProviderError::Rejected(format!(
                    "{} returned unsupported content type '{}'",
                    provider_id, content_type
                ))
            })?
        }
    };

    let bytes = response
        .bytes()
        .await
        .map_err(|e| map_reqwest_error(provider_id, e))?;

    Ok(ProviderAudio {
        bytes: bytes.to_vec(),
        format,
    })
}
