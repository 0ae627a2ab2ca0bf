use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::{
    domain::tts::{
        dto::GenerateResponse, AudioFormat, SynthesisRequest, TtsServiceApi, TtsSynthesisResult,
    },
    error::{AppError, AppResult},
    infrastructure::storage::AudioStore,
};

pub const X_PROVIDER: &str = "x-provider";
pub const X_CACHE: &str = "x-cache";

pub struct TtsController {
    tts_service: Arc<dyn TtsServiceApi>,
    store: Arc<AudioStore>,
}

impl TtsController {
    pub fn new(tts_service: Arc<dyn TtsServiceApi>, store: Arc<AudioStore>) -> Self {
        Self { tts_service, store }
    }

    /// POST /tts and /api/tts/synthesize - Convert text to speech, audio in the body
    pub async fn synthesize(
        State(controller): State<Arc<TtsController>>,
        payload: Result<Json<SynthesisRequest>, JsonRejection>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

        let result = controller.tts_service.synthesize(request).await?;

        let headers = audio_headers(&result);
        Ok((StatusCode::OK, headers, Body::from(result.audio_data)))
    }

    /// POST /generate - Convert text to speech, return a link to the stored file
    pub async fn generate(
        State(controller): State<Arc<TtsController>>,
        payload: Result<Json<SynthesisRequest>, JsonRejection>,
    ) -> AppResult<Json<GenerateResponse>> {
        let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

        let result = controller.tts_service.synthesize(request).await?;
        let filename = result
            .file_name
            .ok_or_else(|| AppError::Internal("generated audio could not be stored".to_string()))?;

        Ok(Json(GenerateResponse {
            success: true,
            file_url: format!("/audio/{}", filename),
            filename,
            provider: result.provider_id,
            cached: result.cache_hit,
        }))
    }

    /// GET /audio/:file_name - Serve a previously generated file
    pub async fn audio_file(
        State(controller): State<Arc<TtsController>>,
        Path(file_name): Path<String>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let stored = controller
            .store
            .locate(&file_name)
            .await
            .ok_or_else(|| AppError::NotFound(format!("audio file '{}'", file_name)))?;

        let bytes = controller.store.read(&stored.path).await.map_err(|e| {
            // Removed by the janitor between locate and read
            tracing::debug!(file = %file_name, error = %e, "Audio file vanished");
            AppError::NotFound(format!("audio file '{}'", file_name))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(stored.format.mime_type()));
        insert_header(&mut headers, X_PROVIDER, &stored.provider_id);
        Ok((StatusCode::OK, headers, Body::from(bytes)))
    }
}

fn audio_headers(result: &TtsSynthesisResult) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(result.mime_type()));
    headers.insert(header::CONTENT_DISPOSITION, content_disposition(result.format));
    insert_header(&mut headers, X_PROVIDER, &result.provider_id);
    headers.insert(
        X_CACHE,
        HeaderValue::from_static(if result.cache_hit { "HIT" } else { "MISS" }),
    );
    headers
}

fn content_disposition(format: AudioFormat) -> HeaderValue {
    match format {
        AudioFormat::Mp3 => HeaderValue::from_static("attachment; filename=speech.mp3"),
        AudioFormat::Wav => HeaderValue::from_static("attachment; filename=speech.wav"),
        AudioFormat::Flac => HeaderValue::from_static("attachment; filename=speech.flac"),
        AudioFormat::Ogg => HeaderValue::from_static("attachment; filename=speech.ogg"),
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}
