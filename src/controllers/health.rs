use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::tts::{ProviderStatus, TtsServiceApi};
use crate::infrastructure::config::Config;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub providers: Vec<ProviderStatus>,
    pub cache: CacheStatus,
    pub limits: LimitStatus,
}

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub audio_retention_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct LimitStatus {
    pub max_text_length: usize,
    pub requests_per_hour: usize,
    pub provider_timeout_seconds: u64,
}

pub struct StatusController {
    tts_service: Arc<dyn TtsServiceApi>,
    config: Arc<Config>,
}

impl StatusController {
    pub fn new(tts_service: Arc<dyn TtsServiceApi>, config: Arc<Config>) -> Self {
        Self { tts_service, config }
    }

    /// GET /status - Provider chain, cache settings and limits.
    ///
    /// Provider health is advisory; the fallback chain never consults it.
    pub async fn status(State(controller): State<Arc<StatusController>>) -> Json<StatusResponse> {
        let providers = controller.tts_service.provider_statuses().await;
        let config = &controller.config;

        Json(StatusResponse {
            status: "ok",
            providers,
            cache: CacheStatus {
                enabled: config.tts_cache_enabled,
                ttl_seconds: config.cache_ttl_secs,
                audio_retention_seconds: config.audio_retention_secs,
            },
            limits: LimitStatus {
                max_text_length: config.max_text_length,
                requests_per_hour: config.rate_limit_per_hour,
                provider_timeout_seconds: config.provider_timeout_secs,
            },
        })
    }
}
