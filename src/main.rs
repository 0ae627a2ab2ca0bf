use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tts_relay::controllers::{health::StatusController, tts::TtsController};
use tts_relay::domain::tts::{FallbackOrchestrator, TtsService, TtsServiceApi};
use tts_relay::infrastructure::config::{Config, LogFormat};
use tts_relay::infrastructure::http::{build_router, start_http_server, AppComponents};
use tts_relay::infrastructure::middleware::RateLimiter;
use tts_relay::infrastructure::repositories::build_providers;
use tts_relay::infrastructure::storage::{AudioStore, FileJanitor, ResponseCache};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting TTS relay on {}:{}", config.host, config.port);

    // Audio directory, cache and janitor
    let store = Arc::new(AudioStore::open(&config.audio_dir).await?);
    tracing::info!(dir = %store.dir().display(), "Audio store ready");

    let cache = if config.tts_cache_enabled {
        Some(Arc::new(ResponseCache::new(store.clone(), config.cache_ttl())))
    } else {
        tracing::info!("Response cache disabled");
        None
    };

    let janitor = FileJanitor::new(
        store.dir(),
        config.audio_retention(),
        config.janitor_interval(),
    )
    .spawn();

    // Provider chain
    let provider_set = build_providers(&config).await;
    if provider_set.providers.is_empty() {
        tracing::warn!("No TTS providers configured, every synthesis request will fail");
    }

    let config = Arc::new(config);

    // Services
    let tts_service: Arc<dyn TtsServiceApi> = Arc::new(TtsService::new(
        provider_set.providers.clone(),
        FallbackOrchestrator::new(config.provider_timeout()),
        cache,
        store.clone(),
        config.max_text_length,
    ));

    // Controllers
    let app = build_router(AppComponents {
        tts_controller: Arc::new(TtsController::new(tts_service.clone(), store)),
        status_controller: Arc::new(StatusController::new(tts_service, config.clone())),
        rate_limiter: Arc::new(RateLimiter::new(
            config.rate_limit_per_hour,
            config.request_delay(),
        )),
    });

    let result = start_http_server(config, app, shutdown_signal()).await;

    tracing::info!("Shutting down");
    janitor.abort();
    provider_set.shutdown().await;

    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tts_relay=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
