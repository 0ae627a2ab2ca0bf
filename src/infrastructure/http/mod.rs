use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::controllers::{health, health::StatusController, tts::TtsController, voices};
use crate::infrastructure::config::Config;
use crate::infrastructure::middleware::{rate_limit_middleware, request_id_middleware, RateLimiter};

/// Controllers and shared state the router is built from
pub struct AppComponents {
    pub tts_controller: Arc<TtsController>,
    pub status_controller: Arc<StatusController>,
    pub rate_limiter: Arc<RateLimiter>,
}

/// Build the application router with all routes configured
pub fn build_router(components: AppComponents) -> Router {
    // Synthesis routes (rate limited)
    let synthesis_routes = Router::new()
        .route("/tts", post(TtsController::synthesize))
        .route("/api/tts/synthesize", post(TtsController::synthesize))
        .route("/generate", post(TtsController::generate))
        .with_state(components.tts_controller.clone())
        .layer(middleware::from_fn_with_state(
            components.rate_limiter.clone(),
            rate_limit_middleware,
        ));

    // Generated files (public)
    let audio_routes = Router::new()
        .route("/audio/:file_name", get(TtsController::audio_file))
        .with_state(components.tts_controller.clone());

    let status_routes = Router::new()
        .route("/status", get(StatusController::status))
        .with_state(components.status_controller.clone());

    Router::new()
        .route("/health", get(health::health))
        .route("/voices", get(voices::list_voices))
        .merge(status_routes)
        .merge(audio_routes)
        .merge(synthesis_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the HTTP server and serve until `shutdown` resolves
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    Ok(())
}
