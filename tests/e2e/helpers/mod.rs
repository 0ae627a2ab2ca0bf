use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;
use tts_relay::{
    controllers::{health::StatusController, tts::TtsController},
    domain::tts::{AudioFormat, FallbackOrchestrator, TtsService, TtsServiceApi},
    infrastructure::{
        config::Config,
        http::{build_router, AppComponents},
        middleware::RateLimiter,
        repositories::TtsRepository,
        storage::{AudioStore, ResponseCache},
    },
};

pub mod api_client;
pub mod stub_providers;

use api_client::TestClient;
use stub_providers::StubProvider;

/// Fake MP3 payload returned by the default stub provider
pub const STUB_AUDIO: &[u8] = b"ID3\x04stub-mp3-frames";

/// Knobs for a test server; defaults match production except for the
/// provider chain, which is a single succeeding stub
pub struct TestOptions {
    pub providers: Vec<Arc<StubProvider>>,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub max_text_length: usize,
    pub provider_timeout: Duration,
    pub rate_limit_per_hour: usize,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            providers: vec![StubProvider::succeeding("primary", STUB_AUDIO, AudioFormat::Mp3)],
            cache_enabled: true,
            cache_ttl: Duration::from_secs(600),
            max_text_length: 1000,
            provider_timeout: Duration::from_secs(5),
            rate_limit_per_hour: 0,
        }
    }
}

/// A running server bound to an ephemeral port, with the stub chain it uses
pub struct TestContext {
    pub client: TestClient,
    pub providers: Vec<Arc<StubProvider>>,
    pub cache: Option<Arc<ResponseCache>>,
    pub audio_dir: TempDir,
}

impl TestContext {
    pub async fn with_options(options: TestOptions) -> Self {
        let audio_dir = tempfile::tempdir().expect("Failed to create audio dir");
        let store = Arc::new(
            AudioStore::open(audio_dir.path())
                .await
                .expect("Failed to open audio store"),
        );
        let cache = options
            .cache_enabled
            .then(|| Arc::new(ResponseCache::new(store.clone(), options.cache_ttl)));

        let config = Arc::new(Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_text_length: options.max_text_length,
            rate_limit_per_hour: options.rate_limit_per_hour,
            tts_cache_enabled: options.cache_enabled,
            cache_ttl_secs: options.cache_ttl.as_secs(),
            audio_dir: audio_dir.path().to_path_buf(),
            ..Config::default()
        });

        let chain: Vec<Arc<dyn TtsRepository>> = options
            .providers
            .iter()
            .map(|p| p.clone() as Arc<dyn TtsRepository>)
            .collect();

        let tts_service: Arc<dyn TtsServiceApi> = Arc::new(TtsService::new(
            chain,
            FallbackOrchestrator::new(options.provider_timeout),
            cache.clone(),
            store.clone(),
            options.max_text_length,
        ));

        let app = build_router(AppComponents {
            tts_controller: Arc::new(TtsController::new(tts_service.clone(), store)),
            status_controller: Arc::new(StatusController::new(tts_service, config)),
            rate_limiter: Arc::new(RateLimiter::new(options.rate_limit_per_hour, Duration::ZERO)),
        });

        // Start server
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
            )
            .await
            .unwrap();
        });

        Self {
            client: TestClient::new(&base_url),
            providers: options.providers,
            cache,
            audio_dir,
        }
    }

    pub fn provider(&self, index: usize) -> &StubProvider {
        &self.providers[index]
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        Self::with_options(TestOptions::default())
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // Audio directory is removed when the TempDir drops
        }
    }
}
