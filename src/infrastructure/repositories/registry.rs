use super::{
    EspeakTtsRepository, HuggingFaceTtsRepository, OpenAiTtsRepository, PiperTtsRepository,
    PollyTtsRepository, TtsRepository, UnconfiguredTtsRepository,
};
use crate::infrastructure::config::{Config, ProviderKind};
use crate::infrastructure::process::{ManagedProcess, ModelDownloader, ProcessSpec, SupervisedProcess};
use async_openai::config::OpenAIConfig;
use std::sync::Arc;
use std::time::Duration;

/// Model the Piper server loads at startup
const PIPER_DEFAULT_MODEL: &str = "en_US-lessac-medium";
const PIPER_WARMUP: Duration = Duration::from_secs(60);
/// Rough time to fetch a medium voice (~60 MB), used as the retry hint
const PIPER_DOWNLOAD_ESTIMATE: Duration = Duration::from_secs(120);
const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// The provider chain plus any child processes it owns
pub struct ProviderSet {
    pub providers: Vec<Arc<dyn TtsRepository>>,
    pub processes: Vec<Arc<ManagedProcess>>,
}

impl ProviderSet {
    pub async fn shutdown(&self) {
        for process in &self.processes {
            process.shutdown().await;
        }
    }
}

/// Build adapters in the configured priority order.
///
/// A provider that cannot be set up is kept as an always-rejecting stand-in
/// instead of failing startup.
pub async fn build_providers(config: &Config) -> ProviderSet {
    let http = reqwest::Client::new();
    let mut providers: Vec<Arc<dyn TtsRepository>> = Vec::new();
    let mut processes = Vec::new();

    for (priority, kind) in config.providers.iter().enumerate() {
        let provider: Arc<dyn TtsRepository> = match kind {
            ProviderKind::Polly => {
                if config.aws_credentials_present {
                    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                        .region(aws_config::Region::new(config.aws_region.clone()))
                        .load()
                        .await;
                    tracing::info!(region = ?aws_config.region(), "AWS Polly client initialized");
                    let client = Arc::new(aws_sdk_polly::Client::new(&aws_config));
                    Arc::new(PollyTtsRepository::new(client, priority))
                } else {
                    unconfigured(kind, priority, "AWS credentials not found")
                }
            }
            ProviderKind::OpenAi => match &config.openai_api_key {
                Some(key) => {
                    let client = async_openai::Client::with_config(
                        OpenAIConfig::new().with_api_key(key.clone()),
                    );
                    Arc::new(OpenAiTtsRepository::new(
                        Arc::new(client),
                        config.openai_tts_model.clone(),
                        priority,
                    ))
                }
                None => unconfigured(kind, priority, "OPENAI_API_KEY is not set"),
            },
            ProviderKind::HuggingFace => match &config.huggingface_api_token {
                Some(token) => Arc::new(HuggingFaceTtsRepository::new(
                    http.clone(),
                    config.huggingface_api_url.clone(),
                    token.clone(),
                    priority,
                )),
                None => unconfigured(kind, priority, "HUGGINGFACE_API_TOKEN is not set"),
            },
            ProviderKind::Piper => match start_piper(config) {
                Ok(process) => {
                    processes.push(process.clone());
                    Arc::new(PiperTtsRepository::new(
                        http.clone(),
                        format!("http://127.0.0.1:{}", config.piper_port),
                        Some(process),
                        priority,
                    ))
                }
                Err(reason) => unconfigured(kind, priority, reason),
            },
            ProviderKind::Espeak => Arc::new(EspeakTtsRepository::new(
                config.espeak_binary.clone(),
                priority,
            )),
        };

        tracing::info!(
            provider = kind.id(),
            priority,
            "TTS provider registered"
        );
        providers.push(provider);
    }

    ProviderSet {
        providers,
        processes,
    }
}

fn unconfigured(kind: &ProviderKind, priority: usize, reason: &str) -> Arc<dyn TtsRepository> {
    tracing::warn!(provider = kind.id(), reason, "TTS provider is not configured, it will be skipped");
    Arc::new(UnconfiguredTtsRepository::new(kind.id(), priority, reason))
}

/// Launch the Piper server, downloading its model first when it is missing.
///
/// While the download runs the provider reports itself busy instead of
/// being dropped from the chain.
fn start_piper(config: &Config) -> Result<Arc<ManagedProcess>, &'static str> {
    let command = config.piper_command.as_deref().ok_or("PIPER_COMMAND is not set")?;
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or("PIPER_COMMAND is empty")?;

    let download_client = reqwest::Client::builder()
        .connect_timeout(DOWNLOAD_CONNECT_TIMEOUT)
        .build()
        .unwrap_or_default();
    let downloader = ModelDownloader::new(
        download_client,
        &config.piper_voices_url,
        config.piper_models_dir.clone(),
    );
    let model = downloader.model_path(PIPER_DEFAULT_MODEL);

    let mut args: Vec<String> = parts.map(str::to_string).collect();
    args.extend([
        "--model".to_string(),
        model.display().to_string(),
        "--data-dir".to_string(),
        config.piper_models_dir.display().to_string(),
        "--host".to_string(),
        "127.0.0.1".to_string(),
        "--port".to_string(),
        config.piper_port.to_string(),
    ]);

    let spec = ProcessSpec {
        name: "piper".to_string(),
        program: program.to_string(),
        args,
        health_url: format!("http://127.0.0.1:{}/", config.piper_port),
        warmup: PIPER_WARMUP,
    };

    if downloader.is_present(PIPER_DEFAULT_MODEL) {
        let process = SupervisedProcess::spawn(spec).map_err(|e| {
            tracing::error!(error = %e, "Failed to start Piper server");
            "Piper server failed to start"
        })?;
        return Ok(ManagedProcess::running(process));
    }

    tracing::warn!(
        model = %model.display(),
        "Piper model not found, downloading before the server starts"
    );
    Ok(ManagedProcess::spawn_after(
        "piper",
        PIPER_DOWNLOAD_ESTIMATE,
        async move {
            downloader
                .ensure(PIPER_DEFAULT_MODEL)
                .await
                .map_err(|e| e.to_string())?;
            Ok(spec)
        },
    ))
}
