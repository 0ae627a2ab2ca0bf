use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::infrastructure::process::PIPER_VOICES_URL;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    /// Provider chain in priority order
    pub providers: Vec<ProviderKind>,
    pub max_text_length: usize,
    pub provider_timeout_secs: u64,
    // Cache and storage
    pub tts_cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub audio_dir: PathBuf,
    pub audio_retention_secs: u64,
    pub janitor_interval_secs: u64,
    // Abuse protection
    pub rate_limit_per_hour: usize,
    pub request_delay_ms: u64,
    // AWS Polly
    pub aws_region: String,
    pub aws_credentials_present: bool,
    // OpenAI
    pub openai_api_key: Option<String>,
    pub openai_tts_model: String,
    // HuggingFace Inference API
    pub huggingface_api_token: Option<String>,
    pub huggingface_api_url: String,
    // Piper
    pub piper_command: Option<String>,
    pub piper_models_dir: PathBuf,
    /// Base URL missing Piper models are downloaded from
    pub piper_voices_url: String,
    pub piper_port: u16,
    // eSpeak
    pub espeak_binary: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Polly,
    OpenAi,
    HuggingFace,
    Piper,
    Espeak,
}

impl ProviderKind {
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::Polly => "polly",
            ProviderKind::OpenAi => "openai",
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Piper => "piper",
            ProviderKind::Espeak => "espeak",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "polly" | "aws" => Ok(ProviderKind::Polly),
            "openai" => Ok(ProviderKind::OpenAi),
            "huggingface" | "hf" => Ok(ProviderKind::HuggingFace),
            "piper" => Ok(ProviderKind::Piper),
            "espeak" | "espeak-ng" => Ok(ProviderKind::Espeak),
            other => Err(format!("unknown TTS provider '{}'", other)),
        }
    }
}

pub fn parse_providers(value: &str) -> Result<Vec<ProviderKind>, String> {
    let mut providers = Vec::new();
    for name in value.split(',').filter(|name| !name.trim().is_empty()) {
        let kind: ProviderKind = name.parse()?;
        if !providers.contains(&kind) {
            providers.push(kind);
        }
    }
    Ok(providers)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_format: LogFormat::Pretty,
            providers: vec![
                ProviderKind::Polly,
                ProviderKind::OpenAi,
                ProviderKind::HuggingFace,
                ProviderKind::Piper,
                ProviderKind::Espeak,
            ],
            max_text_length: 1000,
            provider_timeout_secs: 30,
            tts_cache_enabled: true,
            cache_ttl_secs: 600,
            audio_dir: PathBuf::from("generated_audio"),
            audio_retention_secs: 600,
            janitor_interval_secs: 600,
            rate_limit_per_hour: 10,
            request_delay_ms: 0,
            aws_region: "us-east-1".to_string(),
            aws_credentials_present: false,
            openai_api_key: None,
            openai_tts_model: "tts-1".to_string(),
            huggingface_api_token: None,
            huggingface_api_url: "https://api-inference.huggingface.co/models".to_string(),
            piper_command: None,
            piper_models_dir: PathBuf::from("voices"),
            piper_voices_url: PIPER_VOICES_URL.to_string(),
            piper_port: 5001,
            espeak_binary: "espeak-ng".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let config = Config {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            log_format: env::var("LOG_FORMAT")
                .map(|s| match s.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })
                .unwrap_or(defaults.log_format),
            providers: match env::var("TTS_PROVIDERS") {
                Ok(value) => parse_providers(&value)?,
                Err(_) => defaults.providers,
            },
            max_text_length: parse_var("MAX_TEXT_LENGTH", defaults.max_text_length)?,
            provider_timeout_secs: parse_var("PROVIDER_TIMEOUT_SECS", defaults.provider_timeout_secs)?,
            tts_cache_enabled: env::var("TTS_CACHE_ENABLED")
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(defaults.tts_cache_enabled),
            cache_ttl_secs: parse_var("CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
            audio_dir: env::var("AUDIO_DIR").map(PathBuf::from).unwrap_or(defaults.audio_dir),
            audio_retention_secs: parse_var("AUDIO_RETENTION_SECS", defaults.audio_retention_secs)?,
            janitor_interval_secs: parse_var("JANITOR_INTERVAL_SECS", defaults.janitor_interval_secs)?,
            rate_limit_per_hour: parse_var("RATE_LIMIT_PER_HOUR", defaults.rate_limit_per_hour)?,
            request_delay_ms: parse_var("REQUEST_DELAY_MS", defaults.request_delay_ms)?,
            aws_region: env::var("AWS_REGION").unwrap_or(defaults.aws_region),
            aws_credentials_present: (env::var("AWS_ACCESS_KEY_ID").is_ok()
                && env::var("AWS_SECRET_ACCESS_KEY").is_ok())
                || env::var("AWS_PROFILE").is_ok(),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_tts_model: env::var("OPENAI_TTS_MODEL").unwrap_or(defaults.openai_tts_model),
            huggingface_api_token: non_empty_var("HUGGINGFACE_API_TOKEN"),
            huggingface_api_url: env::var("HUGGINGFACE_API_URL").unwrap_or(defaults.huggingface_api_url),
            piper_command: non_empty_var("PIPER_COMMAND"),
            piper_models_dir: env::var("PIPER_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.piper_models_dir),
            piper_voices_url: env::var("PIPER_VOICES_URL").unwrap_or(defaults.piper_voices_url),
            piper_port: parse_var("PIPER_PORT", defaults.piper_port)?,
            espeak_binary: env::var("ESPEAK_BINARY").unwrap_or(defaults.espeak_binary),
        };

        if config.janitor_interval_secs == 0 {
            return Err("JANITOR_INTERVAL_SECS must be at least 1".into());
        }

        Ok(config)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn audio_retention(&self) -> Duration {
        Duration::from_secs(self.audio_retention_secs)
    }

    pub fn janitor_interval(&self) -> Duration {
        Duration::from_secs(self.janitor_interval_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| format!("invalid value for {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
