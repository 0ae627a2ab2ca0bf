use super::error::TtsServiceError;
use super::fallback::FallbackOrchestrator;
use super::fingerprint::Fingerprint;
use super::language::{build_detector, detect_language, LanguageCode};
use super::transliteration::{needs_transliteration, transliterate_roman_urdu};
use super::voices::{Gender, VoiceCatalog, VoiceProfile};
use super::{AudioFormat, SynthesisRequest};
use crate::infrastructure::repositories::{
    ProviderDescriptor, ProviderHealth, ProviderRequest, TtsRepository,
};
use crate::infrastructure::storage::{AudioStore, CacheEntry, ResponseCache};
use async_trait::async_trait;
use lingua::LanguageDetector;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

const PITCH_RANGE: std::ops::RangeInclusive<i32> = -100..=100;
const RATE_RANGE: std::ops::RangeInclusive<i32> = -100..=100;
const MAX_GAP_MS: u32 = 5000;

#[derive(Debug, Clone)]
pub struct TtsSynthesisResult {
    pub audio_data: Vec<u8>,
    pub format: AudioFormat,
    pub provider_id: String,
    pub fingerprint: Fingerprint,
    pub cache_hit: bool,
    /// Name of the stored file, when the audio made it to disk
    pub file_name: Option<String>,
}

impl TtsSynthesisResult {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

struct ResolvedVoice {
    voice: &'static VoiceProfile,
    pitch: i32,
    rate: i32,
}

impl ResolvedVoice {
    fn plain(voice: &'static VoiceProfile, request: &SynthesisRequest) -> Self {
        Self {
            voice,
            pitch: request.pitch,
            rate: request.rate,
        }
    }
}

/// Provider as reported by the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    #[serde(flatten)]
    pub descriptor: ProviderDescriptor,
    pub configured: bool,
    pub health: ProviderHealth,
}

#[async_trait]
pub trait TtsServiceApi: Send + Sync {
    /// Turn a request into audio.
    ///
    /// This operation:
    /// - Validates text length and prosody parameters
    /// - Resolves the voice (explicit key, language hint or detected language)
    /// - Serves a fresh cached result when one exists
    /// - Otherwise walks the provider chain and stores the winner's audio
    async fn synthesize(&self, request: SynthesisRequest) -> Result<TtsSynthesisResult, TtsServiceError>;

    async fn provider_statuses(&self) -> Vec<ProviderStatus>;
}

pub struct TtsService {
    providers: Vec<Arc<dyn TtsRepository>>,
    orchestrator: FallbackOrchestrator,
    cache: Option<Arc<ResponseCache>>,
    store: Arc<AudioStore>,
    catalog: VoiceCatalog,
    language_detector: LanguageDetector,
    max_text_length: usize,
}

impl TtsService {
    pub fn new(
        providers: Vec<Arc<dyn TtsRepository>>,
        orchestrator: FallbackOrchestrator,
        cache: Option<Arc<ResponseCache>>,
        store: Arc<AudioStore>,
        max_text_length: usize,
    ) -> Self {
        Self {
            providers,
            orchestrator,
            cache,
            store,
            catalog: VoiceCatalog,
            language_detector: build_detector(),
            max_text_length,
        }
    }
}

#[async_trait]
impl TtsServiceApi for TtsService {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<TtsSynthesisResult, TtsServiceError> {
        let start_time = Instant::now();

        // 1. Validate
        self.validate(&request)?;

        // 2. Resolve voice (and the prosody a style preset implies)
        let ResolvedVoice { voice, pitch, rate } = self.resolve_voice(&request)?;

        // 3. Normalize text for the voice's language
        let text = if voice.language == LanguageCode::Urdu && needs_transliteration(&request.text) {
            let converted = transliterate_roman_urdu(&request.text);
            tracing::debug!(original = %request.text, converted = %converted, "Roman Urdu transliterated");
            converted
        } else {
            request.text.clone()
        };

        let gap_ms = request.gap.unwrap_or(0);
        let fingerprint = Fingerprint::compute(&text, voice.key, pitch, rate, gap_ms);

        tracing::info!(
            fingerprint = %fingerprint,
            voice = %voice.key,
            language = %voice.language,
            text_length = text.chars().count(),
            "TTS synthesis request"
        );

        // 4. Cache lookup
        if let Some(result) = self.cached(&fingerprint).await {
            tracing::info!(
                fingerprint = %fingerprint,
                provider = %result.provider_id,
                cache_hit = true,
                audio_size_bytes = result.audio_data.len(),
                "TTS cache hit, returning stored audio"
            );
            return Ok(result);
        }

        // 5. Provider chain
        let provider_request = ProviderRequest {
            text,
            voice: *voice,
            pitch,
            rate,
            gap_ms,
        };
        let synthesized = self
            .orchestrator
            .resolve(&provider_request, &self.providers)
            .await?;

        // 6. Persist and cache, best effort
        let file_name = match self
            .store
            .write(
                &fingerprint,
                &synthesized.source_provider_id,
                synthesized.format,
                &synthesized.audio_bytes,
            )
            .await
        {
            Ok(stored) => {
                let file_name = stored.file_name.clone();
                if let Some(cache) = &self.cache {
                    cache
                        .store(fingerprint.clone(), CacheEntry::from_stored(fingerprint.clone(), stored))
                        .await;
                }
                Some(file_name)
            }
            Err(e) => {
                tracing::error!(fingerprint = %fingerprint, error = %e, "Failed to store synthesized audio");
                None
            }
        };

        tracing::info!(
            fingerprint = %fingerprint,
            provider = %synthesized.source_provider_id,
            cache_hit = false,
            latency_ms = start_time.elapsed().as_millis(),
            "TTS synthesis request completed"
        );

        Ok(TtsSynthesisResult {
            audio_data: synthesized.audio_bytes,
            format: synthesized.format,
            provider_id: synthesized.source_provider_id,
            fingerprint,
            cache_hit: false,
            file_name,
        })
    }

    async fn provider_statuses(&self) -> Vec<ProviderStatus> {
        let mut statuses = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let health = provider.health().await;
            statuses.push(ProviderStatus {
                descriptor: provider.descriptor().clone(),
                configured: health != ProviderHealth::NotConfigured,
                health,
            });
        }
        statuses
    }
}

impl TtsService {
    fn validate(&self, request: &SynthesisRequest) -> Result<(), TtsServiceError> {
        if request.text.trim().is_empty() {
            return Err(TtsServiceError::Invalid("No text provided".to_string()));
        }

        let length = request.text.chars().count();
        if length > self.max_text_length {
            return Err(TtsServiceError::Invalid(format!(
                "Text too long: {} characters (max {})",
                length, self.max_text_length
            )));
        }

        if !PITCH_RANGE.contains(&request.pitch) {
            return Err(TtsServiceError::Invalid(format!(
                "pitch must be between {} and {}",
                PITCH_RANGE.start(),
                PITCH_RANGE.end()
            )));
        }
        if !RATE_RANGE.contains(&request.rate) {
            return Err(TtsServiceError::Invalid(format!(
                "rate must be between {} and {}",
                RATE_RANGE.start(),
                RATE_RANGE.end()
            )));
        }
        if request.gap.is_some_and(|gap| gap > MAX_GAP_MS) {
            return Err(TtsServiceError::Invalid(format!(
                "gap must be at most {} ms",
                MAX_GAP_MS
            )));
        }

        Ok(())
    }

    /// Explicit voice key or alias first, then a style preset or language
    /// hint in `language`, then language detection on the text.
    fn resolve_voice(&self, request: &SynthesisRequest) -> Result<ResolvedVoice, TtsServiceError> {
        let language_hint = request.language.as_deref().filter(|hint| !hint.trim().is_empty());

        if let Some(key) = request.voice.as_deref().filter(|key| !key.trim().is_empty()) {
            let voice = self
                .catalog
                .find(key)
                .ok_or_else(|| TtsServiceError::Invalid(format!("Unknown voice '{}'", key)))?;
            return Ok(ResolvedVoice::plain(voice, request));
        }

        if let Some(preset) = language_hint.and_then(|hint| self.catalog.preset(hint)) {
            let (pitch, rate) = preset.apply(request.pitch, request.rate);
            tracing::debug!(preset = preset.key, voice = preset.voice_key, pitch, rate, "Style preset applied");
            return Ok(ResolvedVoice {
                voice: preset.voice(),
                pitch,
                rate,
            });
        }

        let language = match language_hint {
            Some(hint) => LanguageCode::from_hint(hint)
                .ok_or_else(|| TtsServiceError::Invalid(format!("Unsupported language '{}'", hint)))?,
            None => detect_language(&self.language_detector, &request.text),
        };

        let gender = match request.gender.as_deref().filter(|g| !g.trim().is_empty()) {
            Some(value) => Some(
                Gender::parse(value)
                    .ok_or_else(|| TtsServiceError::Invalid(format!("Unknown gender '{}'", value)))?,
            ),
            None => None,
        };

        Ok(ResolvedVoice::plain(self.catalog.default_for(language, gender), request))
    }

    /// A cached entry whose file can no longer be read counts as a miss
    async fn cached(&self, fingerprint: &Fingerprint) -> Option<TtsSynthesisResult> {
        let cache = self.cache.as_ref()?;
        let entry = cache.lookup(fingerprint).await?;

        match self.store.read(&entry.audio_path).await {
            Ok(audio_data) if !audio_data.is_empty() => Some(TtsSynthesisResult {
                audio_data,
                format: entry.format,
                provider_id: entry.source_provider_id,
                fingerprint: fingerprint.clone(),
                cache_hit: true,
                file_name: Some(entry.file_name),
            }),
            Ok(_) | Err(_) => {
                tracing::warn!(
                    fingerprint = %fingerprint,
                    path = %entry.audio_path.display(),
                    "Cached audio missing on disk, treating as miss"
                );
                cache.invalidate(fingerprint).await;
                None
            }
        }
    }
}
