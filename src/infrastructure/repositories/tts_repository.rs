use crate::domain::tts::{AudioFormat, VoiceProfile, PAUSE_MARKER};
use async_trait::async_trait;
use serde::Serialize;

/// Silence inserted for a `[pause]` marker when the request sets no gap
const DEFAULT_PAUSE_MS: u32 = 700;

/// What an adapter needs to synthesize one request
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Normalized text; may contain `[pause]` markers
    pub text: String,
    pub voice: VoiceProfile,
    pub pitch: i32,
    pub rate: i32,
    pub gap_ms: u32,
}

impl ProviderRequest {
    /// Same parameters, different text (used for batching)
    pub fn with_text(&self, text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..self.clone()
        }
    }

    /// Text with pause markers turned into punctuation, for engines without SSML
    pub fn plain_text(&self) -> String {
        self.text
            .split(PAUSE_MARKER)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// SSML document with pauses as `<break>` elements.
    ///
    /// A non-zero gap adds a leading break. Prosody is only emitted for the
    /// attributes the caller says the engine understands. Pitch is relative
    /// (`+5%`); rate is absolute (`90%` of normal speed) since engines such as
    /// Polly reject signed rate values.
    pub fn ssml(&self, with_pitch: bool, with_rate: bool) -> String {
        let pause_ms = if self.gap_ms > 0 { self.gap_ms } else { DEFAULT_PAUSE_MS };
        let pause = format!(r#"<break time="{pause_ms}ms"/>"#);

        let body = self
            .text
            .split(PAUSE_MARKER)
            .map(|part| escape_xml(part.trim()))
            .collect::<Vec<_>>()
            .join(&pause);

        let mut prosody_attrs = String::new();
        if with_pitch && self.pitch != 0 {
            prosody_attrs.push_str(&format!(r#" pitch="{:+}%""#, self.pitch));
        }
        if with_rate && self.rate != 0 {
            prosody_attrs.push_str(&format!(r#" rate="{}%""#, speaking_rate_percent(self.rate)));
        }

        let mut ssml = String::from("<speak>");
        if self.gap_ms > 0 {
            ssml.push_str(&format!(r#"<break time="{}ms"/>"#, self.gap_ms));
        }
        if prosody_attrs.is_empty() {
            ssml.push_str(&body);
        } else {
            ssml.push_str(&format!("<prosody{prosody_attrs}>{body}</prosody>"));
        }
        ssml.push_str("</speak>");
        ssml
    }

    /// Voice identifier for this provider, or `Rejected` when it has none
    pub fn voice_for(&self, provider_id: &str) -> Result<&'static str, ProviderError> {
        self.voice.provider_voice(provider_id).ok_or_else(|| {
            ProviderError::Rejected(format!(
                "{} has no voice for '{}'",
                provider_id, self.voice.key
            ))
        })
    }
}

/// Rate offset in -100..=100 as a percentage of normal speed, within 20%..200%
pub fn speaking_rate_percent(rate: i32) -> i32 {
    (100 + rate).clamp(20, 200)
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Audio produced by a provider, labelled with the format it actually is
#[derive(Debug, Clone)]
pub struct ProviderAudio {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

/// Uniform failure classes every adapter maps its native errors onto
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Network or connection failure, dead subprocess
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// Provider is still loading; worth retrying after the hinted delay
    #[error("busy, retry in {retry_after_secs}s: {detail}")]
    Busy { retry_after_secs: u64, detail: String },
    /// Bad input, missing configuration, unsupported voice. Not retryable.
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("timed out: {0}")]
    Timeout(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Unavailable,
    Busy,
    Rejected,
    Timeout,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::Unavailable => "unavailable",
            ProviderErrorKind::Busy => "busy",
            ProviderErrorKind::Rejected => "rejected",
            ProviderErrorKind::Timeout => "timeout",
        }
    }
}

impl ProviderError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Unavailable(_) => ProviderErrorKind::Unavailable,
            ProviderError::Busy { .. } => ProviderErrorKind::Busy,
            ProviderError::Rejected(_) => ProviderErrorKind::Rejected,
            ProviderError::Timeout(_) => ProviderErrorKind::Timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderCapabilities {
    pub supports_pitch: bool,
    pub supports_rate: bool,
    pub supports_voice_list: bool,
}

/// Static description of a configured provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub priority: usize,
    pub capabilities: ProviderCapabilities,
}

impl ProviderDescriptor {
    pub fn new(id: &str, priority: usize, capabilities: ProviderCapabilities) -> Self {
        Self {
            id: id.to_string(),
            priority,
            capabilities,
        }
    }
}

/// Advisory health, reported by the status endpoint only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderHealth {
    Ready,
    Starting,
    Unavailable,
    NotConfigured,
}

/// Repository for TTS synthesis operations.
/// Abstracts one TTS backend (AWS Polly, OpenAI, a local engine, ...).
///
/// Implementations are responsible for:
/// - Shaping the provider-specific payload (auth, voice names, SSML)
/// - Reporting the real format of the returned audio
/// - Normalizing every failure into a [`ProviderError`]
///
/// Implementations must not mutate shared state beyond their own backend call.
#[async_trait]
pub trait TtsRepository: Send + Sync {
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Synthesize the request into a single audio payload
    async fn synthesize(&self, request: &ProviderRequest) -> Result<ProviderAudio, ProviderError>;

    async fn health(&self) -> ProviderHealth {
        ProviderHealth::Ready
    }
}
