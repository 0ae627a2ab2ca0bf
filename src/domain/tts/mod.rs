pub mod audio;
pub mod dto;
pub mod error;
pub mod fallback;
pub mod fingerprint;
pub mod language;
pub mod service;
pub mod transliteration;
pub mod voices;

pub use audio::AudioFormat;
pub use dto::SynthesisRequest;
pub use error::TtsServiceError;
pub use fallback::{FailedAttempt, FallbackError, FallbackOrchestrator, SynthesisResult};
pub use fingerprint::Fingerprint;
pub use language::{detect_language, LanguageCode};
pub use service::{ProviderStatus, TtsService, TtsServiceApi, TtsSynthesisResult};
pub use voices::{Gender, StylePreset, VoiceCatalog, VoiceProfile, DEFAULT_VOICE_KEY};

/// Marker users type to request a pause between phrases
pub const PAUSE_MARKER: &str = "[pause]";
