pub mod batching;
pub mod espeak_tts_repository;
pub mod http_audio;
pub mod huggingface_tts_repository;
pub mod openai_tts_repository;
pub mod piper_tts_repository;
pub mod polly_tts_repository;
pub mod registry;
pub mod tts_repository;
pub mod unconfigured_tts_repository;

pub use espeak_tts_repository::EspeakTtsRepository;
pub use huggingface_tts_repository::HuggingFaceTtsRepository;
pub use openai_tts_repository::OpenAiTtsRepository;
pub use piper_tts_repository::PiperTtsRepository;
pub use polly_tts_repository::PollyTtsRepository;
pub use registry::{build_providers, ProviderSet};
pub use tts_repository::{
    ProviderAudio, ProviderCapabilities, ProviderDescriptor, ProviderError, ProviderErrorKind,
    ProviderHealth, ProviderRequest, TtsRepository,
};
pub use unconfigured_tts_repository::UnconfiguredTtsRepository;
