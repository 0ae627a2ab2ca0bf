use lingua::{Language, LanguageDetector, LanguageDetectorBuilder};
use serde::{Deserialize, Serialize};

/// ISO 639-1 language codes we have voices for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "ur")]
    Urdu,
}

impl LanguageCode {
    /// Get the ISO 639-1 code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::English => "en",
            LanguageCode::Hindi => "hi",
            LanguageCode::Urdu => "ur",
        }
    }

    /// Parse a language hint such as `en`, `en-US` or `ur_PK`
    pub fn from_hint(hint: &str) -> Option<Self> {
        let primary = hint
            .split(|c| c == '-' || c == '_')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();

        match primary.as_str() {
            "en" => Some(LanguageCode::English),
            "hi" => Some(LanguageCode::Hindi),
            "ur" => Some(LanguageCode::Urdu),
            _ => None,
        }
    }

    /// Convert lingua Language to LanguageCode. The detector is built with
    /// only the english, hindi and urdu features, so the match is exhaustive.
    pub fn from_lingua(language: Language) -> Self {
        match language {
            Language::English => LanguageCode::English,
            Language::Hindi => LanguageCode::Hindi,
            Language::Urdu => LanguageCode::Urdu,
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn build_detector() -> LanguageDetector {
    LanguageDetectorBuilder::from_languages(&[Language::English, Language::Hindi, Language::Urdu])
        .build()
}

/// Detect the language of the given text, defaulting to English
pub fn detect_language(detector: &LanguageDetector, text: &str) -> LanguageCode {
    match detector
        .detect_language_of(text)
        .map(LanguageCode::from_lingua)
    {
        Some(language) => language,
        None => {
            tracing::warn!("Could not detect language, falling back to English");
            LanguageCode::English
        }
    }
}
