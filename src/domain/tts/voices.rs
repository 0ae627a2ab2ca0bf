use super::language::LanguageCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// A logical voice key and the identifier each provider uses for it.
///
/// `None` means the provider has no suitable voice for this key; the
/// provider is then skipped for requests using it.
#[derive(Debug, Clone, Copy)]
pub struct VoiceProfile {
    pub key: &'static str,
    pub display_name: &'static str,
    pub gender: Gender,
    pub locale: &'static str,
    pub language: LanguageCode,
    /// Neural voice ids older clients send (e.g. `en-US-JennyNeural`)
    pub aliases: &'static [&'static str],
    pub polly: Option<&'static str>,
    pub openai: Option<&'static str>,
    pub huggingface: Option<&'static str>,
    pub piper: Option<&'static str>,
    pub espeak: Option<&'static str>,
}

impl VoiceProfile {
    /// Voice identifier for a provider id, if that provider supports this voice
    pub fn provider_voice(&self, provider_id: &str) -> Option<&'static str> {
        match provider_id {
            "polly" => self.polly,
            "openai" => self.openai,
            "huggingface" => self.huggingface,
            "piper" => self.piper,
            "espeak" => self.espeak,
            _ => None,
        }
    }

    pub fn supported_providers(&self) -> Vec<&'static str> {
        ["polly", "openai", "huggingface", "piper", "espeak"]
            .into_iter()
            .filter(|id| self.provider_voice(id).is_some())
            .collect()
    }
}

pub const DEFAULT_VOICE_KEY: &str = "en-us-female";

const VOICES: &[VoiceProfile] = &[
    VoiceProfile {
        key: "en-us-female",
        display_name: "Jenny (US English, female)",
        gender: Gender::Female,
        locale: "en-US",
        language: LanguageCode::English,
        aliases: &["en-US-JennyNeural", "en-US-AriaNeural", "en-US-MichelleNeural", "en-US-SaraNeural"],
        polly: Some("Joanna"),
        openai: Some("nova"),
        huggingface: Some("facebook/mms-tts-eng"),
        piper: Some("en_US-kathleen-medium"),
        espeak: Some("en-us+f3"),
    },
    VoiceProfile {
        key: "en-us-male",
        display_name: "Guy (US English, male)",
        gender: Gender::Male,
        locale: "en-US",
        language: LanguageCode::English,
        aliases: &["en-US-GuyNeural", "en-US-DavisNeural", "en-US-JasonNeural", "en-US-TonyNeural"],
        polly: Some("Matthew"),
        openai: Some("onyx"),
        huggingface: Some("facebook/mms-tts-eng"),
        piper: Some("en_US-lessac-medium"),
        espeak: Some("en-us+m3"),
    },
    VoiceProfile {
        key: "en-gb-female",
        display_name: "Sonia (British English, female)",
        gender: Gender::Female,
        locale: "en-GB",
        language: LanguageCode::English,
        aliases: &["en-GB-LibbyNeural", "en-GB-SoniaNeural"],
        polly: Some("Amy"),
        openai: Some("shimmer"),
        huggingface: Some("facebook/mms-tts-eng"),
        piper: None,
        espeak: Some("en-gb+f3"),
    },
    VoiceProfile {
        key: "en-gb-male",
        display_name: "Ryan (British English, male)",
        gender: Gender::Male,
        locale: "en-GB",
        language: LanguageCode::English,
        aliases: &["en-GB-RyanNeural", "en-GB-ThomasNeural"],
        polly: Some("Brian"),
        openai: Some("echo"),
        huggingface: Some("facebook/mms-tts-eng"),
        piper: Some("en_GB-semaine-medium"),
        espeak: Some("en-gb+m3"),
    },
    VoiceProfile {
        key: "hi-in-female",
        display_name: "Swara (Hindi, female)",
        gender: Gender::Female,
        locale: "hi-IN",
        language: LanguageCode::Hindi,
        aliases: &["hi-IN-SwaraNeural"],
        polly: Some("Aditi"),
        openai: Some("nova"),
        huggingface: Some("facebook/mms-tts-hin"),
        piper: None,
        espeak: Some("hi+f3"),
    },
    VoiceProfile {
        key: "hi-in-male",
        display_name: "Madhur (Hindi, male)",
        gender: Gender::Male,
        locale: "hi-IN",
        language: LanguageCode::Hindi,
        aliases: &["hi-IN-MadhurNeural"],
        polly: None,
        openai: Some("onyx"),
        huggingface: Some("facebook/mms-tts-hin"),
        piper: Some("hi_IN-medium"),
        espeak: Some("hi+m3"),
    },
    VoiceProfile {
        key: "ur-pk-female",
        display_name: "Uzma (Urdu, female)",
        gender: Gender::Female,
        locale: "ur-PK",
        language: LanguageCode::Urdu,
        aliases: &["ur-PK-UzmaNeural"],
        polly: None,
        openai: Some("nova"),
        huggingface: Some("facebook/mms-tts-urd-script_arabic"),
        piper: None,
        espeak: Some("ur+f3"),
    },
    VoiceProfile {
        key: "ur-pk-male",
        display_name: "Asad (Urdu, male)",
        gender: Gender::Male,
        locale: "ur-PK",
        language: LanguageCode::Urdu,
        aliases: &["ur-PK-AsadNeural"],
        polly: None,
        openai: Some("onyx"),
        huggingface: Some("facebook/mms-tts-urd-script_arabic"),
        piper: Some("ur_PK-medium"),
        espeak: Some("ur+m3"),
    },
];

/// A named speaking style: a fixed voice plus prosody defaults.
///
/// Selected through the `language` field; any gender on the request is
/// ignored. The defaults only fill in pitch or rate the request left at 0.
#[derive(Debug, Clone, Copy)]
pub struct StylePreset {
    pub key: &'static str,
    pub display_name: &'static str,
    pub voice_key: &'static str,
    pub pitch: i32,
    pub rate: i32,
}

impl StylePreset {
    pub fn voice(&self) -> &'static VoiceProfile {
        VoiceCatalog.find(self.voice_key).unwrap_or(&VOICES[0])
    }

    /// Effective (pitch, rate) for a request's values
    pub fn apply(&self, pitch: i32, rate: i32) -> (i32, i32) {
        (
            if pitch == 0 { self.pitch } else { pitch },
            if rate == 0 { self.rate } else { rate },
        )
    }
}

const PRESETS: &[StylePreset] = &[
    StylePreset {
        key: "story",
        display_name: "Storyteller",
        voice_key: "en-gb-female",
        pitch: -5,
        rate: -5,
    },
    StylePreset {
        key: "horror",
        display_name: "Horror",
        voice_key: "en-us-male",
        pitch: -20,
        rate: -10,
    },
    StylePreset {
        key: "cartoon",
        display_name: "Cartoon",
        voice_key: "en-us-female",
        pitch: 25,
        rate: 0,
    },
    StylePreset {
        key: "news",
        display_name: "News anchor",
        voice_key: "en-gb-male",
        pitch: 0,
        rate: 10,
    },
];

/// Read-only catalog of the logical voices this service exposes
#[derive(Debug, Clone, Copy, Default)]
pub struct VoiceCatalog;

impl VoiceCatalog {
    pub fn all(&self) -> &'static [VoiceProfile] {
        VOICES
    }

    /// Look a voice up by key or alias, ignoring case
    pub fn find(&self, key: &str) -> Option<&'static VoiceProfile> {
        let key = key.trim();
        VOICES.iter().find(|voice| {
            voice.key.eq_ignore_ascii_case(key)
                || voice.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(key))
        })
    }

    pub fn presets(&self) -> &'static [StylePreset] {
        PRESETS
    }

    pub fn preset(&self, name: &str) -> Option<&'static StylePreset> {
        let name = name.trim();
        PRESETS.iter().find(|preset| preset.key.eq_ignore_ascii_case(name))
    }

    /// Default voice for a language, preferring the requested gender when one is given
    pub fn default_for(
        &self,
        language: LanguageCode,
        gender: Option<Gender>,
    ) -> &'static VoiceProfile {
        let preferred = gender.unwrap_or(Gender::Female);

        VOICES
            .iter()
            .find(|voice| voice.language == language && voice.gender == preferred)
            .or_else(|| VOICES.iter().find(|voice| voice.language == language))
            .unwrap_or(&VOICES[0])
    }
}
