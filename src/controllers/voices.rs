use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::tts::{Gender, VoiceCatalog, DEFAULT_VOICE_KEY};

#[derive(Debug, Serialize, Deserialize)]
pub struct VoiceResponse {
    pub key: String,
    pub display_name: String,
    pub gender: Gender,
    pub locale: String,
    pub language: String,
    /// Other ids accepted in the `voice` field for this voice
    pub aliases: Vec<String>,
    pub providers: Vec<String>,
}

/// Style accepted in the `language` field
#[derive(Debug, Serialize, Deserialize)]
pub struct PresetResponse {
    pub key: String,
    pub display_name: String,
    pub voice: String,
    pub pitch: i32,
    pub rate: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub default: String,
    pub voices: Vec<VoiceResponse>,
    pub presets: Vec<PresetResponse>,
}

/// GET /voices - Voice catalog with the providers that can speak each voice
pub async fn list_voices() -> Json<VoicesResponse> {
    let voices = VoiceCatalog
        .all()
        .iter()
        .map(|voice| VoiceResponse {
            key: voice.key.to_string(),
            display_name: voice.display_name.to_string(),
            gender: voice.gender,
            locale: voice.locale.to_string(),
            language: voice.language.as_str().to_string(),
            aliases: voice.aliases.iter().map(|a| a.to_string()).collect(),
            providers: voice
                .supported_providers()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
        .collect();

    let presets = VoiceCatalog
        .presets()
        .iter()
        .map(|preset| PresetResponse {
            key: preset.key.to_string(),
            display_name: preset.display_name.to_string(),
            voice: preset.voice_key.to_string(),
            pitch: preset.pitch,
            rate: preset.rate,
        })
        .collect();

    Json(VoicesResponse {
        default: DEFAULT_VOICE_KEY.to_string(),
        voices,
        presets,
    })
}
