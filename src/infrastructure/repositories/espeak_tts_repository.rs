use super::tts_repository::{
    ProviderAudio, ProviderCapabilities, ProviderDescriptor, ProviderError, ProviderHealth,
    ProviderRequest, TtsRepository,
};
use crate::domain::tts::AudioFormat;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;

pub const PROVIDER_ID: &str = "espeak";

const DEFAULT_PITCH: i32 = 50;
const DEFAULT_WORDS_PER_MINUTE: i32 = 175;

/// System speech engine, run once per request.
///
/// Input is passed as SSML (`-m`) so `[pause]` markers become breaks; pitch
/// and speed go through the command-line flags.
pub struct EspeakTtsRepository {
    binary: String,
    descriptor: ProviderDescriptor,
}

impl EspeakTtsRepository {
    pub fn new(binary: String, priority: usize) -> Self {
        Self {
            binary,
            descriptor: ProviderDescriptor::new(
                PROVIDER_ID,
                priority,
                ProviderCapabilities {
                    supports_pitch: true,
                    supports_rate: true,
                    supports_voice_list: true,
                },
            ),
        }
    }
}

#[async_trait]
impl TtsRepository for EspeakTtsRepository {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn synthesize(&self, request: &ProviderRequest) -> Result<ProviderAudio, ProviderError> {
        let voice = request.voice_for(PROVIDER_ID)?;
        let args = build_args(voice, request);

        // kill_on_drop: the orchestrator's timeout drops this future
        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    ProviderError::Rejected(format!("{} is not installed", self.binary))
                }
                _ => ProviderError::Unavailable(format!("failed to run {}: {}", self.binary, e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Unavailable(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        tracing::info!(
            provider = PROVIDER_ID,
            voice = voice,
            audio_size_bytes = output.stdout.len(),
            "eSpeak synthesis completed"
        );

        Ok(ProviderAudio {
            bytes: output.stdout,
            format: AudioFormat::Wav,
        })
    }

    async fn health(&self) -> ProviderHealth {
        match Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
        {
            Ok(status) if status.success() => ProviderHealth::Ready,
            Ok(_) => ProviderHealth::Unavailable,
            Err(e) if e.kind() == ErrorKind::NotFound => ProviderHealth::NotConfigured,
            Err(_) => ProviderHealth::Unavailable,
        }
    }
}

/// Command line for one request; the SSML document is the last argument
fn build_args(voice: &str, request: &ProviderRequest) -> Vec<String> {
    let pitch = (DEFAULT_PITCH + request.pitch / 2).clamp(0, 99);
    let speed = (DEFAULT_WORDS_PER_MINUTE * (100 + request.rate) / 100).clamp(80, 450);

    vec![
        "--stdout".to_string(),
        "-v".to_string(),
        voice.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-s".to_string(),
        speed.to_string(),
        "-m".to_string(),
        request.ssml(false, false),
    ]
}
