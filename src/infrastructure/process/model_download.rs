use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Public Piper voice repository; files live under `{lang}/{locale}/{speaker}/{quality}/`
pub const PIPER_VOICES_URL: &str = "https://huggingface.co/rhasspy/piper-voices/resolve/v1.0.0";

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("invalid model name '{0}'")]
    InvalidName(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not write model file: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches Piper voice models (`.onnx` plus its `.onnx.json` config) into a
/// local directory.
///
/// Files are streamed into a hidden `.part` file next to the target and only
/// renamed into place once complete, so a half-written model is never
/// picked up by the server.
#[derive(Debug, Clone)]
pub struct ModelDownloader {
    http: reqwest::Client,
    base_url: String,
    dir: PathBuf,
}

impl ModelDownloader {
    pub fn new(http: reqwest::Client, base_url: &str, dir: impl Into<PathBuf>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            dir: dir.into(),
        }
    }

    pub fn model_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.onnx", name))
    }

    fn config_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.onnx.json", name))
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.model_path(name).is_file() && self.config_path(name).is_file()
    }

    /// `en_US-lessac-medium` lives at `en/en_US/lessac/medium/en_US-lessac-medium.onnx`,
    /// `hi_IN-medium` at `hi/hi_IN/medium/hi_IN-medium.onnx`
    pub fn model_url(&self, name: &str) -> Result<String, DownloadError> {
        let invalid = || DownloadError::InvalidName(name.to_string());

        let mut parts = name.split('-');
        let locale = parts.next().filter(|l| !l.is_empty()).ok_or_else(invalid)?;
        let language = locale
            .split('_')
            .next()
            .filter(|l| l.len() == 2)
            .ok_or_else(invalid)?;
        let rest: Vec<&str> = parts.collect();
        if rest.is_empty() || rest.iter().any(|p| p.is_empty() || p.contains('/')) {
            return Err(invalid());
        }

        Ok(format!(
            "{}/{}/{}/{}/{}.onnx",
            self.base_url,
            language,
            locale,
            rest.join("/"),
            name
        ))
    }

    /// Download the model unless both files are already on disk.
    /// Returns the path of the `.onnx` file.
    pub async fn ensure(&self, name: &str) -> Result<PathBuf, DownloadError> {
        let model_path = self.model_path(name);
        if self.is_present(name) {
            return Ok(model_path);
        }

        let model_url = self.model_url(name)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let started = std::time::Instant::now();
        tracing::info!(model = name, url = %model_url, "Downloading Piper model");

        let config_path = self.config_path(name);
        if !config_path.is_file() {
            self.fetch(&format!("{}.json", model_url), &config_path).await?;
        }
        if !model_path.is_file() {
            self.fetch(&model_url, &model_path).await?;
        }

        tracing::info!(
            model = name,
            elapsed_ms = started.elapsed().as_millis(),
            "Piper model downloaded"
        );
        Ok(model_path)
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let part = dest.with_file_name(format!(".{}.{}.part", file_name, Uuid::new_v4()));

        match self.stream_to(url, &part).await {
            Ok(bytes) => {
                tokio::fs::rename(&part, dest).await?;
                tracing::debug!(path = %dest.display(), bytes, "Model file written");
                Ok(())
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&part).await {
                    tracing::debug!(path = %part.display(), error = %remove_err, "No partial file to remove");
                }
                tracing::warn!(url, error = %e, "Model download failed");
                Err(e)
            }
        }
    }

    async fn stream_to(&self, url: &str, part: &Path) -> Result<u64, DownloadError> {
        let mut file = tokio::fs::File::create(part).await?;

        let mut response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;

        Ok(written)
    }
}
