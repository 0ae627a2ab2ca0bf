use crate::domain::tts::{AudioFormat, Fingerprint};
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A synthesized file found on disk
#[derive(Debug, Clone)]
pub struct StoredAudio {
    pub path: PathBuf,
    pub file_name: String,
    pub format: AudioFormat,
    pub provider_id: String,
    pub modified: DateTime<Utc>,
}

/// Directory of generated audio, one file per fingerprint.
///
/// Files are named `<fingerprint>.<provider>.<ext>`. Writes go through a
/// hidden temporary file and a rename, so readers and the janitor never see a
/// partially written file.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
}

impl AudioStore {
    pub async fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(fingerprint: &Fingerprint, provider_id: &str, format: AudioFormat) -> String {
        format!("{}.{}.{}", fingerprint, provider_id, format.extension())
    }

    pub async fn write(
        &self,
        fingerprint: &Fingerprint,
        provider_id: &str,
        format: AudioFormat,
        bytes: &[u8],
    ) -> io::Result<StoredAudio> {
        let file_name = Self::file_name(fingerprint, provider_id, format);
        let path = self.dir.join(&file_name);
        let tmp_path = self.dir.join(format!(".{}.{}.tmp", fingerprint, Uuid::new_v4()));

        tokio::fs::write(&tmp_path, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        tracing::debug!(path = %path.display(), size = bytes.len(), "Audio stored");

        Ok(StoredAudio {
            path,
            file_name,
            format,
            provider_id: provider_id.to_string(),
            modified: Utc::now(),
        })
    }

    pub async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    /// Most recent file stored for a fingerprint, if any
    pub async fn find(&self, fingerprint: &Fingerprint) -> io::Result<Option<StoredAudio>> {
        let prefix = format!("{}.", fingerprint);
        let mut newest: Option<StoredAudio> = None;

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().to_string();
            if !file_name.starts_with(&prefix) {
                continue;
            }
            let Some(found) = self.describe(&file_name).await else {
                continue;
            };
            if newest.as_ref().map_or(true, |n| found.modified > n.modified) {
                newest = Some(found);
            }
        }

        Ok(newest)
    }

    /// Resolve a public file name to a stored file.
    ///
    /// Only names this store produces are accepted, which rules out path
    /// traversal through the `/audio/:file_name` route.
    pub async fn locate(&self, file_name: &str) -> Option<StoredAudio> {
        self.describe(file_name).await
    }

    async fn describe(&self, file_name: &str) -> Option<StoredAudio> {
        let mut parts = file_name.split('.');
        let fingerprint = Fingerprint::parse(parts.next()?)?;
        let provider_id = parts.next()?;
        let format = AudioFormat::from_extension(parts.next()?)?;
        if parts.next().is_some()
            || provider_id.is_empty()
            || !provider_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return None;
        }

        let path = self.dir.join(file_name);
        let metadata = tokio::fs::metadata(&path).await.ok()?;
        if !metadata.is_file() {
            return None;
        }
        let modified = metadata.modified().ok()?;

        Some(StoredAudio {
            file_name: Self::file_name(&fingerprint, provider_id, format),
            path,
            format,
            provider_id: provider_id.to_string(),
            modified: DateTime::<Utc>::from(modified),
        })
    }
}
