use super::audio_store::{AudioStore, StoredAudio};
use crate::domain::tts::{AudioFormat, Fingerprint};
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const MAX_ENTRIES: u64 = 10_000;

/// Pointer to a stored audio file for one fingerprint
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub audio_path: PathBuf,
    pub file_name: String,
    pub format: AudioFormat,
    pub source_provider_id: String,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn from_stored(fingerprint: Fingerprint, stored: StoredAudio) -> Self {
        Self {
            fingerprint,
            audio_path: stored.path,
            file_name: stored.file_name,
            format: stored.format,
            source_provider_id: stored.provider_id,
            created_at: stored.modified,
        }
    }

    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.created_at);
        match age.to_std() {
            Ok(age) => age < ttl,
            // created_at slightly in the future (clock skew on mtime)
            Err(_) => true,
        }
    }
}

/// Fingerprint -> stored audio, valid for `ttl`.
///
/// moka expires entries on its own schedule; `lookup` also checks the age
/// explicitly so an entry is never served past its TTL. On an in-memory miss
/// the audio directory is searched, which lets cached audio survive restarts.
pub struct ResponseCache {
    entries: Cache<Fingerprint, CacheEntry>,
    store: Arc<AudioStore>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<AudioStore>, ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .build();

        Self { entries, store, ttl }
    }

    pub async fn lookup(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        let now = Utc::now();

        if let Some(entry) = self.entries.get(fingerprint).await {
            if entry.is_fresh(self.ttl, now) {
                return Some(entry);
            }
            self.entries.invalidate(fingerprint).await;
            return None;
        }

        let stored = match self.store.find(fingerprint).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(fingerprint = %fingerprint, error = %e, "Failed to search audio directory");
                return None;
            }
        };

        let entry = CacheEntry::from_stored(fingerprint.clone(), stored);
        if !entry.is_fresh(self.ttl, now) {
            return None;
        }

        tracing::debug!(
            fingerprint = %fingerprint,
            provider = %entry.source_provider_id,
            "Cache entry rehydrated from disk"
        );
        self.entries.insert(fingerprint.clone(), entry.clone()).await;
        Some(entry)
    }

    /// Last write wins
    pub async fn store(&self, fingerprint: Fingerprint, entry: CacheEntry) {
        self.entries.insert(fingerprint, entry).await;
    }

    pub async fn invalidate(&self, fingerprint: &Fingerprint) {
        self.entries.invalidate(fingerprint).await;
    }

    /// Drop the in-memory index; files on disk are left alone
    pub fn clear_memory(&self) {
        self.entries.invalidate_all();
    }
}
