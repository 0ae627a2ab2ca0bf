use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;

/// `tokio::time::interval` panics on a zero period
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Deletes generated audio older than the retention window
#[derive(Debug, Clone)]
pub struct FileJanitor {
    dir: PathBuf,
    retention: Duration,
    interval: Duration,
}

impl FileJanitor {
    pub fn new(dir: impl Into<PathBuf>, retention: Duration, interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            retention,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// One pass over the directory. Returns the number of files removed.
    ///
    /// Never fails: unreadable entries and failed deletes are logged and
    /// skipped.
    pub async fn sweep(&self) -> usize {
        let now = SystemTime::now();
        let mut removed = 0;

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "Janitor could not read audio directory");
                return 0;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Janitor failed to read directory entry");
                    break;
                }
            };

            let path = entry.path();
            let modified = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata.modified(),
                Ok(_) => continue,
                Err(e) => Err(e),
            };
            let age = match modified {
                Ok(modified) => now.duration_since(modified).unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Janitor could not stat file");
                    continue;
                }
            };

            if age <= self.retention {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    removed += 1;
                    tracing::debug!(path = %path.display(), age_secs = age.as_secs(), "Expired audio removed");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Janitor failed to remove file");
                }
            }
        }

        if removed > 0 {
            tracing::info!(removed, dir = %self.dir.display(), "Audio cleanup finished");
        }
        removed
    }

    /// Run `sweep` every interval on its own task, starting immediately
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.sweep().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn write_aged(dir: &std::path::Path, name: &str, age: Duration) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"audio").unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_files() {
        let dir = tempfile::tempdir().unwrap();
        let old = write_aged(dir.path(), "old.polly.mp3", Duration::from_secs(700));
        let fresh = write_aged(dir.path(), "fresh.polly.mp3", Duration::from_secs(60));

        let janitor = FileJanitor::new(dir.path(), Duration::from_secs(600), Duration::from_secs(600));
        let removed = janitor.sweep().await;

        assert_eq!(removed, 1);
        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[tokio::test]
    async fn test_sweep_missing_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let janitor = FileJanitor::new(
            dir.path().join("missing"),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert_eq!(janitor.sweep().await, 0);
    }

    #[tokio::test]
    async fn test_sweep_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let janitor = FileJanitor::new(dir.path(), Duration::ZERO, Duration::from_secs(1));
        assert_eq!(janitor.sweep().await, 0);
        assert!(dir.path().join("nested").exists());
    }

    #[tokio::test]
    async fn test_spawned_janitor_sweeps() {
        let dir = tempfile::tempdir().unwrap();
        let old = write_aged(dir.path(), "old.espeak.wav", Duration::from_secs(700));

        let handle = FileJanitor::new(dir.path(), Duration::from_secs(600), Duration::from_millis(10)).spawn();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(!old.exists());
    }

    #[tokio::test]
    async fn test_zero_interval_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let old = write_aged(dir.path(), "old.piper.wav", Duration::from_secs(700));

        let handle = FileJanitor::new(dir.path(), Duration::from_secs(600), Duration::ZERO).spawn();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!handle.is_finished(), "janitor task should still be running");
        handle.abort();
        assert!(!old.exists());
    }
}
