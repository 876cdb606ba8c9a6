use crate::domain::render::status::{classify_url, UrlClass};
use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Persisted record of one rendered video, keyed by fingerprint.
/// Invariant: `video_url` is never a landing-page URL; `store` rejects those
/// and `lookup`/`sweep_invalid` purge any that slipped in historically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub video_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of a `store` call. `Rejected` is the sentinel for a landing-page
/// URL; `Failed` means the write itself failed, which callers treat as
/// rendered-but-not-cached.
#[derive(Debug)]
pub enum StoreOutcome {
    Stored,
    Rejected,
    Failed(StorageError),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub count: usize,
    pub total_bytes: u64,
}

/// File-per-entry persistent cache under an application-private directory.
/// One JSON document per fingerprint; entries expire after a retention window
/// and unusable or unparsable entries are purged on read and on sweep.
///
/// All operations are best-effort: storage failures degrade to a miss (reads)
/// or to not-cached (writes) and are reported through logs only. There is no
/// locking; a lookup racing a delete treats the vanished file as a miss.
pub struct VideoCacheRepository {
    cache_dir: PathBuf,
    retention: Duration,
}

impl VideoCacheRepository {
    pub fn new(cache_dir: impl Into<PathBuf>, retention_days: i64) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            retention: Duration::days(retention_days),
        }
    }

    /// Deterministic cache key over spoken content and avatar identity.
    ///
    /// No normalization is applied: distinct surface forms of the same
    /// sentence produce distinct entries by design.
    pub fn fingerprint(spoken: &str, avatar_id: &str) -> String {
        let combined = format!("{spoken}_{avatar_id}");
        Uuid::new_v5(&Uuid::NAMESPACE_OID, combined.as_bytes())
            .simple()
            .to_string()
    }

    fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.cache_dir.join(format!("{fingerprint}.json"))
    }

    /// Read the entry for `fingerprint`, purging it if it is expired or holds
    /// an unusable URL. Any storage or parse failure degrades to a miss.
    pub async fn lookup(&self, fingerprint: &str) -> Option<CacheEntry> {
        let path = self.entry_path(fingerprint);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(
                    fingerprint = %fingerprint,
                    error = %err,
                    "Cache read failed, treating as miss"
                );
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(
                    fingerprint = %fingerprint,
                    error = %err,
                    "Corrupt cache entry, deleting"
                );
                self.remove_file(&path).await;
                return None;
            }
        };

        if Utc::now() - entry.created_at > self.retention {
            tracing::info!(fingerprint = %fingerprint, "Cache entry expired, deleting");
            self.remove_file(&path).await;
            return None;
        }

        if !Self::entry_usable(&entry) {
            tracing::warn!(
                fingerprint = %fingerprint,
                video_url = %entry.video_url,
                "Cached URL is not playable, deleting"
            );
            self.remove_file(&path).await;
            return None;
        }

        tracing::debug!(
            fingerprint = %fingerprint,
            video_url = %entry.video_url,
            "Cache hit"
        );
        Some(entry)
    }

    /// Persist a rendered video URL. Landing-page URLs are rejected outright;
    /// a prior entry at the same fingerprint is overwritten.
    pub async fn store(
        &self,
        fingerprint: &str,
        video_url: &str,
        job_id: Option<&str>,
    ) -> StoreOutcome {
        if classify_url(video_url) == UrlClass::LandingPage {
            tracing::warn!(
                fingerprint = %fingerprint,
                video_url = %video_url,
                "Refusing to cache landing-page URL"
            );
            return StoreOutcome::Rejected;
        }

        let entry = CacheEntry {
            fingerprint: fingerprint.to_string(),
            video_url: video_url.to_string(),
            job_id: job_id.map(str::to_string),
            created_at: Utc::now(),
        };

        match self.write_entry(&entry).await {
            Ok(()) => {
                tracing::info!(
                    fingerprint = %fingerprint,
                    video_url = %video_url,
                    "Video cached"
                );
                StoreOutcome::Stored
            }
            Err(err) => {
                tracing::warn!(
                    fingerprint = %fingerprint,
                    error = %err,
                    "Cache write failed, result will not be cached"
                );
                StoreOutcome::Failed(err)
            }
        }
    }

    async fn write_entry(&self, entry: &CacheEntry) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let path = self.entry_path(&entry.fingerprint);
        let tmp_path = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(entry)?;

        // Write-then-rename so a crash mid-write never leaves a truncated
        // entry at the real path.
        tokio::fs::write(&tmp_path, body).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    /// Delete every entry that is unusable (landing-page or empty URL) or
    /// unparsable. Returns how many were deleted.
    pub async fn sweep_invalid(&self) -> usize {
        let mut deleted = 0;

        for path in self.entry_paths().await {
            match Self::read_entry(&path).await {
                Ok(Some(entry)) => {
                    if !Self::entry_usable(&entry) {
                        tracing::info!(
                            fingerprint = %entry.fingerprint,
                            video_url = %entry.video_url,
                            "Sweeping unusable cache entry"
                        );
                        self.remove_file(&path).await;
                        deleted += 1;
                    }
                }
                // Vanished mid-sweep; nothing to do.
                Ok(None) => {}
                Err(_) => {
                    tracing::info!(path = %path.display(), "Sweeping unparsable cache entry");
                    self.remove_file(&path).await;
                    deleted += 1;
                }
            }
        }

        if deleted > 0 {
            tracing::info!(deleted, "Invalid cache sweep complete");
        }
        deleted
    }

    /// Delete every entry older than the retention window. Unparsable entries
    /// are deleted as well. Returns how many were deleted.
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut deleted = 0;

        for path in self.entry_paths().await {
            match Self::read_entry(&path).await {
                Ok(Some(entry)) => {
                    if now - entry.created_at > self.retention {
                        self.remove_file(&path).await;
                        deleted += 1;
                    }
                }
                Ok(None) => {}
                Err(_) => {
                    self.remove_file(&path).await;
                    deleted += 1;
                }
            }
        }

        if deleted > 0 {
            tracing::info!(deleted, "Expired cache sweep complete");
        }
        deleted
    }

    /// Best-effort entry count and on-disk size.
    pub async fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();

        for path in self.entry_paths().await {
            if let Ok(metadata) = tokio::fs::metadata(&path).await {
                stats.count += 1;
                stats.total_bytes += metadata.len();
            }
        }

        stats
    }

    /// Delete every entry. Returns how many were deleted.
    pub async fn clear_all(&self) -> usize {
        let mut deleted = 0;
        for path in self.entry_paths().await {
            if tokio::fs::remove_file(&path).await.is_ok() {
                deleted += 1;
            }
        }
        tracing::info!(deleted, "Cache cleared");
        deleted
    }

    /// Delete the entry at `fingerprint`, if present.
    pub async fn clear_one(&self, fingerprint: &str) -> bool {
        tokio::fs::remove_file(self.entry_path(fingerprint))
            .await
            .is_ok()
    }

    fn entry_usable(entry: &CacheEntry) -> bool {
        !entry.video_url.trim().is_empty()
            && classify_url(&entry.video_url) != UrlClass::LandingPage
    }

    async fn read_entry(path: &Path) -> StorageResult<Option<CacheEntry>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::from(err)),
        }
    }

    async fn entry_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        let mut dir = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(dir) => dir,
            Err(_) => return paths,
        };

        while let Ok(Some(dir_entry)) = dir.next_entry().await {
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }

        paths
    }

    async fn remove_file(&self, path: &Path) {
        if let Err(err) = tokio::fs::remove_file(path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %err, "Cache delete failed");
            }
        }
    }
}
