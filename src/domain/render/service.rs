use crate::infrastructure::provider::RenderJobClient;
use crate::infrastructure::repositories::{CacheStats, StoreOutcome, VideoCacheRepository};
use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::error::RenderError;
use super::poller::JobCompletionPoller;
use super::{RenderJob, RenderOutcome, RenderRequest};

const MEMORY_CACHE_CAPACITY: u64 = 100;
const MEMORY_CACHE_IDLE: Duration = Duration::from_secs(30 * 60);

/// Top-level render pipeline: cache lookup, job submission, polling, and
/// write-back. The single entry point consumed by the UI layer.
pub struct RenderService {
    client: Arc<dyn RenderJobClient>,
    cache: Arc<VideoCacheRepository>,
    poller: JobCompletionPoller,
    // Read-through optimization only; the file cache stays the source of
    // truth and this layer is dropped wholesale on any maintenance call.
    memory: Option<Cache<String, String>>,
}

impl RenderService {
    pub fn new(
        client: Arc<dyn RenderJobClient>,
        cache: Arc<VideoCacheRepository>,
        poll_max_attempts: u32,
        poll_interval: Duration,
        memory_cache_enabled: bool,
    ) -> Self {
        let memory = if memory_cache_enabled {
            Some(
                Cache::builder()
                    .max_capacity(MEMORY_CACHE_CAPACITY)
                    .time_to_idle(MEMORY_CACHE_IDLE)
                    .build(),
            )
        } else {
            None
        };

        Self {
            client: client.clone(),
            cache,
            poller: JobCompletionPoller::new(client, poll_max_attempts, poll_interval),
            memory,
        }
    }
}

#[async_trait]
pub trait RenderServiceApi: Send + Sync {
    /// Render a talking-avatar video for the request.
    ///
    /// This operation:
    /// - Validates input before any network call
    /// - Returns a cached URL when one exists for (spoken content, avatar)
    /// - Otherwise submits a provider job, polls it to completion, and
    ///   caches the playable result best-effort
    ///
    /// Concurrent calls for the same fingerprint are not de-duplicated: each
    /// submits its own provider job and the last cache write wins.
    async fn render(&self, request: RenderRequest) -> Result<RenderOutcome, RenderError>;
}

#[async_trait]
impl RenderServiceApi for RenderService {
    async fn render(&self, request: RenderRequest) -> Result<RenderOutcome, RenderError> {
        // 1. Validate before touching the network.
        let spoken = validate(&request)?;

        tracing::info!(
            avatar_id = %request.avatar_id,
            spoken_length = spoken.len(),
            audio_driven = request.audio_source_url.is_some(),
            "Render requested"
        );

        // 2. Cache lookup (memory layer first, then disk).
        let fingerprint = VideoCacheRepository::fingerprint(spoken, &request.avatar_id);

        if let Some(memory) = &self.memory {
            if let Some(video_url) = memory.get(&fingerprint).await {
                tracing::info!(fingerprint = %fingerprint, "Memory cache hit");
                return Ok(RenderOutcome {
                    video_url,
                    cached: true,
                    degraded: false,
                });
            }
        }

        if let Some(entry) = self.cache.lookup(&fingerprint).await {
            tracing::info!(
                fingerprint = %fingerprint,
                video_url = %entry.video_url,
                "Cache hit, no provider call"
            );
            if let Some(memory) = &self.memory {
                memory.insert(fingerprint, entry.video_url.clone()).await;
            }
            return Ok(RenderOutcome {
                video_url: entry.video_url,
                cached: true,
                degraded: false,
            });
        }

        // 3. Submit a new job.
        let submission = if request.audio_source_url.is_some() {
            self.client.submit_from_audio(&request).await
        } else {
            self.client.submit_from_text(&request).await
        };

        let job = match submission {
            Ok(job_id) => RenderJob {
                job_id,
                request: request.clone(),
                submitted_at: Utc::now(),
            },
            Err(err) => {
                tracing::error!(error = %err, "Job submission failed");
                return Err(RenderError::ProviderFailure(format!(
                    "Video generation could not be started: {err}"
                )));
            }
        };

        tracing::info!(
            job_id = %job.job_id,
            submitted_at = %job.submitted_at,
            "Render job submitted"
        );

        // 4. Poll to completion; poller errors propagate unchanged.
        let polled = self.poller.wait_until_ready(&job.job_id).await?;

        // 5. Write back, best-effort. A degraded landing-page URL is rejected
        //    by the repository, so it can never become a permanent dead end.
        match self
            .cache
            .store(&fingerprint, &polled.url, Some(&job.job_id))
            .await
        {
            StoreOutcome::Stored => {
                if let Some(memory) = &self.memory {
                    memory.insert(fingerprint, polled.url.clone()).await;
                }
            }
            StoreOutcome::Rejected => {
                tracing::warn!(job_id = %job.job_id, "Result not cached (unplayable URL)");
            }
            StoreOutcome::Failed(err) => {
                tracing::warn!(job_id = %job.job_id, error = %err, "Result not cached");
            }
        }

        Ok(RenderOutcome {
            video_url: polled.url,
            cached: false,
            degraded: polled.degraded,
        })
    }
}

impl RenderService {
    /// Purge unusable and unparsable cache entries. Invoked at application
    /// startup and on demand from diagnostics.
    pub async fn sweep_invalid(&self) -> usize {
        self.invalidate_memory().await;
        self.cache.sweep_invalid().await
    }

    /// Purge entries past the retention window.
    pub async fn sweep_expired(&self) -> usize {
        self.invalidate_memory().await;
        self.cache.sweep_expired().await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn clear_cache(&self) -> usize {
        self.invalidate_memory().await;
        self.cache.clear_all().await
    }

    async fn invalidate_memory(&self) {
        if let Some(memory) = &self.memory {
            memory.invalidate_all();
        }
    }
}

fn validate(request: &RenderRequest) -> Result<&str, RenderError> {
    if request.avatar_id.trim().is_empty() {
        return Err(RenderError::InvalidInput(
            "Please choose an avatar.".to_string(),
        ));
    }

    if request.text.is_some() && request.audio_source_url.is_some() {
        return Err(RenderError::InvalidInput(
            "Provide either text or an audio source, not both.".to_string(),
        ));
    }

    request.spoken_source().ok_or_else(|| {
        RenderError::InvalidInput("Please enter some text to speak.".to_string())
    })
}
