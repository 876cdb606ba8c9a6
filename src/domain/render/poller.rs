use crate::infrastructure::provider::RenderJobClient;
use std::sync::Arc;
use std::time::Duration;

use super::error::RenderError;
use super::status::{self, JobState, StatusSnapshot};

/// A URL obtained from polling. `degraded` marks the landing-page fallback
/// taken after exhausting the attempt budget; such a URL is not playable in a
/// native player and callers must treat it as a distinct outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolledVideo {
    pub url: String,
    pub degraded: bool,
}

/// What one observed status snapshot means for the poll loop.
/// Keeping this a pure function of the snapshot makes the
/// direct-URL-preempts-status rule and the landing-page fallback rule
/// testable without any networking.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Transition {
    /// A directly playable URL was found; terminal regardless of status.
    Ready(String),
    /// The provider reported failure; terminal with a user-facing message.
    Failed(String),
    /// Only a landing-page URL is visible; remember it, keep polling.
    HoldFallback(String),
    /// Nothing usable yet; sleep and poll again.
    Wait,
}

fn evaluate(snapshot: &StatusSnapshot, payload: &serde_json::Value) -> Transition {
    // A direct media URL is authoritative even when the status field is
    // stale or ambiguous.
    if let Some(url) = snapshot.direct_url() {
        return Transition::Ready(url.to_string());
    }

    if snapshot.state == JobState::Failed {
        let detail = status::failure_detail(payload);
        return Transition::Failed(status::user_facing_failure(&detail));
    }

    if let Some(url) = snapshot.landing_url() {
        return Transition::HoldFallback(url.to_string());
    }

    Transition::Wait
}

/// Drives status queries until a playable URL appears, the provider reports
/// failure, or the attempt budget runs out.
pub struct JobCompletionPoller {
    client: Arc<dyn RenderJobClient>,
    max_attempts: u32,
    interval: Duration,
}

impl JobCompletionPoller {
    pub fn new(client: Arc<dyn RenderJobClient>, max_attempts: u32, interval: Duration) -> Self {
        Self {
            client,
            max_attempts,
            interval,
        }
    }

    /// Poll `job_id` to completion.
    ///
    /// Transport errors are treated as transient and absorbed up to the
    /// attempt budget. When attempts run out with only a landing-page URL in
    /// hand, that URL is returned as a flagged degraded success rather than
    /// failing outright; with nothing in hand the final attempt's transport
    /// error (if it failed) surfaces, otherwise the result is a timeout.
    pub async fn wait_until_ready(&self, job_id: &str) -> Result<PolledVideo, RenderError> {
        tracing::info!(
            job_id = %job_id,
            max_attempts = self.max_attempts,
            interval_ms = self.interval.as_millis() as u64,
            "Waiting for render job completion"
        );

        let mut fallback: Option<String> = None;
        let mut last_transport_error: Option<String> = None;

        for attempt in 1..=self.max_attempts {
            match self.client.get_status(job_id).await {
                Err(err) => {
                    tracing::warn!(
                        job_id = %job_id,
                        attempt,
                        error = %err,
                        "Status query failed, continuing"
                    );
                    last_transport_error = Some(err.to_string());
                }
                Ok(payload) => {
                    // A successful query supersedes any earlier transport
                    // error; only a failure on the final attempt may surface.
                    last_transport_error = None;

                    let snapshot = StatusSnapshot::from_value(&payload);
                    tracing::debug!(
                        job_id = %job_id,
                        attempt,
                        state = ?snapshot.state,
                        candidates = snapshot.candidates.len(),
                        "Status snapshot"
                    );

                    match evaluate(&snapshot, &payload) {
                        Transition::Ready(url) => {
                            tracing::info!(job_id = %job_id, attempt, url = %url, "Render ready");
                            return Ok(PolledVideo {
                                url,
                                degraded: false,
                            });
                        }
                        Transition::Failed(message) => {
                            tracing::error!(job_id = %job_id, attempt, message = %message, "Render failed");
                            return Err(RenderError::ProviderFailure(message));
                        }
                        Transition::HoldFallback(url) => {
                            // Never returned while polling continues; only a
                            // last resort after the budget is spent.
                            if fallback.is_none() {
                                tracing::warn!(
                                    job_id = %job_id,
                                    attempt,
                                    url = %url,
                                    "Only a landing-page URL so far, holding as fallback"
                                );
                            }
                            fallback.get_or_insert(url);
                        }
                        Transition::Wait => {}
                    }
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        if let Some(url) = fallback {
            tracing::warn!(
                job_id = %job_id,
                url = %url,
                "Attempts exhausted, returning landing-page URL as degraded result"
            );
            return Ok(PolledVideo {
                url,
                degraded: true,
            });
        }

        if let Some(message) = last_transport_error {
            tracing::error!(job_id = %job_id, message = %message, "Polling gave up after transport errors");
            return Err(RenderError::ProviderFailure(format!(
                "Video generation failed: {message}"
            )));
        }

        tracing::error!(job_id = %job_id, "Polling attempts exhausted with no resolution");
        Err(RenderError::Timeout)
    }
}
