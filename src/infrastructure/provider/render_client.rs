use crate::domain::render::RenderRequest;
use crate::error::ProviderResult;
use async_trait::async_trait;
use serde_json::Value;

/// Client for the remote avatar-rendering provider.
/// Abstracts job submission and status queries so the poller and pipeline can
/// be exercised against scripted implementations in tests.
///
/// Implementations are responsible for:
/// - Provider authentication (static API key header)
/// - Building the provider's submission payload from a [`RenderRequest`]
/// - Trying the provider's historical status endpoints in fallback order
/// - Extracting a human-readable message from error response bodies
///
/// Implementations hold no per-job state; job state lives at the provider and
/// is observed one status query at a time.
#[async_trait]
pub trait RenderJobClient: Send + Sync {
    /// Submit a render job whose speech is synthesized from `request.text`.
    ///
    /// Returns the provider's job id on success.
    async fn submit_from_text(&self, request: &RenderRequest) -> ProviderResult<String>;

    /// Submit a render job driven by `request.audio_source_url`.
    async fn submit_from_audio(&self, request: &RenderRequest) -> ProviderResult<String>;

    /// Query job status, returning the raw payload for normalization.
    ///
    /// The payload shape is deliberately left opaque here: the provider has
    /// shipped several incompatible shapes and normalization happens in the
    /// domain layer.
    async fn get_status(&self, job_id: &str) -> ProviderResult<Value>;
}
