use async_trait::async_trait;
use avatar_render::domain::render::{
    RenderErrorKind, RenderRequest, RenderService, RenderServiceApi,
};
use avatar_render::error::{ProviderError, ProviderResult};
use avatar_render::infrastructure::provider::RenderJobClient;
use avatar_render::infrastructure::repositories::VideoCacheRepository;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Provider double: counts submissions and serves a scripted sequence of
/// status responses, repeating the final one once the script runs out.
struct FakeProvider {
    statuses: Mutex<Vec<ProviderResult<Value>>>,
    text_submits: Mutex<u32>,
    audio_submits: Mutex<u32>,
}

impl FakeProvider {
    fn new(statuses: Vec<ProviderResult<Value>>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses),
            text_submits: Mutex::new(0),
            audio_submits: Mutex::new(0),
        })
    }

    fn text_submits(&self) -> u32 {
        *self.text_submits.lock()
    }

    fn audio_submits(&self) -> u32 {
        *self.audio_submits.lock()
    }
}

#[async_trait]
impl RenderJobClient for FakeProvider {
    async fn submit_from_text(&self, _request: &RenderRequest) -> ProviderResult<String> {
        *self.text_submits.lock() += 1;
        Ok("job-42".to_string())
    }

    async fn submit_from_audio(&self, _request: &RenderRequest) -> ProviderResult<String> {
        *self.audio_submits.lock() += 1;
        Ok("job-42".to_string())
    }

    async fn get_status(&self, _job_id: &str) -> ProviderResult<Value> {
        let mut statuses = self.statuses.lock();
        if statuses.len() > 1 {
            statuses.remove(0)
        } else {
            statuses[0].clone()
        }
    }
}

fn service_with(
    dir: &tempfile::TempDir,
    provider: Arc<FakeProvider>,
    max_attempts: u32,
) -> RenderService {
    RenderService::new(
        provider,
        Arc::new(VideoCacheRepository::new(dir.path(), 30)),
        max_attempts,
        Duration::from_millis(10),
        false,
    )
}

#[tokio::test]
async fn render_twice_submits_once_and_hits_cache() {
    let dir = tempfile::tempdir().unwrap();
    let processing = json!({ "status": "processing" });
    let provider = FakeProvider::new(vec![
        Ok(processing.clone()),
        Ok(processing),
        Ok(json!({
            "status": "completed",
            "nested": { "asset": { "href": "https://cdn.example.com/x.mp4" } }
        })),
    ]);
    let service = service_with(&dir, provider.clone(), 10);
    let request = RenderRequest::from_text("Hello world", "A1");

    let first = service.render(request.clone()).await.unwrap();
    assert_eq!(first.video_url, "https://cdn.example.com/x.mp4");
    assert!(!first.cached);
    assert!(!first.degraded);

    let second = service.render(request).await.unwrap();
    assert_eq!(second.video_url, first.video_url);
    assert!(second.cached);
    assert_eq!(provider.text_submits(), 1);
}

#[tokio::test]
async fn landing_page_result_is_degraded_and_never_cached() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeProvider::new(vec![Ok(json!({
        "status": "completed",
        "url": "https://app.heygen.com/videos/abc"
    }))]);
    let service = service_with(&dir, provider.clone(), 3);
    let request = RenderRequest::from_text("Hello world", "A1");

    let outcome = service.render(request.clone()).await.unwrap();
    assert_eq!(outcome.video_url, "https://app.heygen.com/videos/abc");
    assert!(outcome.degraded);
    assert!(!outcome.cached);

    // Nothing was cached, so a repeat render submits a fresh job.
    service.render(request).await.unwrap();
    assert_eq!(provider.text_submits(), 2);
    assert_eq!(service.cache_stats().await.count, 0);
}

#[tokio::test]
async fn direct_url_during_processing_returns_without_further_polling() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeProvider::new(vec![Ok(json!({
        "status": "processing",
        "video_url": "https://d1.cloudfront.net/abc.mp4"
    }))]);
    let service = service_with(&dir, provider, 120);

    let outcome = service
        .render(RenderRequest::from_text("Quick return", "A1"))
        .await
        .unwrap();
    assert_eq!(outcome.video_url, "https://d1.cloudfront.net/abc.mp4");
    assert!(!outcome.degraded);
}

#[tokio::test]
async fn provider_failure_surfaces_resolved_message() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeProvider::new(vec![Ok(json!({
        "status": "failed",
        "error": {
            "code": "MOVIO_PAYMENT_INSUFFICIENT_CREDIT",
            "message": "Insufficient credit"
        }
    }))]);
    let service = service_with(&dir, provider, 5);

    let err = service
        .render(RenderRequest::from_text("Hello", "A1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), RenderErrorKind::ProviderFailure);
    assert!(err.to_string().contains("insufficient credit"));
}

#[tokio::test]
async fn stuck_job_times_out_and_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeProvider::new(vec![Ok(json!({ "status": "processing" }))]);
    let service = service_with(&dir, provider, 4);

    let err = service
        .render(RenderRequest::from_text("Hello", "A1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), RenderErrorKind::Timeout);
    assert_eq!(service.cache_stats().await.count, 0);
}

#[tokio::test]
async fn audio_variant_submits_audio_job_and_caches_by_audio_url() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeProvider::new(vec![Ok(json!({
        "status": "completed",
        "video_url": "https://cdn.example.com/lipsync.mp4"
    }))]);
    let service = service_with(&dir, provider.clone(), 5);
    let request = RenderRequest::from_audio("https://audio.example.com/a.wav", "A1");

    let first = service.render(request.clone()).await.unwrap();
    assert_eq!(first.video_url, "https://cdn.example.com/lipsync.mp4");
    assert_eq!(provider.audio_submits(), 1);
    assert_eq!(provider.text_submits(), 0);

    let second = service.render(request).await.unwrap();
    assert!(second.cached);
    assert_eq!(provider.audio_submits(), 1);
}

#[tokio::test]
async fn render_succeeds_when_cache_write_fails() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file at the cache path forces every write to fail; the
    // render must still complete as rendered-but-not-cached.
    let blocked = dir.path().join("not-a-dir");
    tokio::fs::write(&blocked, "occupied").await.unwrap();

    let provider = FakeProvider::new(vec![Ok(json!({
        "status": "completed",
        "video_url": "https://cdn.example.com/x.mp4"
    }))]);
    let service = RenderService::new(
        provider.clone(),
        Arc::new(VideoCacheRepository::new(blocked, 30)),
        5,
        Duration::from_millis(10),
        false,
    );

    let outcome = service
        .render(RenderRequest::from_text("Hello world", "A1"))
        .await
        .unwrap();
    assert_eq!(outcome.video_url, "https://cdn.example.com/x.mp4");
    assert!(!outcome.cached);

    // Nothing was persisted, so a repeat render submits a fresh job.
    service
        .render(RenderRequest::from_text("Hello world", "A1"))
        .await
        .unwrap();
    assert_eq!(provider.text_submits(), 2);
}

#[tokio::test]
async fn transport_error_mid_poll_does_not_abort_render() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeProvider::new(vec![
        Err(ProviderError::Transport("connection reset".to_string())),
        Ok(json!({
            "status": "completed",
            "video_url": "https://cdn.example.com/x.mp4"
        })),
    ]);
    let service = service_with(&dir, provider, 10);

    let outcome = service
        .render(RenderRequest::from_text("Hello", "A1"))
        .await
        .unwrap();
    assert_eq!(outcome.video_url, "https://cdn.example.com/x.mp4");
}

#[tokio::test]
async fn memory_layer_serves_repeat_lookups_without_disk() {
    let dir = tempfile::tempdir().unwrap();
    let provider = FakeProvider::new(vec![Ok(json!({
        "status": "completed",
        "video_url": "https://cdn.example.com/x.mp4"
    }))]);
    let service = RenderService::new(
        provider.clone(),
        Arc::new(VideoCacheRepository::new(dir.path(), 30)),
        5,
        Duration::from_millis(10),
        true,
    );
    let request = RenderRequest::from_text("Hello world", "A1");

    service.render(request.clone()).await.unwrap();

    // Even with the disk entry gone, the read-through layer answers; after
    // maintenance drops it, the render resubmits.
    let fingerprint = VideoCacheRepository::fingerprint("Hello world", "A1");
    tokio::fs::remove_file(dir.path().join(format!("{fingerprint}.json")))
        .await
        .unwrap();

    let cached = service.render(request.clone()).await.unwrap();
    assert!(cached.cached);
    assert_eq!(provider.text_submits(), 1);

    service.clear_cache().await;
    service.render(request).await.unwrap();
    assert_eq!(provider.text_submits(), 2);
}
