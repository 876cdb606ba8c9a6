use avatar_render::domain::render::{RenderRequest, RenderService, RenderServiceApi};
use avatar_render::infrastructure::config::{Config, LogFormat};
use avatar_render::infrastructure::provider::{HeygenRenderClient, RenderDefaults, RenderJobClient};
use avatar_render::infrastructure::repositories::VideoCacheRepository;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        cache_dir = %config.cache_dir.display(),
        base_url = %config.heygen_base_url,
        "Starting avatar-render"
    );

    // === DEPENDENCY INJECTION SETUP ===
    let heygen = Arc::new(HeygenRenderClient::new(
        config.heygen_base_url.clone(),
        config.heygen_api_key.clone(),
        RenderDefaults {
            width: config.video_width,
            height: config.video_height,
            background: config.video_background.clone(),
        },
    ));
    let client: Arc<dyn RenderJobClient> = heygen.clone();
    let cache = Arc::new(VideoCacheRepository::new(
        config.cache_dir.clone(),
        config.cache_retention_days,
    ));
    let service = RenderService::new(
        client,
        cache,
        config.poll_max_attempts,
        Duration::from_millis(config.poll_interval_ms),
        config.memory_cache_enabled,
    );

    // Startup maintenance: purge unusable and expired cache entries.
    let invalid = service.sweep_invalid().await;
    let expired = service.sweep_expired().await;
    let stats = service.cache_stats().await;
    tracing::info!(
        invalid_deleted = invalid,
        expired_deleted = expired,
        entries = stats.count,
        total_bytes = stats.total_bytes,
        "Cache maintenance complete"
    );

    let mut args = std::env::args().skip(1);
    let (text, avatar_id) = match (args.next(), args.next()) {
        (Some(cmd), None) if cmd == "avatars" => {
            for avatar in heygen.list_avatars().await? {
                println!(
                    "{}\t{}",
                    avatar.avatar_id,
                    avatar.avatar_name.unwrap_or_default()
                );
            }
            return Ok(());
        }
        (Some(cmd), None) if cmd == "voices" => {
            for voice in heygen.list_voices().await? {
                println!(
                    "{}\t{}\t{}",
                    voice.voice_id,
                    voice.name.unwrap_or_default(),
                    voice.language.unwrap_or_default()
                );
            }
            return Ok(());
        }
        (Some(text), Some(avatar_id)) => (text, avatar_id),
        _ => {
            eprintln!("usage: avatar-render <text> <avatar_id> [voice_id]");
            eprintln!("       avatar-render avatars | voices");
            return Ok(());
        }
    };
    let voice_id = args.next().unwrap_or_else(|| config.default_voice_id.clone());

    let request = RenderRequest::from_text(text, avatar_id).with_voice(voice_id);
    let outcome = service.render(request).await?;

    if outcome.degraded {
        tracing::warn!(
            video_url = %outcome.video_url,
            "Only a landing-page URL was obtained; not playable in a native player"
        );
    }

    println!("{}", outcome.video_url);
    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "avatar_render=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "avatar_render=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
