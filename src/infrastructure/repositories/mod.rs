pub mod video_cache_repository;

pub use video_cache_repository::{CacheEntry, CacheStats, StoreOutcome, VideoCacheRepository};
