use std::path::PathBuf;
use std::sync::Arc;

use bazaar_config::Settings;
use directories::ProjectDirs;
use tracing::info;

use crate::cache::{DurableCache, FileCache, MemoryCache};
use crate::error::{DbError, DbResult};

/// Builds the durable cache backend selected by `cache.backend`.
pub fn open_cache(settings: &Settings) -> DbResult<Arc<dyn DurableCache>> {
    match settings.cache.backend.as_str() {
        "memory" => {
            info!("Using in-memory notification cache");
            Ok(Arc::new(MemoryCache::new()))
        }
        "file" => {
            let dir = match &settings.cache.dir {
                Some(dir) => PathBuf::from(dir),
                None => default_cache_dir()?,
            };
            info!(dir = %dir.display(), "Using file notification cache");
            Ok(Arc::new(FileCache::new(dir)))
        }
        other => Err(DbError::UnknownBackend(other.to_string())),
    }
}

fn default_cache_dir() -> DbResult<PathBuf> {
    ProjectDirs::from("com", "bazaar", "storefront")
        .map(|dirs| dirs.data_dir().join("cache"))
        .ok_or(DbError::NoDataDir)
}
