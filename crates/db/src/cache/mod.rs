pub mod file;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DbResult;
use crate::models::Notification;

pub use file::FileCache;
pub use memory::MemoryCache;

/// The single persisted record that lets the inbox warm-start before the
/// first network round trip completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedInbox {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    #[serde(rename = "lastSuccessfulCheck", default)]
    pub last_successful_check: Option<DateTime<Utc>>,
}

/// Key/value persistence that survives restarts of the host.
///
/// Implementations are synchronous: records are small (bounded by
/// `cache.max_entries`) and written from inside the store's critical section.
pub trait DurableCache: Send + Sync {
    fn load(&self, key: &str) -> DbResult<Option<CachedInbox>>;
    fn save(&self, key: &str, inbox: &CachedInbox) -> DbResult<()>;
    fn purge(&self, key: &str) -> DbResult<()>;
}
