use dashmap::DashMap;

use super::{CachedInbox, DurableCache};
use crate::error::DbResult;

/// Process-lifetime cache, for tests and sessions that must not touch disk.
#[derive(Default)]
pub struct MemoryCache {
    records: DashMap<String, CachedInbox>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }
}

impl DurableCache for MemoryCache {
    fn load(&self, key: &str) -> DbResult<Option<CachedInbox>> {
        Ok(self.records.get(key).map(|r| r.clone()))
    }

    fn save(&self, key: &str, inbox: &CachedInbox) -> DbResult<()> {
        self.records.insert(key.to_string(), inbox.clone());
        Ok(())
    }

    fn purge(&self, key: &str) -> DbResult<()> {
        self.records.remove(key);
        Ok(())
    }
}
