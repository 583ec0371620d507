use std::time::Duration;

use bazaar_config::SyncSettings;

/// Linear reconnect backoff: the n-th retry waits `base_delay × n`. Growth is
/// uncapped, but after `max_retries` failures the push channel is abandoned
/// for the rest of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_retries: u32,
}

impl ReconnectPolicy {
    pub fn new(base_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_retries,
        }
    }

    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.base_delay.saturating_mul(retry_count)
    }

    pub fn exhausted(&self, retry_count: u32) -> bool {
        retry_count >= self.max_retries
    }
}

impl From<&SyncSettings> for ReconnectPolicy {
    fn from(settings: &SyncSettings) -> Self {
        Self::new(settings.base_delay(), settings.max_retries)
    }
}
