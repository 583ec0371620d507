use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Idle,
    Connecting,
    Open,
    Reconnecting,
    PollingFallback,
    Closed,
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionPhase::Idle => "idle",
            ConnectionPhase::Connecting => "connecting",
            ConnectionPhase::Open => "open",
            ConnectionPhase::Reconnecting => "reconnecting",
            ConnectionPhase::PollingFallback => "polling_fallback",
            ConnectionPhase::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionState {
    pub phase: ConnectionPhase,
    pub retry_count: u32,
    /// Delay before the next push attempt; set only while `Reconnecting`.
    pub reconnect_delay: Option<Duration>,
    pub last_successful_check: Option<DateTime<Utc>>,
}

impl ConnectionState {
    pub fn idle(last_successful_check: Option<DateTime<Utc>>) -> Self {
        Self {
            phase: ConnectionPhase::Idle,
            retry_count: 0,
            reconnect_delay: None,
            last_successful_check,
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::idle(None)
    }
}

/// Host page signals that drive pausing and out-of-band pulls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Visible,
    Hidden,
    Focused,
    Blurred,
}
