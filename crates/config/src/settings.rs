use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub sync: SyncSettings,
    pub cache: CacheSettings,
    pub presentation: PresentationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub ws_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncSettings {
    pub base_delay_ms: u64,
    pub max_retries: u32,
    pub poll_interval_ms: u64,
    pub page_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    pub backend: String,
    pub dir: Option<String>,
    pub key: String,
    pub max_entries: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PresentationSettings {
    pub max_toasts: usize,
    pub toast_ttl_ms: u64,
    pub sound_enabled: bool,
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SyncSettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl PresentationSettings {
    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::with_defaults(
            Config::builder()
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name("config/local").required(false))
                .add_source(
                    Environment::default()
                        .separator("__")
                        .prefix("BAZAAR"),
                ),
        )?
        .build()?;

        config.try_deserialize()
    }

    fn with_defaults<St>(
        builder: config::builder::ConfigBuilder<St>,
    ) -> Result<config::builder::ConfigBuilder<St>, ConfigError>
    where
        St: config::builder::BuilderState,
    {
        builder
            .set_default("api.base_url", "http://localhost:3000/api")?
            .set_default("api.ws_url", "ws://localhost:3000/ws")?
            .set_default("api.request_timeout_secs", 15)?
            .set_default("sync.base_delay_ms", 3000)?
            .set_default("sync.max_retries", 5)?
            .set_default("sync.poll_interval_ms", 30_000)?
            .set_default("sync.page_size", 20)?
            .set_default("cache.backend", "file")?
            .set_default("cache.dir", None::<String>)?
            .set_default("cache.key", "notifications")?
            .set_default("cache.max_entries", 50)?
            .set_default("presentation.max_toasts", 5)?
            .set_default("presentation.toast_ttl_ms", 5000)?
            .set_default("presentation.sound_enabled", true)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                base_url: "http://localhost:3000/api".to_string(),
                ws_url: "ws://localhost:3000/ws".to_string(),
                request_timeout_secs: 15,
            },
            sync: SyncSettings {
                base_delay_ms: 3000,
                max_retries: 5,
                poll_interval_ms: 30_000,
                page_size: 20,
            },
            cache: CacheSettings {
                backend: "file".to_string(),
                dir: None,
                key: "notifications".to_string(),
                max_entries: 50,
            },
            presentation: PresentationSettings {
                max_toasts: 5,
                toast_ttl_ms: 5000,
                sound_enabled: true,
            },
        }
    }
}
