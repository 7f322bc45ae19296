use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub store: StoreSettings,
    pub jwt: JwtSettings,
    pub lifecycle: LifecycleSettings,
    pub feed: FeedSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Capacity of the change-event broadcast channel.
    pub change_buffer: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub issuer: String,
}

/// Knobs for the mentorship/meeting workflow.
#[derive(Debug, Deserialize, Clone)]
pub struct LifecycleSettings {
    /// Require the expected prior status on every transition.
    pub enforce_transitions: bool,
    pub notify_on_schedule: bool,
    pub notify_on_cancel: bool,
    pub notification_page_size: i64,
    /// "HH:MM" used when a meeting request is accepted.
    pub default_meeting_time: String,
    pub default_meeting_duration: String,
    pub default_meeting_platform: String,
    /// Offset applied when turning form dates into instants and back.
    pub utc_offset_minutes: i32,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            enforce_transitions: true,
            notify_on_schedule: false,
            notify_on_cancel: false,
            notification_page_size: 10,
            default_meeting_time: "15:00".to_string(),
            default_meeting_duration: "30 min".to_string(),
            default_meeting_platform: "Google Meet".to_string(),
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedSettings {
    pub channel_capacity: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 16,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("ALUMNET"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "alumnet")?
            .set_default("store.backend", "mongo")?
            .set_default("store.change_buffer", 256)?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.issuer", "alumnet")?
            .set_default("lifecycle.enforce_transitions", true)?
            .set_default("lifecycle.notify_on_schedule", false)?
            .set_default("lifecycle.notify_on_cancel", false)?
            .set_default("lifecycle.notification_page_size", 10)?
            .set_default("lifecycle.default_meeting_time", "15:00")?
            .set_default("lifecycle.default_meeting_duration", "30 min")?
            .set_default("lifecycle.default_meeting_platform", "Google Meet")?
            .set_default("lifecycle.utc_offset_minutes", 0)?
            .set_default("feed.channel_capacity", 16)?
            .build()?;

        config.try_deserialize()
    }
}
