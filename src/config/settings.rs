use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub backend: BackendConfig,
    pub presenter: PresenterConfig,
    pub system: SystemConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenterConfig {
    pub tick_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub channel_buffer_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Config::builder()
            .set_default("backend.base_url", "http://localhost:8000")?
            .set_default("backend.timeout_ms", 120_000)?
            .set_default("presenter.tick_ms", 1)?
            .set_default("system.channel_buffer_size", 32)?
            .set_default("logging.level", "info")?
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Settings pointing at an explicit backend, used by tests and embedders.
    pub fn for_backend(base_url: impl Into<String>) -> Self {
        Self {
            backend: BackendConfig {
                base_url: base_url.into(),
                timeout_ms: 120_000,
            },
            presenter: PresenterConfig { tick_ms: 1 },
            system: SystemConfig {
                channel_buffer_size: 32,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.backend.timeout_ms)
    }

    pub fn reveal_tick(&self) -> Duration {
        Duration::from_millis(self.presenter.tick_ms.max(1))
    }
}
