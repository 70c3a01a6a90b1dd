use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct PricewatchConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub socket_path: String,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

/// Where the session record lives.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub ttl_hours: i64,
    #[serde(default)]
    pub storage: StorageBackend,
    /// Only read when `storage = "file"`.
    pub storage_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            storage: StorageBackend::Memory,
            storage_path: "pricewatch-session.json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulatorConfig {
    pub interval_seconds: u64,
    pub min_price: f64,
    pub max_delta: f64,
    pub discount_probability: f64,
    pub history_limit: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 15,
            min_price: 0.99,
            max_delta: 2.0,
            discount_probability: 0.2,
            history_limit: 5,
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedBackend {
    #[default]
    Simulated,
    Http,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub backend: FeedBackend,
    /// Snapshot endpoint for the `http` backend.
    #[serde(default)]
    pub url: Option<String>,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            backend: FeedBackend::Simulated,
            url: None,
            max_retries: 3,
            retry_delay_ms: 500,
            timeout_seconds: 10,
        }
    }
}

impl PricewatchConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}
