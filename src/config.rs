use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::media::DEFAULT_MEDIA_EXTENSIONS;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Session cookie sent with every API call. Normally supplied through `PAN_COOKIE`.
    pub cookie: String,
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub scan: ScanConfig,
    pub batch: BatchConfig,
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub list_endpoint: String,
    pub rename_endpoint: String,
    pub move_endpoint: String,
    pub page_size: u32,
    pub sort: String,
    pub pr: String,
    pub fr: String,
    pub referer: String,
    pub user_agent: String,
    pub list_timeout_ms: u64,
    pub write_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            list_endpoint: "https://drive-pc.quark.cn/1/clouddrive/file/sort".to_string(),
            rename_endpoint: "https://drive-pc.quark.cn/1/clouddrive/file/rename".to_string(),
            move_endpoint: "https://drive-pc.quark.cn/1/clouddrive/file/move".to_string(),
            page_size: 1000,
            sort: "file_type:asc,file_name:asc".to_string(),
            pr: "ucpro".to_string(),
            fr: "pc".to_string(),
            referer: "https://pan.quark.cn/".to_string(),
            user_agent: concat!("pan-renumber/", env!("CARGO_PKG_VERSION")).to_string(),
            list_timeout_ms: 30_000,
            write_timeout_ms: 15_000,
        }
    }
}

impl ApiConfig {
    pub fn list_timeout(&self) -> Duration {
        Duration::from_millis(self.list_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1500,
            factor: 1.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    pub max_depth: usize,
    pub sibling_delay_ms: u64,
    pub root_delay_ms: u64,
    pub media_extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            sibling_delay_ms: 100,
            root_delay_ms: 200,
            media_extensions: DEFAULT_MEDIA_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    pub rename_delay_ms: u64,
    pub move_delay_ms: u64,
    pub resolve_attempts: u32,
    pub resolve_retry_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            rename_delay_ms: 500,
            move_delay_ms: 500,
            resolve_attempts: 3,
            resolve_retry_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub cache_ttl_secs: u64,
    pub navigation_refresh_delay_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 30,
            navigation_refresh_delay_ms: 500,
        }
    }
}

/// Defaults, then an optional `Config.toml`, then `PAN_*` environment variables
/// (`PAN_COOKIE`, `PAN_SCAN__MAX_DEPTH`, ...).
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    load_from("Config")
}

pub fn load_from(file_stem: &str) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name(file_stem).required(false))
        .add_source(
            Environment::with_prefix("PAN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("scan.media_extensions"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
