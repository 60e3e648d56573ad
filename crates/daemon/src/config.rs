//! Daemon settings
//!
//! Layering (later wins):
//! 1. built-in defaults
//! 2. optional TOML file (`--config` / `INDEXER_CONFIG`, default `~/.seo-indexer/indexer.toml`)
//! 3. `INDEXER_*` environment variables, `__` between nesting levels
//!    (e.g. `INDEXER_PROCESSOR__BATCH_SIZE=10`)

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use indexer_api_http::ApiServerConfig;
use indexer_core::application::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_ITEM_DELAY, DEFAULT_MAX_RETRIES, DEFAULT_STALE_AFTER,
    DEFAULT_TRIGGER_INTERVAL,
};
use indexer_core::application::ProcessorConfig;
use indexer_infra_http::ProviderConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "~/.seo-indexer/indexer.toml";
const DEFAULT_DB_PATH: &str = "~/.seo-indexer/indexer.db";
const ENV_PREFIX: &str = "INDEXER";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `sqlite:` URL or a plain file path (tilde allowed)
    pub database_url: String,
    pub http: HttpSettings,
    pub processor: ProcessorSettings,
    pub scheduler: SchedulerSettings,
    pub providers: ProviderSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessorSettings {
    pub batch_size: u32,
    pub max_retries: i32,
    pub item_delay_ms: u64,
    pub stale_after_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub google_indexing_base_url: String,
    pub google_token_url: String,
    pub bing_base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
    /// EnvFilter directive used when RUST_LOG is unset
    pub filter: String,
    /// Daily-rolling JSON log files are written here when set
    pub directory: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DB_PATH.to_string(),
            http: HttpSettings::default(),
            processor: ProcessorSettings::default(),
            scheduler: SchedulerSettings::default(),
            providers: ProviderSettings::default(),
            log: LogSettings::default(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        let server = ApiServerConfig::default();
        Self {
            host: server.host,
            port: server.port,
        }
    }
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            item_delay_ms: DEFAULT_ITEM_DELAY.as_millis() as u64,
            stale_after_secs: DEFAULT_STALE_AFTER.as_secs(),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_TRIGGER_INTERVAL.as_secs(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        let providers = ProviderConfig::default();
        Self {
            google_indexing_base_url: providers.google_indexing_base_url,
            google_token_url: providers.google_token_url,
            bing_base_url: providers.bing_base_url,
            request_timeout_secs: providers.request_timeout.as_secs(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "seo_indexer=info,indexer_core=info,indexer_infra_sqlite=info,indexer_infra_http=info,indexer_api_http=info,tower_http=info".to_string(),
            directory: None,
        }
    }
}

impl Settings {
    /// Load from file + process environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(config_path, None)
    }

    /// `env` replaces the process environment when given
    fn load_with_env(config_path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let path: PathBuf = match config_path {
            Some(path) => path.to_path_buf(),
            None => shellexpand::tilde(DEFAULT_CONFIG_PATH).into_owned().into(),
        };
        // An explicitly named file must exist
        let required = config_path.is_some();

        let settings: Settings = Config::builder()
            .add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .with_context(|| format!("Failed to read configuration ({})", path.display()))?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            bail!("database_url cannot be empty");
        }
        if self.processor.batch_size == 0 {
            bail!("processor.batch_size must be greater than 0");
        }
        if self.processor.max_retries <= 0 {
            bail!("processor.max_retries must be greater than 0");
        }
        if self.processor.stale_after_secs == 0 {
            bail!("processor.stale_after_secs must be greater than 0");
        }
        if self.scheduler.enabled && self.scheduler.interval_secs == 0 {
            bail!("scheduler.interval_secs must be greater than 0");
        }
        if self.providers.request_timeout_secs == 0 {
            bail!("providers.request_timeout_secs must be greater than 0");
        }
        // A Google attempt is two requests: token exchange, then publish
        if self.processor.stale_after_secs <= 2 * self.providers.request_timeout_secs {
            bail!(
                "processor.stale_after_secs ({}) must exceed twice providers.request_timeout_secs ({})",
                self.processor.stale_after_secs,
                self.providers.request_timeout_secs
            );
        }
        Ok(())
    }

    /// SQLite URL with `~` expanded; plain paths become `sqlite://` URLs
    pub fn resolved_database_url(&self) -> String {
        if self.database_url.starts_with("sqlite:") {
            self.database_url.clone()
        } else {
            format!("sqlite://{}", shellexpand::tilde(&self.database_url))
        }
    }

    /// Parent directory of the database file, if it is a file
    pub fn database_dir(&self) -> Option<PathBuf> {
        let url = self.resolved_database_url();
        if url.contains(":memory:") || url.contains("mode=memory") {
            return None;
        }
        let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
        let path = path.split('?').next().unwrap_or(path);
        Path::new(path).parent().map(Path::to_path_buf)
    }

    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            batch_size: self.processor.batch_size,
            max_retries: self.processor.max_retries,
            item_delay: Duration::from_millis(self.processor.item_delay_ms),
            stale_after: Duration::from_secs(self.processor.stale_after_secs),
        }
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            google_indexing_base_url: self.providers.google_indexing_base_url.clone(),
            google_token_url: self.providers.google_token_url.clone(),
            bing_base_url: self.providers.bing_base_url.clone(),
            request_timeout: Duration::from_secs(self.providers.request_timeout_secs),
        }
    }

    pub fn server_config(&self) -> ApiServerConfig {
        ApiServerConfig {
            host: self.http.host.clone(),
            port: self.http.port,
        }
    }

    pub fn scheduler_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.interval_secs)
    }
}
