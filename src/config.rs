use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::core::{EngineSettings, GlobalSource, ZeroTotalPolicy};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    pub appwrite: Option<AppwriteSettings>,
    pub database: Option<DatabaseSettings>,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub intimacy: IntimacySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Which account store backend to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Appwrite,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_scan_page_size")]
    pub scan_page_size: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            scan_page_size: default_scan_page_size(),
        }
    }
}

fn default_scan_page_size() -> usize { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
    #[serde(default = "default_accounts_collection")]
    pub accounts_collection: String,
}

fn default_accounts_collection() -> String { "accounts".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// Shared L2 tier; the cache stays process-local when unset
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntimacySettings {
    #[serde(default)]
    pub zero_total_policy: ZeroTotalPolicy,
    #[serde(default)]
    pub global_source: GlobalSource,
    /// Background refresh period for the global report, disabled when unset
    pub refresh_interval_secs: Option<u64>,
}

impl Default for IntimacySettings {
    fn default() -> Self {
        Self {
            zero_total_policy: ZeroTotalPolicy::default(),
            global_source: GlobalSource::default(),
            refresh_interval_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingSettings {
    /// Apply LOG_LEVEL / LOG_FORMAT style overrides on top of the file values
    pub fn overridden(self, level: Option<String>, format: Option<String>) -> Self {
        Self {
            level: level.unwrap_or(self.level),
            format: format.unwrap_or(self.format),
        }
    }

    pub fn is_pretty(&self) -> bool {
        self.format.eq_ignore_ascii_case("pretty")
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with LUME_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., LUME__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("LUME")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_database_url(settings)?;

        settings.try_deserialize()
    }

    /// Engine tunables derived from the store and intimacy sections
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            scan_page_size: self.store.scan_page_size.max(1),
            zero_total_policy: self.intimacy.zero_total_policy,
            global_source: self.intimacy.global_source,
        }
    }
}

/// Let the conventional DATABASE_URL variable override the configured url
fn apply_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let settings = from_toml(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            "#,
        );

        assert_eq!(settings.store.backend, StoreBackend::Memory);
        assert_eq!(settings.store.scan_page_size, 100);
        assert_eq!(settings.intimacy.zero_total_policy, ZeroTotalPolicy::Error);
        assert_eq!(settings.intimacy.global_source, GlobalSource::Fresh);
        assert!(settings.cache.redis_url.is_none());
        assert!(settings.appwrite.is_none());
    }

    #[test]
    fn test_intimacy_section_parsing() {
        let settings = from_toml(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [store]
            backend = "postgres"
            scan_page_size = 0

            [intimacy]
            zero_total_policy = "zero"
            global_source = "snapshot"
            refresh_interval_secs = 300
            "#,
        );

        assert_eq!(settings.store.backend, StoreBackend::Postgres);
        assert_eq!(settings.intimacy.refresh_interval_secs, Some(300));

        let engine = settings.engine_settings();
        assert_eq!(engine.scan_page_size, 1);
        assert_eq!(engine.zero_total_policy, ZeroTotalPolicy::Zero);
        assert_eq!(engine.global_source, GlobalSource::Snapshot);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
        assert!(!logging.is_pretty());
    }

    #[test]
    fn test_logging_section_with_overrides() {
        let settings = from_toml(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [logging]
            level = "debug"
            format = "pretty"
            "#,
        );

        assert_eq!(settings.logging.level, "debug");
        assert!(settings.logging.is_pretty());

        let logging = settings.logging.clone().overridden(Some("warn".to_string()), None);
        assert_eq!(logging.level, "warn");
        assert!(logging.is_pretty());

        let logging = settings.logging.overridden(None, Some("json".to_string()));
        assert_eq!(logging.level, "debug");
        assert!(!logging.is_pretty());
    }
}
