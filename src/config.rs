use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from config.toml or environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub database: DatabaseConfig,
    pub mock: MockConfig,
    pub analytics: AnalyticsConfig,
    pub retry: RetryConfig,
}

/// Which backend rows are read from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Supabase,
    Sqlite,
    #[default]
    Mock,
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supabase" | "postgrest" => Ok(SourceKind::Supabase),
            "sqlite" => Ok(SourceKind::Sqlite),
            "mock" | "memory" => Ok(SourceKind::Mock),
            other => Err(format!("unknown source kind '{}'", other)),
        }
    }
}

/// Row source settings, including the paginated fetch options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub url: String,
    pub api_key: String,
    pub page_size: usize,
    pub timeout_seconds: u64,
    pub concurrent_pages: usize,
    pub best_effort: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Mock,
            url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            page_size: 1000,
            timeout_seconds: 60,
            concurrent_pages: 1,
            best_effort: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub default_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    pub fixture_path: PathBuf,
}

/// Aggregation settings shared by every analyser in one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Reference timezone for bucketing, as minutes east of UTC
    pub utc_offset_minutes: i32,
    pub top_n: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            top_n: 10,
        }
    }
}

/// Caller-side retry policy for whole fetches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 250,
            backoff_multiplier: 2.0,
            max_backoff_seconds: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from config.toml file and environment variables
    /// Environment variables take precedence over file configuration
    pub fn load() -> Result<Self, ConfigError> {
        let source = SourceConfig::default();
        let analytics = AnalyticsConfig::default();
        let retry = RetryConfig::default();
        let config = Config::builder()
            .set_default("source.kind", "mock")?
            .set_default("source.url", source.url)?
            .set_default("source.api_key", source.api_key)?
            .set_default("source.page_size", source.page_size as i64)?
            .set_default("source.timeout_seconds", source.timeout_seconds)?
            .set_default("source.concurrent_pages", source.concurrent_pages as i64)?
            .set_default("source.best_effort", source.best_effort)?
            .set_default("database.default_path", "./scout.db")?
            .set_default("mock.fixture_path", "./fixtures/scout_mock.json")?
            .set_default(
                "analytics.utc_offset_minutes",
                analytics.utc_offset_minutes as i64,
            )?
            .set_default("analytics.top_n", analytics.top_n as i64)?
            .set_default("retry.max_retries", retry.max_retries as i64)?
            .set_default("retry.initial_backoff_ms", retry.initial_backoff_ms)?
            .set_default("retry.backoff_multiplier", retry.backoff_multiplier)?
            .set_default("retry.max_backoff_seconds", retry.max_backoff_seconds)?
            // Load from config.toml if it exists
            .add_source(File::with_name("config").required(false))
            // SCOUT_SOURCE__PAGE_SIZE=500 style overrides
            .add_source(
                config::Environment::with_prefix("SCOUT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;

        // Supabase's own variable names, as used by the dashboard's .env
        if let Ok(url) = env::var("SUPABASE_URL") {
            app_config.source.url = url;
        }

        if let Ok(key) = env::var("SUPABASE_ANON_KEY") {
            app_config.source.api_key = key;
        }

        if let Ok(db_path) = env::var("SCOUT_DATABASE_PATH") {
            app_config.database.default_path = PathBuf::from(db_path);
        }

        if app_config.source.page_size == 0 {
            return Err(ConfigError::Message(
                "source.page_size must be greater than zero".to_string(),
            ));
        }

        if app_config.source.kind == SourceKind::Supabase && app_config.source.api_key.is_empty()
        {
            return Err(ConfigError::Message(
                "Supabase source selected but no API key configured. Set SUPABASE_ANON_KEY or source.api_key in config.toml".to_string(),
            ));
        }

        Ok(app_config)
    }

    /// Get default config values for CLI argument defaults
    pub fn get_defaults() -> Result<Self, ConfigError> {
        match Self::load() {
            Ok(config) => Ok(config),
            Err(_) => Ok(Self {
                source: SourceConfig::default(),
                database: DatabaseConfig {
                    default_path: PathBuf::from("./scout.db"),
                },
                mock: MockConfig {
                    fixture_path: PathBuf::from("./fixtures/scout_mock.json"),
                },
                analytics: AnalyticsConfig::default(),
                retry: RetryConfig::default(),
            }),
        }
    }
}
