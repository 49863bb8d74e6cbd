//! Pipeline configuration loading from file and environment variables.

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::uploader::ENDPOINT_PATH;

/// Deployment domain the pipeline reports under (`forge.domain`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Production ingestion.
    #[default]
    Prod,
    /// Pre-production ingestion.
    Staging,
    /// Development / local ingestion.
    Dev,
}

impl Domain {
    /// Returns the canonical string label for this domain.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Staging => "staging",
            Self::Dev => "dev",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prod" => Ok(Self::Prod),
            "staging" => Ok(Self::Staging),
            "dev" => Ok(Self::Dev),
            other => Err(ConfigError::Invalid(format!(
                "'{other}' is not a valid domain (expected prod, staging, or dev)"
            ))),
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Ingestion API host, e.g. `api.example.io`.
    #[serde(default)]
    pub api_host: String,

    /// Partner application identifier written into `env.appId`.
    #[serde(default)]
    pub app_id: String,

    /// Deployment domain written into `forge.domain`.
    #[serde(default)]
    pub domain: Domain,

    /// Path to the SQLite event store file.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Seconds between batched flushes. `0` selects immediate mode: every
    /// queued event triggers its own drain attempt.
    #[serde(default)]
    pub batch_interval_secs: u64,

    /// Full ingest URL override. When set, `api_host` is ignored; intended
    /// for development and tests against non-TLS endpoints.
    #[serde(default)]
    pub ingest_url: Option<String>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            api_host: String::new(),
            app_id: String::new(),
            domain: Domain::default(),
            db_path: default_db_path(),
            batch_interval_secs: 0,
            ingest_url: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl TelemetryConfig {
    /// Checks that required fields are present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::Invalid("app_id must not be empty".into()));
        }
        if self.ingest_url.is_none() && self.api_host.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "api_host must not be empty when no ingest_url override is set".into(),
            ));
        }
        Ok(())
    }

    /// Resolves the full ingest endpoint URL.
    pub fn ingest_endpoint(&self) -> String {
        match &self.ingest_url {
            Some(url) => url.clone(),
            None => format!("https://{}/{ENDPOINT_PATH}", self.api_host),
        }
    }
}

/// Host application identity, supplied programmatically at initialization.
#[derive(Debug, Clone)]
pub struct AppIdentity {
    /// Host application name (package/bundle identifier).
    pub name: String,
    /// Host application version string.
    pub version: String,
    /// Host application build number.
    pub build: String,
    /// Customer locale, e.g. `en_US`.
    pub locale: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "beacon_pipeline=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_db_path() -> String {
    "beacon.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A configuration value is missing or malformed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `BEACON_API_HOST` overrides `api_host`
/// - `BEACON_APP_ID` overrides `app_id`
/// - `BEACON_DOMAIN` overrides `domain`
/// - `BEACON_DB_PATH` overrides `db_path`
/// - `BEACON_BATCH_INTERVAL` overrides `batch_interval_secs`
/// - `BEACON_INGEST_URL` overrides `ingest_url`
/// - `BEACON_LOG_LEVEL` overrides `logging.level`
/// - `BEACON_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<TelemetryConfig, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                TelemetryConfig::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => TelemetryConfig::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("BEACON_API_HOST") {
        config.api_host = host;
    }
    if let Ok(app_id) = std::env::var("BEACON_APP_ID") {
        config.app_id = app_id;
    }
    if let Ok(domain) = std::env::var("BEACON_DOMAIN") {
        match domain.parse() {
            Ok(parsed) => config.domain = parsed,
            Err(error) => {
                tracing::warn!(%error, value = %domain, "ignoring malformed BEACON_DOMAIN");
            }
        }
    }
    if let Ok(db_path) = std::env::var("BEACON_DB_PATH") {
        config.db_path = db_path;
    }
    if let Ok(interval) = std::env::var("BEACON_BATCH_INTERVAL") {
        match interval.parse::<u64>() {
            Ok(parsed) => config.batch_interval_secs = parsed,
            Err(error) => {
                tracing::warn!(%error, value = %interval, "ignoring malformed BEACON_BATCH_INTERVAL");
            }
        }
    }
    if let Ok(url) = std::env::var("BEACON_INGEST_URL") {
        config.ingest_url = Some(url);
    }
    if let Ok(level) = std::env::var("BEACON_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("BEACON_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}

/// Initializes the process-wide tracing subscriber from logging config.
///
/// Call once at host startup, before constructing the pipeline.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_immediate_mode() {
        let config = TelemetryConfig::default();
        assert_eq!(config.batch_interval_secs, 0);
        assert_eq!(config.db_path, "beacon.db");
        assert_eq!(config.domain, Domain::Prod);
        assert!(config.ingest_url.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn parses_full_toml() {
        let config: TelemetryConfig = toml::from_str(
            r#"
            api_host = "api.example.io"
            app_id = "partner-42"
            domain = "staging"
            db_path = "/tmp/beacon.db"
            batch_interval_secs = 30

            [logging]
            level = "debug"
            json = true
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.api_host, "api.example.io");
        assert_eq!(config.app_id, "partner-42");
        assert_eq!(config.domain, Domain::Staging);
        assert_eq!(config.db_path, "/tmp/beacon.db");
        assert_eq!(config.batch_interval_secs, 30);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: TelemetryConfig = toml::from_str(
            r#"
            api_host = "api.example.io"
            app_id = "partner-42"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.batch_interval_secs, 0);
        assert_eq!(config.db_path, "beacon.db");
        assert_eq!(config.domain, Domain::Prod);
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let mut config = TelemetryConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.app_id = "partner-42".into();
        assert!(
            matches!(config.validate(), Err(ConfigError::Invalid(_))),
            "empty api_host without ingest_url should be rejected"
        );

        config.api_host = "api.example.io".into();
        config.validate().expect("complete config should validate");
    }

    #[test]
    fn ingest_url_override_satisfies_validation() {
        let config = TelemetryConfig {
            app_id: "partner-42".into(),
            ingest_url: Some("http://127.0.0.1:9000/v1/humio".into()),
            ..Default::default()
        };
        config.validate().expect("override should validate");
        assert_eq!(config.ingest_endpoint(), "http://127.0.0.1:9000/v1/humio");
    }

    #[test]
    fn ingest_endpoint_is_https_on_api_host() {
        let config = TelemetryConfig {
            api_host: "api.example.io".into(),
            ..Default::default()
        };
        assert_eq!(config.ingest_endpoint(), "https://api.example.io/v1/humio");
    }

    #[test]
    fn domain_round_trip() {
        for domain in [Domain::Prod, Domain::Staging, Domain::Dev] {
            let restored: Domain = domain.as_str().parse().expect("should parse");
            assert_eq!(restored, domain);
        }
        assert!("production".parse::<Domain>().is_err());
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config =
            load_config(Some("/nonexistent/beacon.toml")).expect("missing file should not error");
        assert_eq!(config.db_path, "beacon.db");
    }

    /// Serializes tests that touch process environment variables.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn env_overrides_take_precedence() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        std::env::set_var("BEACON_APP_ID", "env-partner");
        std::env::set_var("BEACON_BATCH_INTERVAL", "45");
        std::env::set_var("BEACON_DOMAIN", "dev");

        let result = load_config(None);

        std::env::remove_var("BEACON_APP_ID");
        std::env::remove_var("BEACON_BATCH_INTERVAL");
        std::env::remove_var("BEACON_DOMAIN");

        let config = result.expect("overridden defaults should load");
        assert_eq!(config.app_id, "env-partner");
        assert_eq!(config.batch_interval_secs, 45);
        assert_eq!(config.domain, Domain::Dev);
    }

    #[test]
    fn malformed_env_overrides_are_ignored() {
        let _guard = ENV_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        std::env::set_var("BEACON_DOMAIN", "production");
        std::env::set_var("BEACON_BATCH_INTERVAL", "soon");

        let result = load_config(None);

        std::env::remove_var("BEACON_DOMAIN");
        std::env::remove_var("BEACON_BATCH_INTERVAL");

        let config = result.expect("malformed overrides should not error");
        assert_eq!(config.domain, Domain::Prod, "unknown domain keeps default");
        assert_eq!(config.batch_interval_secs, 0, "non-numeric interval keeps default");
    }
}
