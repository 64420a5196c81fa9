use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, Level};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const CONFIG_DIR: &str = "config";

/// Client configuration with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Root of the back-office REST API
    #[validate(url)]
    pub api_base_url: String,

    /// Bearer token attached to every request
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout in seconds (1-300)
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationErrors),
}

impl AppConfig {
    pub fn new(api_base_url: String, api_token: Option<String>) -> Self {
        Self {
            api_base_url,
            api_token,
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.is_production() && !self.api_base_url.starts_with("https://") {
            let mut err = ValidationError::new("api_base_url");
            err.message = Some("Production deployments must reach the API over https".into());
            errors.add("api_base_url", err);
        }

        if self.is_production()
            && self
                .api_token
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .is_empty()
        {
            let mut err = ValidationError::new("api_token");
            err.message = Some("An API token is required in production".into());
            errors.add("api_token", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Accepts any name `tracing` understands as a level, in any case.
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    level.trim().parse::<Level>().map(drop).map_err(|_| {
        let names: Vec<String> = [
            Level::TRACE,
            Level::DEBUG,
            Level::INFO,
            Level::WARN,
            Level::ERROR,
        ]
        .iter()
        .map(|level| level.as_str().to_lowercase())
        .collect();
        let mut err = ValidationError::new("log_level");
        err.message = Some(
            format!(
                "Unknown log level '{}'; expected {}",
                level,
                names.join(", ")
            )
            .into(),
        );
        err
    })
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("inventory_check={}", level.trim().to_lowercase());
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let builder = fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .with_writer(std::io::stderr);

    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// Loads client configuration from the `config` directory.
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Same as [`load_config`] but reads files from `config_dir`.
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("api_base_url", DEFAULT_API_BASE_URL)?
        .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(&run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.validate_additional_constraints().is_ok());
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_bad_log_level_and_timeout() {
        let mut cfg = AppConfig::default();
        cfg.log_level = "verbose".into();
        cfg.request_timeout_secs = 0;

        let errors = cfg.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("log_level"));
        assert!(fields.contains_key("request_timeout_secs"));
    }

    #[test]
    fn log_level_names_are_case_insensitive() {
        for level in ["trace", "DEBUG", "Info", "warn", " error "] {
            assert!(validate_log_level(level).is_ok(), "{level} should be accepted");
        }

        let err = validate_log_level("verbose").unwrap_err();
        assert_eq!(
            err.message.as_deref(),
            Some("Unknown log level 'verbose'; expected trace, debug, info, warn, error")
        );
    }

    #[test]
    fn rejects_malformed_base_url() {
        let cfg = AppConfig::new("localhost without scheme".into(), None);
        assert!(cfg.validate().unwrap_err().field_errors().contains_key("api_base_url"));
    }

    #[test]
    fn production_requires_https_and_token() {
        let mut cfg = AppConfig::new("http://api.internal".into(), None);
        cfg.environment = "production".into();

        let errors = cfg.validate_additional_constraints().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("api_base_url"));
        assert!(fields.contains_key("api_token"));

        cfg.api_base_url = "https://api.example.com".into();
        cfg.api_token = Some("t0ken".into());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn loads_values_from_default_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
                api_base_url = "http://backoffice.test/api"
                request_timeout_secs = 12
                log_level = "debug"
            "#,
        )
        .unwrap();

        let cfg = load_config_from(dir.path()).expect("config should load");
        assert_eq!(cfg.api_base_url, "http://backoffice.test/api");
        assert_eq!(cfg.request_timeout_secs, 12);
        assert_eq!(cfg.log_level(), "debug");
        assert!(!cfg.log_json);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("default.toml"), "database_url = \"sqlite://x\"\n").unwrap();

        assert!(matches!(
            load_config_from(dir.path()),
            Err(AppConfigError::Load(_))
        ));
    }
}
