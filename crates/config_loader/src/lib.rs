//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate field ranges and cross-field rules
//! - Produce `AppConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("msgdispatch.toml")).unwrap();
//! println!("Workers: {}", config.dispatcher.workers);
//! ```

mod parser;
mod validator;

pub use contracts::AppConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;
use tracing::debug;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<AppConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        debug!(path = %path.display(), ?format, "Loading config");
        Self::load_from_str(&content, format)
    }

    /// Load from `path` if it exists, otherwise return validated defaults
    pub fn load_or_default(path: &Path) -> Result<AppConfig, ContractError> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            debug!(path = %path.display(), "Config file not found, using defaults");
            let config = AppConfig::default();
            validator::validate(&config)?;
            Ok(config)
        }
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<AppConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Validate an already built configuration (e.g. after CLI overrides)
    pub fn validate(config: &AppConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize AppConfig to TOML string
    pub fn to_toml(config: &AppConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize AppConfig to JSON string
    pub fn to_json(config: &AppConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_TOML: &str = r#"
[dispatcher]
workers = 8
max_parallelism = 64

[producer]
interval_ms = 50
template = "MSG {n}"

[handlers]
failure_one_in = 0
extra_log_handler = true

[reporter]
top = 5
"#;

    #[test]
    fn test_load_from_str_toml() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(config.dispatcher.workers, 8);
        assert_eq!(config.dispatcher.max_parallelism, 64);
        // Unset fields keep their defaults.
        assert_eq!(config.dispatcher.idle_backoff_max_ms, 100);
        assert_eq!(config.producer.max_batch, 1000);
        assert_eq!(config.producer.template, "MSG {n}");
        assert!(config.handlers.extra_log_handler);
        assert_eq!(config.reporter.interval_ms, 10_000);
        assert_eq!(config.reporter.top, 5);
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = ConfigLoader::load_from_str("", ConfigFormat::Toml).unwrap();
        assert_eq!(config.dispatcher.workers, 4);
        assert_eq!(config.handlers.failure_one_in, 1000);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let again = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(again.dispatcher.workers, config.dispatcher.workers);
        assert_eq!(again.producer.template, config.producer.template);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let again = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(again.reporter.top, 5);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = "[dispatcher]\nworkers = 0\n";
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("dispatcher.workers"), "{err}");
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "dispatcher": {{ "workers": 2 }} }}"#).unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.dispatcher.workers, 2);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.dispatcher.max_parallelism, 30);
    }
}
