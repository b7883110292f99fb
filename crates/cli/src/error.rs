//! Error types for CLI operations.

use std::path::Path;

use contracts::ContractError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration could not be loaded or failed validation
    #[error("Failed to load configuration from {path}: {source}")]
    ConfigLoad {
        path: String,
        #[source]
        source: ContractError,
    },

    /// Component failed to start
    #[error("Failed to start {component}: {message}")]
    Startup { component: String, message: String },

    /// Graceful shutdown error
    #[error("Error during shutdown: {message}")]
    Shutdown { message: String },
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn config_load(path: &Path, source: ContractError) -> Self {
        Self::ConfigLoad {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn startup(component: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Startup {
            component: component.into(),
            message: message.to_string(),
        }
    }

    pub fn shutdown(message: impl std::fmt::Display) -> Self {
        Self::Shutdown {
            message: message.to_string(),
        }
    }
}
