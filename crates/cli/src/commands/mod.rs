//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_dispatch;
pub use validate::run_validate;

use std::path::Path;

use contracts::AppConfig;
use tracing::info;

use crate::error::CliError;

/// Load the configuration file, falling back to defaults when it is missing
fn load_config_or_default(path: &Path) -> Result<AppConfig, CliError> {
    if !path.exists() {
        info!(config = %path.display(), "Configuration file not found, using defaults");
    }
    config_loader::ConfigLoader::load_or_default(path).map_err(|e| CliError::config_load(path, e))
}
