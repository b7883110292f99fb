//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::AppConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    workers: usize,
    max_parallelism: usize,
    producer_interval_ms: u64,
    reporter_interval_ms: u64,
    failure_one_in: u32,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Unlike `run`, a missing file is an error here
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(CliError::config_not_found(&args.config).to_string()),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    workers: config.dispatcher.workers,
                    max_parallelism: config.dispatcher.max_parallelism,
                    producer_interval_ms: config.producer.interval_ms,
                    reporter_interval_ms: config.reporter.interval_ms,
                    failure_one_in: config.handlers.failure_one_in,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.dispatcher.max_parallelism < config.dispatcher.workers {
        warnings.push(format!(
            "max_parallelism ({}) is lower than workers ({}) - some workers will idle",
            config.dispatcher.max_parallelism, config.dispatcher.workers
        ));
    }

    if config.handlers.failure_one_in == 0 {
        warnings.push("handlers.failure_one_in is 0 - handler failures are disabled".to_string());
    }

    if config.reporter.interval_ms < config.producer.interval_ms {
        warnings.push(format!(
            "reporter.interval_ms ({}) is shorter than producer.interval_ms ({})",
            config.reporter.interval_ms, config.producer.interval_ms
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Workers: {}", summary.workers);
            println!("  Max parallelism: {}", summary.max_parallelism);
            println!("  Producer interval: {} ms", summary.producer_interval_ms);
            println!("  Reporter interval: {} ms", summary.reporter_interval_ms);
            println!("  Failure rate: 1 in {}", summary.failure_one_in);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
