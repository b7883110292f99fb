//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (`validator` derive 规则)
//! - idle_backoff_min_ms <= idle_backoff_max_ms
//! - max_parallelism >= workers 时才能让每个 worker 同时处理消息 (仅警告)
//! - template 包含 `{n}` 占位符

use std::borrow::Cow;

use contracts::{AppConfig, ContractError};
use tracing::warn;
use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 AppConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &AppConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_idle_backoff(config)?;
    warn_parallelism(config);
    Ok(())
}

/// 字段级规则
fn validate_fields(config: &AppConfig) -> Result<(), ContractError> {
    match config.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let (field, message) = first_error("", &errors)
                .unwrap_or_else(|| ("config".to_string(), "invalid configuration".to_string()));
            Err(ContractError::config_validation(field, message))
        }
    }
}

/// 按字段名排序后取第一个错误，保证报错稳定
fn first_error(prefix: &str, errors: &ValidationErrors) -> Option<(String, String)> {
    let mut fields: Vec<(&Cow<'static, str>, &ValidationErrorsKind)> =
        errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (name, kind) in fields {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };

        match kind {
            ValidationErrorsKind::Field(errs) => {
                if let Some(err) = errs.first() {
                    let message = match (&err.message, err.params.get("value")) {
                        (Some(message), _) => message.to_string(),
                        (None, Some(value)) => {
                            format!("failed '{}' check (got {value})", err.code)
                        }
                        (None, None) => format!("failed '{}' check", err.code),
                    };
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                if let Some(found) = first_error(&path, inner) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    if let Some(found) = first_error(&format!("{path}[{idx}]"), inner) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

/// 校验空闲退避范围
fn validate_idle_backoff(config: &AppConfig) -> Result<(), ContractError> {
    let dispatcher = &config.dispatcher;
    if dispatcher.idle_backoff_min_ms > dispatcher.idle_backoff_max_ms {
        return Err(ContractError::config_validation(
            "dispatcher.idle_backoff_min_ms / dispatcher.idle_backoff_max_ms",
            format!(
                "idle_backoff_min_ms ({}) must be <= idle_backoff_max_ms ({})",
                dispatcher.idle_backoff_min_ms, dispatcher.idle_backoff_max_ms
            ),
        ));
    }
    Ok(())
}

/// 并发上限小于 worker 数时部分 worker 会一直等待 permit
fn warn_parallelism(config: &AppConfig) {
    let dispatcher = &config.dispatcher;
    if dispatcher.max_parallelism < dispatcher.workers {
        warn!(
            workers = dispatcher.workers,
            max_parallelism = dispatcher.max_parallelism,
            "max_parallelism is lower than workers; some workers will idle"
        );
    }
}
