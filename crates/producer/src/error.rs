//! Producer 错误类型

use thiserror::Error;

/// Producer 错误
#[derive(Debug, Error)]
pub enum ProducerError {
    /// 配置无效
    #[error("invalid producer config '{field}': {message}")]
    InvalidConfig {
        /// 字段名
        field: String,
        /// 错误消息
        message: String,
    },

    /// 生产任务异常退出
    #[error("producer task failed: {message}")]
    TaskFailed {
        /// 错误消息
        message: String,
    },
}

/// Producer Result 类型别名
pub type Result<T> = std::result::Result<T, ProducerError>;
