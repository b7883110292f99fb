//! # Dispatcher
//!
//! 消息分发核心。
//!
//! 负责：
//! - 无界 FIFO 队列接收生产者提交的消息
//! - 固定数量的 worker 拉取消息，按类型路由到已注册的 handlers
//! - 通过信号量限制全局并发处理数
//! - 每条消息/每个 handler 的失败相互隔离，只上报不中断
//! - 线程安全地统计每种消息内容的成功次数

pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod queue;
pub mod registry;
pub mod reporters;
pub mod stats;
mod worker;

pub use contracts::{FailureReporter, Message, MessageHandler, MessageId, MessageType, Payload};
pub use dispatcher::{Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::{DispatchFailure, DispatcherError};
pub use handlers::{FlakyHandler, LogHandler};
pub use metrics::{DispatchMetrics, DispatchMetricsSnapshot};
pub use queue::MessageQueue;
pub use registry::{HandlerRef, HandlerRegistry, HandlerRegistryBuilder};
pub use reporters::{FanoutReporter, LogReporter, RecordedFailure, RecordingReporter};
pub use stats::{StatEntry, StatsCollector, StatsSnapshot};
