//! Dispatch 指标收集模块
//!
//! 通过 `metrics` facade 记录消息提交、分发结果、处理器错误与延迟。
//! 未安装 recorder 时所有调用均为空操作。

use contracts::{HandlerError, MessageType};
use metrics::{counter, gauge, histogram};

/// 分发结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 所有处理器均成功
    Success,
    /// 部分处理器失败
    Partial,
    /// 所有处理器均失败
    Failed,
    /// 没有注册任何处理器
    NoHandlers,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Success => "success",
            DispatchOutcome::Partial => "partial",
            DispatchOutcome::Failed => "failed",
            DispatchOutcome::NoHandlers => "no_handlers",
        }
    }

    /// 根据成功/失败的处理器数量推导结果
    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (0, 0) => DispatchOutcome::NoHandlers,
            (_, 0) => DispatchOutcome::Success,
            (0, _) => DispatchOutcome::Failed,
            _ => DispatchOutcome::Partial,
        }
    }
}

/// 记录消息提交
pub fn record_message_submitted(message_type: MessageType) {
    counter!(
        "msgdispatch_messages_submitted_total",
        "message_type" => message_type.as_str()
    )
    .increment(1);
}

/// 记录一条消息的分发结果
pub fn record_message_dispatched(outcome: DispatchOutcome) {
    counter!(
        "msgdispatch_messages_dispatched_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// 记录处理器错误
pub fn record_handler_error(handler: &str, error: &HandlerError) {
    counter!(
        "msgdispatch_handler_errors_total",
        "handler" => handler.to_string(),
        "kind" => error.kind()
    )
    .increment(1);
}

/// 记录无处理器的消息
pub fn record_no_handlers(message_type: MessageType) {
    counter!(
        "msgdispatch_no_handlers_total",
        "message_type" => message_type.as_str()
    )
    .increment(1);
}

/// 记录队列深度
pub fn record_queue_depth(depth: usize) {
    gauge!("msgdispatch_queue_depth").set(depth as f64);
}

/// 记录正在处理的消息数
pub fn record_in_flight(in_flight: usize) {
    gauge!("msgdispatch_in_flight").set(in_flight as f64);
}

/// 记录处理器调用耗时
pub fn record_handler_latency_ms(handler: &str, latency_ms: f64) {
    histogram!(
        "msgdispatch_handler_latency_ms",
        "handler" => handler.to_string()
    )
    .record(latency_ms);
}

/// 记录生产者一次 tick 提交的消息数
pub fn record_producer_batch(batch: usize) {
    counter!("msgdispatch_producer_ticks_total").increment(1);
    histogram!("msgdispatch_producer_batch_size").record(batch as f64);
}

/// 记录统计快照的规模
pub fn record_stats_snapshot(total: u64, distinct_keys: usize) {
    gauge!("msgdispatch_stats_total").set(total as f64);
    gauge!("msgdispatch_stats_distinct_keys").set(distinct_keys as f64);
}

/// 吞吐量摘要 (消息/秒)
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&ThroughputStats> for StatsSummary {
    fn from(stats: &ThroughputStats) -> Self {
        let std_dev = if stats.samples < 2 {
            0.0
        } else {
            (stats.sq_dev / (stats.samples - 1) as f64).sqrt()
        };
        Self {
            count: stats.samples,
            min: stats.slowest,
            max: stats.fastest,
            mean: stats.mean(),
            std_dev,
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "mean={:.3}/s, std={:.3}, range=[{:.3}, {:.3}] (n={})",
            self.mean, self.std_dev, self.min, self.max, self.count
        )
    }
}

/// 每个上报周期的吞吐量采样, 增量更新均值与离差 (Welford)
#[derive(Debug, Clone, Default)]
pub struct ThroughputStats {
    samples: u64,
    mean: f64,
    sq_dev: f64,
    slowest: f64,
    fastest: f64,
}

impl ThroughputStats {
    /// 记录一个周期的速率
    pub fn record(&mut self, rate: f64) {
        self.samples += 1;
        if self.samples == 1 {
            self.mean = rate;
            self.slowest = rate;
            self.fastest = rate;
            return;
        }

        self.slowest = self.slowest.min(rate);
        self.fastest = self.fastest.max(rate);
        let before = rate - self.mean;
        self.mean += before / self.samples as f64;
        self.sq_dev += before * (rate - self.mean);
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }
}
