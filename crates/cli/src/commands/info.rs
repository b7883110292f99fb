//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{AppConfig, MessageType};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::commands::load_config_or_default;
use crate::pipeline::build_registry;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    dispatcher: DispatcherInfo,
    producer: ProducerInfo,
    reporter: ReporterInfo,
    handlers: Vec<HandlerBindingInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unhandled_types: Vec<MessageType>,
}

#[derive(Serialize)]
struct DispatcherInfo {
    workers: usize,
    max_parallelism: usize,
    idle_backoff_min_ms: u64,
    idle_backoff_max_ms: u64,
}

#[derive(Serialize)]
struct ProducerInfo {
    interval_ms: u64,
    max_batch: usize,
    distinct_messages: u64,
    template: String,
}

#[derive(Serialize)]
struct ReporterInfo {
    interval_ms: u64,
    top: usize,
}

#[derive(Serialize)]
struct HandlerBindingInfo {
    message_type: MessageType,
    handlers: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = load_config_or_default(&args.config)?;
    let info = build_config_info(&config);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &AppConfig) -> ConfigInfo {
    let registry = build_registry(&config.handlers);

    let handlers = registry
        .message_types()
        .into_iter()
        .map(|message_type| HandlerBindingInfo {
            message_type,
            handlers: registry
                .handler_names(message_type)
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
        .collect();

    let unhandled_types = MessageType::ALL
        .into_iter()
        .filter(|t| registry.resolve(*t).is_empty())
        .collect();

    ConfigInfo {
        version: format!("{:?}", config.version),
        dispatcher: DispatcherInfo {
            workers: config.dispatcher.workers,
            max_parallelism: config.dispatcher.max_parallelism,
            idle_backoff_min_ms: config.dispatcher.idle_backoff_min_ms,
            idle_backoff_max_ms: config.dispatcher.idle_backoff_max_ms,
        },
        producer: ProducerInfo {
            interval_ms: config.producer.interval_ms,
            max_batch: config.producer.max_batch,
            distinct_messages: config.producer.distinct_messages,
            template: config.producer.template.clone(),
        },
        reporter: ReporterInfo {
            interval_ms: config.reporter.interval_ms,
            top: config.reporter.top,
        },
        handlers,
        unhandled_types,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 msgdispatch Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let d = &info.dispatcher;
    println!("⚙️  Dispatcher");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Workers: {}", d.workers);
    println!("   ├─ Max parallelism: {}", d.max_parallelism);
    println!(
        "   └─ Idle backoff: {}..{} ms",
        d.idle_backoff_min_ms, d.idle_backoff_max_ms
    );

    let p = &info.producer;
    println!("\n📥 Producer");
    println!("   ├─ Interval: {} ms", p.interval_ms);
    println!("   ├─ Batch size: 0..{}", p.max_batch);
    println!("   ├─ Distinct messages: {}", p.distinct_messages);
    println!("   └─ Template: {}", p.template);

    println!("\n🔀 Handlers");
    for (i, binding) in info.handlers.iter().enumerate() {
        let prefix = if i == info.handlers.len() - 1 { "└─" } else { "├─" };
        println!(
            "   {} {} -> [{}]",
            prefix,
            binding.message_type,
            binding.handlers.join(", ")
        );
    }
    if !info.unhandled_types.is_empty() {
        let names: Vec<String> = info.unhandled_types.iter().map(|t| t.to_string()).collect();
        println!("   (no handlers: {})", names.join(", "));
    }

    let r = &info.reporter;
    println!("\n📊 Reporter");
    println!("   ├─ Interval: {} ms", r.interval_ms);
    if r.top == 0 {
        println!("   └─ Entries: all");
    } else {
        println!("   └─ Entries: top {}", r.top);
    }

    println!();
}
