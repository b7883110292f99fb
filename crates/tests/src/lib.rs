//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 分发核心的并发性质验证（无丢失计数、FIFO、失败隔离、快照一致性、并发上限）
//! - 生产者 -> 队列 -> 分发器 -> 统计 的端到端测试
//! - 配置加载到分发器启动的连通性

#[cfg(test)]
mod support {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use contracts::{
        async_trait, FailureInjector, HandlerError, Message, MessageHandler, MessageId,
    };
    use parking_lot::Mutex;

    /// Poll `done` until it holds or five seconds pass
    pub async fn wait_until(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Fails every message whose canonical content equals `content`
    pub struct FailOnContent(pub &'static str);

    impl FailureInjector for FailOnContent {
        fn should_fail(&self, message: &Message) -> Option<String> {
            (message.payload.canonical() == self.0).then(|| format!("refusing '{}'", self.0))
        }
    }

    /// Records the order in which message ids are handled
    #[derive(Default)]
    pub struct OrderRecorder {
        pub seen: Mutex<Vec<MessageId>>,
    }

    #[async_trait]
    impl MessageHandler for OrderRecorder {
        fn name(&self) -> &str {
            "order"
        }

        async fn handle(&self, message: &Message) -> Result<(), HandlerError> {
            self.seen.lock().push(message.id);
            Ok(())
        }
    }

    /// Sleeps while tracking how many invocations overlap
    #[derive(Default)]
    pub struct SlowHandler {
        pub current: AtomicUsize,
        pub max_seen: AtomicUsize,
    }

    #[async_trait]
    impl MessageHandler for SlowHandler {
        fn name(&self) -> &str {
            "slow"
        }

        async fn handle(&self, _message: &Message) -> Result<(), HandlerError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Counts per key, as a map
    pub fn counts(snapshot: &dispatcher::StatsSnapshot) -> HashMap<String, u64> {
        snapshot
            .entries
            .iter()
            .map(|e| (e.key.clone(), e.count))
            .collect()
    }

    pub fn shared<H: MessageHandler + 'static>(handler: H) -> Arc<H> {
        Arc::new(handler)
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::{Message, MessageId, MessageType, Payload};

    #[test]
    fn test_payload_routing_and_keys() {
        let text = Message::new(MessageId::new(1), "THIS IS MESSAGE 3");
        assert_eq!(text.message_type(), MessageType::Text);
        assert_eq!(text.payload.canonical(), "THIS IS MESSAGE 3");

        let binary = Payload::Binary(vec![0xde, 0xad].into());
        assert_eq!(binary.message_type(), MessageType::Binary);
        assert_eq!(binary.canonical(), "dead");
    }
}

#[cfg(test)]
mod property_tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use contracts::{FailEveryNth, MessageType, NeverFail, Payload};
    use dispatcher::{Dispatcher, FlakyHandler, HandlerRegistry, RecordingReporter, StatsCollector};

    use crate::support::{counts, shared, wait_until, FailOnContent, OrderRecorder, SlowHandler};

    fn counting_registry() -> HandlerRegistry {
        let mut builder = HandlerRegistry::builder();
        builder.register(
            MessageType::Text,
            FlakyHandler::new("stats", Arc::new(NeverFail)),
        );
        builder.build()
    }

    /// Concurrent producers and workers never lose an increment
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_lost_increments() {
        let dispatcher = Arc::new(Dispatcher::builder(counting_registry()).build());
        dispatcher.start(8, 64).unwrap();

        let producers: Vec<_> = (0..4)
            .map(|_| {
                let dispatcher = Arc::clone(&dispatcher);
                tokio::spawn(async move {
                    for n in 0..2600u64 {
                        dispatcher.submit(format!("THIS IS MESSAGE {}", n % 13));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.await.unwrap();
        }

        wait_until(|| dispatcher.snapshot().total == 10_400).await;
        dispatcher.stop().await;

        let snapshot = dispatcher.snapshot();
        assert_eq!(snapshot.len(), 13);
        for (key, count) in counts(&snapshot) {
            assert_eq!(count, 800, "key {key}");
        }
    }

    /// A single worker with one permit handles messages in submission order
    #[tokio::test]
    async fn test_fifo_within_one_producer() {
        let recorder = shared(OrderRecorder::default());
        let mut builder = HandlerRegistry::builder();
        builder.register_shared(MessageType::Text, recorder.clone());
        let dispatcher = Dispatcher::builder(builder.build()).build();

        let ids: Vec<_> = (0..200).map(|i| dispatcher.submit(format!("m{i}"))).collect();
        dispatcher.start(1, 1).unwrap();

        wait_until(|| recorder.seen.lock().len() == 200).await;
        dispatcher.stop().await;

        assert_eq!(*recorder.seen.lock(), ids);
    }

    /// A type without handlers is reported once and does not block the rest
    #[tokio::test]
    async fn test_no_handlers_isolation() {
        let reporter = Arc::new(RecordingReporter::new());
        let dispatcher = Dispatcher::builder(counting_registry())
            .reporter(reporter.clone())
            .build();
        dispatcher.start(2, 4).unwrap();

        let orphan = dispatcher.submit(Payload::Binary(vec![0xde, 0xad].into()));
        for _ in 0..10 {
            dispatcher.submit("after");
        }

        wait_until(|| dispatcher.snapshot().count("after") == 10).await;
        dispatcher.stop().await;

        assert_eq!(reporter.no_handlers_count(), 1);
        let events = reporter.events();
        assert_eq!(events[0].failure.message_id(), orphan);
        assert!(events[0].handler.is_none());
        assert_eq!(dispatcher.snapshot().count("dead"), 0);
        assert_eq!(dispatcher.snapshot().total, 10);
    }

    /// A failing handler costs exactly its own increment
    #[tokio::test]
    async fn test_handler_error_isolation() {
        let reporter = Arc::new(RecordingReporter::new());
        let mut builder = HandlerRegistry::builder();
        let picky = FlakyHandler::new("picky", Arc::new(FailOnContent("BAD")));
        let steady = FlakyHandler::new("steady", Arc::new(NeverFail));
        builder
            .register(MessageType::Text, picky)
            .register(MessageType::Text, steady);
        let dispatcher = Dispatcher::builder(builder.build())
            .reporter(reporter.clone())
            .build();
        dispatcher.start(4, 8).unwrap();

        for i in 0..30 {
            dispatcher.submit(if i % 3 == 0 { "BAD" } else { "GOOD" });
        }

        wait_until(|| {
            let metrics = dispatcher.metrics();
            metrics.succeeded + metrics.handler_errors == 60
        })
        .await;
        dispatcher.stop().await;

        // 10 BAD messages: one report each, only the sibling counted them.
        assert_eq!(reporter.handler_error_count(), 10);
        assert!(reporter
            .events()
            .iter()
            .all(|e| e.handler.as_deref() == Some("picky")));
        let snapshot = dispatcher.snapshot();
        assert_eq!(snapshot.count("BAD"), 10);
        assert_eq!(snapshot.count("GOOD"), 40);
    }

    /// Snapshots taken during dispatch are internally consistent and monotonic
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_snapshot_consistency() {
        let stats = Arc::new(StatsCollector::new());
        let mut builder = HandlerRegistry::builder();
        let flaky = FlakyHandler::new("flaky", Arc::new(FailEveryNth::new(7)));
        builder.register(MessageType::Text, flaky);
        let dispatcher = Dispatcher::builder(builder.build())
            .stats(stats.clone())
            .build();
        dispatcher.start(4, 16).unwrap();

        for n in 0..5000u64 {
            dispatcher.submit(format!("k{}", n % 5));
        }

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut previous = counts(&stats.snapshot());
        loop {
            assert!(Instant::now() < deadline, "dispatch did not finish in time");
            let snapshot = stats.snapshot();
            let sum: u64 = snapshot.entries.iter().map(|e| e.count).sum();
            assert_eq!(snapshot.total, sum);
            assert!(snapshot
                .entries
                .windows(2)
                .all(|w| w[0].count >= w[1].count));

            let current = counts(&snapshot);
            for (key, before) in &previous {
                let now = current.get(key).copied().unwrap_or(0);
                assert!(now >= *before, "{key} went down");
            }
            previous = current;

            let metrics = dispatcher.metrics();
            if metrics.succeeded + metrics.handler_errors == 5000 {
                break;
            }
            tokio::task::yield_now().await;
        }
        dispatcher.stop().await;

        assert_eq!(stats.snapshot().total, dispatcher.metrics().succeeded);
    }

    /// Never more than `max_parallelism` invocations in flight
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_bounded_parallelism() {
        let slow = shared(SlowHandler::default());
        let mut builder = HandlerRegistry::builder();
        builder.register_shared(MessageType::Text, slow.clone());
        let dispatcher = Dispatcher::builder(builder.build()).build();

        for _ in 0..60 {
            dispatcher.submit("slow");
        }
        dispatcher.start(4, 3).unwrap();

        wait_until(|| dispatcher.metrics().succeeded == 60).await;
        dispatcher.stop().await;

        let max_seen = slow.max_seen.load(Ordering::SeqCst);
        assert!((1..=3).contains(&max_seen), "saw {max_seen} concurrent invocations");
        assert!(dispatcher.metrics().peak_in_flight <= 3);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{FailEveryNth, MessageType};
    use dispatcher::{
        Dispatcher, DispatcherConfig, FanoutReporter, FlakyHandler, HandlerRegistry, LogHandler,
        LogReporter, MessageQueue, RecordingReporter,
    };
    use producer::{Producer, ProducerConfig, SequenceGenerator};

    use crate::support::wait_until;

    /// End-to-end test: Producer -> MessageQueue -> Dispatcher -> StatsCollector
    #[tokio::test]
    async fn test_e2e_producer_to_stats() {
        let queue = Arc::new(MessageQueue::new());
        let recording = Arc::new(RecordingReporter::new());
        let reporter = FanoutReporter::new()
            .with(Arc::new(LogReporter::new()))
            .with(recording.clone());

        let mut builder = HandlerRegistry::builder();
        let stats = FlakyHandler::new("stats", Arc::new(FailEveryNth::new(100)));
        builder
            .register(MessageType::Text, stats)
            .register(MessageType::Text, LogHandler::default());
        let dispatcher = Dispatcher::builder(builder.build())
            .queue(queue.clone())
            .reporter(Arc::new(reporter))
            .build();
        dispatcher.start(4, 30).unwrap();

        let producer = Producer::new(
            ProducerConfig::new(Duration::from_millis(1)),
            SequenceGenerator::new("THIS IS MESSAGE {n}", 13, 50).with_limit(500),
            queue.clone(),
        )
        .start()
        .unwrap();

        wait_until(|| producer.is_finished()).await;
        let produced = producer.stop().await.unwrap();
        assert_eq!(produced.messages_submitted, 500);

        // Two handlers per message; the stats handler fails 5 times.
        wait_until(|| {
            let metrics = dispatcher.metrics();
            metrics.succeeded + metrics.handler_errors == 1000
        })
        .await;
        dispatcher.stop().await;

        assert_eq!(recording.handler_error_count(), 5);
        assert_eq!(recording.no_handlers_count(), 0);

        let snapshot = dispatcher.snapshot();
        assert_eq!(snapshot.total, 995);
        assert_eq!(snapshot.len(), 13);
        assert!(queue.is_empty());
    }

    /// Loaded configuration drives the worker pool
    #[tokio::test]
    async fn test_config_to_dispatcher() {
        let config = ConfigLoader::load_from_str(
            "[dispatcher]\nworkers = 2\nmax_parallelism = 5\nidle_backoff_max_ms = 10\n",
            ConfigFormat::Toml,
        )
        .unwrap();

        let dispatcher = Dispatcher::builder(HandlerRegistry::empty()).build();
        dispatcher
            .start_with(DispatcherConfig::from(&config.dispatcher))
            .unwrap();
        assert!(dispatcher.is_running());

        dispatcher.submit("nobody listens");
        wait_until(|| dispatcher.metrics().no_handlers == 1).await;
        dispatcher.stop().await;
        assert!(!dispatcher.is_running());
    }
}
