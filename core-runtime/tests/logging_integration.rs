//! Integration tests for the logging system

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait::async_trait]
impl LoggerSink for CollectingSink {
    async fn log(&self, entry: LogEntry) -> BridgeResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

#[test]
fn config_builder_round_trip() {
    // Logging can only be initialized once per process, so the builders are
    // tested without installing a subscriber.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_target(false)
        .with_filter("core_audio=trace");

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(!config.display_target);
    assert_eq!(config.filter.as_deref(), Some("core_audio=trace"));
}

#[test]
fn format_default_tracks_build_profile() {
    #[cfg(debug_assertions)]
    assert_eq!(LogFormat::default(), LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LogFormat::default(), LogFormat::Json);
}

#[tokio::test(flavor = "multi_thread")]
async fn events_are_mirrored_to_the_host_sink() {
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_filter("info")
        .with_logger_sink(Arc::clone(&sink) as Arc<dyn LoggerSink>);

    init_logging(config).unwrap();

    tracing::info!(frames = 4800u64, "narration decoded");
    // The mirror layer hands entries to a spawned task.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let entries = sink.entries.lock().unwrap();
    let entry = entries
        .iter()
        .find(|e| e.message == "narration decoded")
        .expect("entry should reach the sink");
    assert_eq!(entry.level, LogLevel::Info);
    assert_eq!(entry.fields.get("frames").map(String::as_str), Some("4800"));

    // A second initialization attempt must fail, not silently reinstall.
    assert!(init_logging(LoggingConfig::default()).is_err());
}
