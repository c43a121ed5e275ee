use crate::log::log_level::LogLevel;

/// Destination for log lines. Every relay and transfer component holds an
/// `Arc<dyn LogSink>` so tests can swap in [`NoopLogSink`](crate::log::NoopLogSink)
/// or a capturing sink.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, msg: &str, target: &'static str);
}
