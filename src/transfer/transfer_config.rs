use std::path::PathBuf;
use std::time::Duration;

use super::envelope::MAX_CHUNK_SIZE;
use crate::config::Config;

pub const DEFAULT_BUFFERED_THRESHOLD: usize = 256 * 1024;
pub const MIN_BUFFERED_THRESHOLD: usize = 64 * 1024;
pub const MAX_BUFFERED_THRESHOLD: usize = 512 * 1024;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_STORAGE_PATH: &str = "./downloads";

/// Tunables of the peer-side transfer protocol (`[transfer]` section).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    pub chunk_size: usize,
    pub buffered_threshold: usize,
    pub poll_interval: Duration,
    pub receive_timeout: Duration,
    pub storage_path: PathBuf,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: MAX_CHUNK_SIZE,
            buffered_threshold: DEFAULT_BUFFERED_THRESHOLD,
            poll_interval: DEFAULT_POLL_INTERVAL,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}

impl TransferConfig {
    /// Read `[transfer]`; missing or unparsable keys keep their defaults and
    /// out-of-range values are clamped.
    pub fn from_config(config: &Config) -> Self {
        let d = Self::default();
        let chunk_size = config
            .get_parsed::<usize>("transfer", "chunk_size")
            .unwrap_or(d.chunk_size)
            .clamp(1, MAX_CHUNK_SIZE);
        let buffered_threshold = config
            .get_parsed::<usize>("transfer", "buffered_threshold")
            .unwrap_or(d.buffered_threshold)
            .clamp(MIN_BUFFERED_THRESHOLD, MAX_BUFFERED_THRESHOLD);
        let poll_interval = config
            .get_parsed::<u64>("transfer", "poll_interval_ms")
            .map(|ms| Duration::from_millis(ms.max(1)))
            .unwrap_or(d.poll_interval);
        let receive_timeout = config
            .get_parsed::<u64>("transfer", "receive_timeout_secs")
            .map(|s| Duration::from_secs(s.max(1)))
            .unwrap_or(d.receive_timeout);
        let storage_path = PathBuf::from(config.get_non_empty_or_default(
            "transfer",
            "storage_path",
            DEFAULT_STORAGE_PATH,
        ));

        Self {
            chunk_size,
            buffered_threshold,
            poll_interval,
            receive_timeout,
            storage_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gives_defaults() {
        assert_eq!(TransferConfig::from_config(&Config::empty()), TransferConfig::default());
    }

    #[test]
    fn values_are_clamped() {
        let cfg = Config::parse(concat!(
            "[transfer]\n",
            "chunk_size = 1000000\n",
            "buffered_threshold = 1024\n",
            "poll_interval_ms = 5\n",
            "receive_timeout_secs = 2\n",
            "storage_path = /tmp/dd\n",
        ));
        let t = TransferConfig::from_config(&cfg);
        assert_eq!(t.chunk_size, MAX_CHUNK_SIZE);
        assert_eq!(t.buffered_threshold, MIN_BUFFERED_THRESHOLD);
        assert_eq!(t.poll_interval, Duration::from_millis(5));
        assert_eq!(t.receive_timeout, Duration::from_secs(2));
        assert_eq!(t.storage_path, PathBuf::from("/tmp/dd"));
    }
}
