use crate::{
    config::Config,
    log::{log_level::LogLevel, log_msg::LogMsg, logger_handle::LoggerHandle},
};

use std::{
    fs::{self, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::{
        Arc,
        mpsc::{self, TrySendError},
    },
    thread,
    time::{SystemTime, UNIX_EPOCH},
};

/// Flush every 100 lines when debugging so crashes leave a useful tail.
#[cfg(feature = "log-debug")]
const FLUSH_BATCH_SIZE: u32 = 100;

#[cfg(not(feature = "log-debug"))]
const FLUSH_BATCH_SIZE: u32 = 1_000;

/// Bounded, non-blocking logger that writes to a per-process log file.
///
/// A worker thread drains a bounded channel and appends to the file. A second,
/// smaller channel carries an "activity feed": every warning and error plus one
/// in `sample_every` of the other lines, so an operator console can follow the
/// relay without tailing the file.
pub struct Logger {
    handle: LoggerHandle,
    activity_rx: mpsc::Receiver<String>,
    _thread: Option<thread::JoinHandle<()>>,
    file_path: PathBuf,
}

/// Options resolved from config before the worker starts.
#[derive(Debug, Clone, Copy)]
pub struct LoggerOptions {
    pub cap: usize,
    pub activity_cap: usize,
    pub sample_every: u32,
    pub min_level: LogLevel,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            cap: 1024,
            activity_cap: 128,
            sample_every: 10,
            min_level: LogLevel::Trace,
        }
    }
}

impl Logger {
    /// Logger for the relay process (`[Logging] relay_log_filename`, `relay_log_path`).
    #[must_use]
    pub fn start_relay(opts: LoggerOptions, config: Arc<Config>) -> Self {
        Self::start("relay_log_filename", "relay_log_path", "relay", opts, &config)
    }

    /// Logger for a peer process (`[Logging] peer_log_filename`, `peer_log_path`).
    #[must_use]
    pub fn start_peer(opts: LoggerOptions, config: Arc<Config>) -> Self {
        Self::start("peer_log_filename", "peer_log_path", "peer", opts, &config)
    }

    fn start(
        fn_key: &str,
        path_key: &str,
        default_name: &str,
        mut opts: LoggerOptions,
        config: &Config,
    ) -> Self {
        let app_name = config
            .get_non_empty("Logging", fn_key)
            .unwrap_or(default_name);

        if let Some(level) = config
            .get_non_empty("Logging", "level")
            .and_then(LogLevel::parse)
        {
            opts.min_level = level;
        }

        if let Some(dir_str) = config.get_non_empty("Logging", path_key) {
            Self::start_in_dir(expand_path(dir_str), Some(app_name), opts)
        } else {
            Self::start_default(Some(app_name), opts)
        }
    }

    /// Starts the logger in a `logs/` directory next to the executable.
    ///
    /// Example file: `target/debug/logs/relay-20251102_023045-pid1234.log`
    #[must_use]
    pub fn start_default(app_name: Option<&str>, opts: LoggerOptions) -> Self {
        let base = exe_dir_fallback_cwd().join("logs");
        Self::start_in_dir(base, app_name, opts)
    }

    /// Starts the logger in `dir`, creating it if missing.
    ///
    /// If the file cannot be opened the worker falls back to a file in the temp
    /// directory and finally to `io::sink()`; logging never panics.
    pub fn start_in_dir<D: AsRef<Path>>(
        dir: D,
        app_name: Option<&str>,
        opts: LoggerOptions,
    ) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let _ = fs::create_dir_all(&dir);

        let sample_every = opts.sample_every.max(1);
        let min_level = opts.min_level;

        let ts = timestamp_for_filename();
        let pid = std::process::id();
        let fname = match app_name {
            Some(name) => format!("{}-{}-pid{}.log", name, ts, pid),
            None => format!("{}-pid{}.log", ts, pid),
        };
        let file_path = dir.join(&fname);

        let (tx, rx) = mpsc::sync_channel::<LogMsg>(opts.cap);
        let (activity_tx, activity_rx) = mpsc::sync_channel::<String>(opts.activity_cap);

        let file_path_clone = file_path.clone();

        let _thread = thread::Builder::new()
            .name("logger-worker".into())
            .spawn(move || {
                let writer: Box<dyn Write + Send> = if let Ok(f) = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&file_path_clone)
                {
                    Box::new(f)
                } else {
                    let fallback = std::env::temp_dir().join("deepdrop-fallback.log");
                    match OpenOptions::new().create(true).append(true).open(&fallback) {
                        Ok(f) => Box::new(f),
                        Err(_) => Box::new(io::sink()),
                    }
                };

                let mut out: BufWriter<Box<dyn Write + Send>> = BufWriter::new(writer);

                let mut n: u32 = 0;
                let mut lines_written: u32 = 0;
                let mut dropped_to_feed: usize = 0;

                while let Ok(m) = rx.recv() {
                    if m.level < min_level {
                        continue;
                    }
                    let _ = writeln!(&mut out, "{}", m.render());
                    lines_written = lines_written.wrapping_add(1);

                    if lines_written.is_multiple_of(FLUSH_BATCH_SIZE) {
                        let _ = out.flush();
                    }

                    let forward = matches!(m.level, LogLevel::Warn | LogLevel::Error) || {
                        n = n.wrapping_add(1);
                        n.is_multiple_of(sample_every)
                    };

                    if forward
                        && activity_tx
                            .try_send(format!("[{}] {}", m.level.label(), m.text))
                            .is_err()
                    {
                        dropped_to_feed += 1;
                    }

                    if dropped_to_feed >= 10 {
                        let _ = activity_tx.try_send(format!(
                            "(logger) activity feed dropped {dropped_to_feed} lines"
                        ));
                        dropped_to_feed = 0;
                    }
                }

                let _ = out.flush();
            })
            .ok();

        Self {
            handle: LoggerHandle { tx },
            activity_rx,
            _thread,
            file_path,
        }
    }

    /// Enqueue a line without blocking; dropped with an error when the queue is full.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), TrySendError<LogMsg>> {
        self.handle.try_log(level, text, target)
    }

    /// Cloneable sink to hand to other threads.
    #[must_use]
    pub fn handle(&self) -> LoggerHandle {
        self.handle.clone()
    }

    /// Next line of the activity feed, if any.
    #[must_use]
    pub fn try_recv_activity(&self) -> Option<String> {
        self.activity_rx.try_recv().ok()
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

fn exe_dir_fallback_cwd() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// `YYYYMMDD_HHMMSS` in UTC, or `unix_<secs>` if the date cannot be represented.
fn timestamp_for_filename() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    unix_to_utc(secs).map_or_else(
        |_| format!("unix_{secs}"),
        |tm| {
            format!(
                "{:04}{:02}{:02}_{:02}{:02}{:02}",
                tm.year, tm.mon, tm.day, tm.hour, tm.min, tm.sec
            )
        },
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SimpleUtc {
    year: i32,
    mon: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
}

#[derive(Debug)]
enum UtcConvError {
    Year,
    Month,
    Day,
}

/// Civil-from-days conversion of a UNIX timestamp.
#[allow(clippy::many_single_char_names)]
fn unix_to_utc(mut s: u64) -> Result<SimpleUtc, UtcConvError> {
    let sec = (s % 60) as u32;
    s /= 60;
    let min = (s % 60) as u32;
    s /= 60;
    let hour = (s % 24) as u32;
    s /= 24;

    let z: i128 = i128::from(s) + 719_468;

    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = mp + if mp < 10 { 3 } else { -9 };

    let year_i = y + i128::from(m <= 2);

    let year = i32::try_from(year_i).map_err(|_| UtcConvError::Year)?;
    let mon = u32::try_from(m).map_err(|_| UtcConvError::Month)?;
    let day = u32::try_from(d).map_err(|_| UtcConvError::Day)?;

    Ok(SimpleUtc {
        year,
        mon,
        day,
        hour,
        min,
        sec,
    })
}

/// Expands a leading `~` to the user's home directory.
fn expand_path(path_str: &str) -> PathBuf {
    if path_str.starts_with('~') {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from);

        if let Some(mut home_path) = home {
            if path_str == "~" {
                return home_path;
            }
            if path_str.starts_with("~/") || path_str.starts_with("~\\") {
                home_path.push(&path_str[2..]);
                return home_path;
            }
        }
    }
    PathBuf::from(path_str)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn unix_epoch_and_known_date_convert() {
        let epoch = unix_to_utc(0).expect("epoch converts");
        assert_eq!((epoch.year, epoch.mon, epoch.day), (1970, 1, 1));

        // 2024-02-29T12:34:56Z
        let leap = unix_to_utc(1_709_210_096).expect("date converts");
        assert_eq!(
            leap,
            SimpleUtc {
                year: 2024,
                mon: 2,
                day: 29,
                hour: 12,
                min: 34,
                sec: 56
            }
        );
    }

    #[test]
    fn expand_path_leaves_plain_paths_alone() {
        assert_eq!(expand_path("/var/log/deepdrop"), PathBuf::from("/var/log/deepdrop"));
    }

    #[test]
    fn warnings_reach_the_activity_feed_and_the_file() {
        let dir = std::env::temp_dir().join(format!("deepdrop_logger_test_{}", std::process::id()));
        let logger = Logger::start_in_dir(&dir, Some("test"), LoggerOptions::default());

        logger
            .try_log(LogLevel::Warn, "signal to unknown session dropped", "test")
            .expect("queue has room");

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut line = None;
        while Instant::now() < deadline {
            if let Some(l) = logger.try_recv_activity() {
                line = Some(l);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        let line = line.expect("warning forwarded to activity feed");
        assert!(line.contains("signal to unknown session dropped"));
        assert!(logger.file_path().starts_with(&dir));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn peer_logger_follows_logging_section() {
        let dir = std::env::temp_dir().join(format!("deepdrop_peer_log_{}", std::process::id()));
        let config = Config::parse(&format!(
            "[Logging]\npeer_log_filename = laptop\npeer_log_path = {}\nlevel = warn\n",
            dir.display()
        ));
        let opts = LoggerOptions {
            sample_every: 1,
            ..LoggerOptions::default()
        };
        let logger = Logger::start_peer(opts, Arc::new(config));

        let name = logger.file_path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(logger.file_path().starts_with(&dir));
        assert!(name.starts_with("laptop-"), "{name}");

        logger.try_log(LogLevel::Info, "below threshold", "test").unwrap();
        logger.try_log(LogLevel::Warn, "transfer timed out", "test").unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut first = None;
        while Instant::now() < deadline && first.is_none() {
            first = logger.try_recv_activity();
            std::thread::sleep(Duration::from_millis(10));
        }
        let first = first.expect("warning forwarded");
        assert!(first.contains("transfer timed out"), "{first}");

        let _ = fs::remove_dir_all(&dir);
    }
}
