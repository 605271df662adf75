//! Logging for credsync.
//!
//! Routes every `log::*!` call to stderr and, when configured, appends the
//! same lines to a log file:
//!
//! ```text
//! [2026-10-15 09:12:44.031] [INFO ] [credsync::handler] Profile prod has been updated
//! ```
//!
//! Level precedence: `--log-level` flag, then `RUST_LOG`, then the settings
//! file, then `info`.

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

struct LogBridge {
    level: LevelFilter,
    file: Option<Mutex<File>>,
}

impl LogBridge {
    fn format(record: &Record<'_>) -> String {
        let level_str = match record.level() {
            log::Level::Error => "ERROR",
            log::Level::Warn => "WARN ",
            log::Level::Info => "INFO ",
            log::Level::Debug => "DEBUG",
            log::Level::Trace => "TRACE",
        };
        format!(
            "[{}] [{}] [{}] {}\n",
            get_timestamp(),
            level_str,
            record.target(),
            record.args()
        )
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = Self::format(record);

        let _ = std::io::stderr().write_all(line.as_bytes());
        if let Some(file) = &self.file {
            let mut file = file.lock();
            let _ = file.write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
        if let Some(file) = &self.file {
            let _ = file.lock().flush();
        }
    }
}

static BRIDGE: OnceLock<LogBridge> = OnceLock::new();

fn get_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.3f")
        .to_string()
}

/// Pick the effective level: CLI flag, then `RUST_LOG`, then settings, then `info`.
///
/// A `RUST_LOG` value that is not a plain level (e.g. `credsync=debug`) is
/// ignored.
pub fn resolve_level(
    cli_level: Option<LevelFilter>,
    env_value: Option<&str>,
    settings_level: Option<LevelFilter>,
) -> LevelFilter {
    cli_level
        .or_else(|| env_value.and_then(|v| LevelFilter::from_str(v.trim()).ok()))
        .or(settings_level)
        .unwrap_or(LevelFilter::Info)
}

/// Install the logger. Only the first call has any effect.
///
/// A log file that cannot be opened is reported on stderr and skipped.
pub fn init_log_bridge(
    cli_level: Option<LevelFilter>,
    settings_level: Option<LevelFilter>,
    log_file: Option<&Path>,
) {
    let env_value = std::env::var("RUST_LOG").ok();
    let level = resolve_level(cli_level, env_value.as_deref(), settings_level);

    let file = log_file.and_then(|path| {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Some(Mutex::new(f)),
            Err(e) => {
                eprintln!("credsync: cannot open log file {}: {}", path.display(), e);
                None
            }
        }
    });

    let bridge = BRIDGE.get_or_init(|| LogBridge { level, file });
    if log::set_logger(bridge).is_ok() {
        log::set_max_level(bridge.level);
    }
}
