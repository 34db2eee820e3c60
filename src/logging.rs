//! File logging for spindle.
//!
//! The terminal belongs to the UI, so log records only go to a file at
//! `$XDG_DATA_HOME/spindle/logs/spindle.log` (or `logging.file` when set).

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::config::LoggingSettings;

const LOG_FILE_NAME: &str = "spindle.log";
const ROTATE_BYTES: u64 = 10 * 1024 * 1024;

/// Directory holding the log file when no override is configured.
pub fn log_directory() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("spindle").join("logs"))
}

/// Log file location honoring the `logging.file` override.
pub fn log_file_path(settings: &LoggingSettings) -> Option<PathBuf> {
    match &settings.file {
        Some(path) => Some(path.clone()),
        None => log_directory().map(|d| d.join(LOG_FILE_NAME)),
    }
}

/// Move an oversized log aside so the next session starts a fresh file.
fn rotate_if_large(log_path: &Path) {
    if let Ok(metadata) = fs::metadata(log_path) {
        if metadata.len() > ROTATE_BYTES {
            let backup_path = log_path.with_extension("log.old");
            let _ = fs::rename(log_path, backup_path);
        }
    }
}

/// Initialize the logging system.
///
/// Must run before the terminal switches to the alternate screen: failures are
/// reported on stderr and leave logging disabled. Returns the log file path.
pub fn init_logging(settings: &LoggingSettings, level: LevelFilter) -> Option<PathBuf> {
    if level == LevelFilter::Off {
        return None;
    }

    let Some(log_path) = log_file_path(settings) else {
        eprintln!("spindle: could not determine log directory, logging disabled");
        return None;
    };

    if let Some(dir) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("spindle: could not create log directory: {e}");
            return None;
        }
    }

    rotate_if_large(&log_path);

    let log_file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("spindle: could not open log file: {e}");
            return None;
        }
    };

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Debug)
        .set_target_level(LevelFilter::Off)
        .build();

    if WriteLogger::init(level, config, log_file).is_err() {
        eprintln!("spindle: logger already initialized");
    }

    log::info!("=== spindle session started ===");
    log::info!("Log file: {}", log_path.display());

    Some(log_path)
}
