use crate::error::AppError;
use log::{LevelFilter, Metadata, Record};
use once_cell::sync::OnceCell;
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "log.txt";

#[derive(Debug)]
struct FileLogger {
    log_file: PathBuf,
    level: LevelFilter,
}

static LOGGER: OnceCell<FileLogger> = OnceCell::new();

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let log_entry = format!("{} - {}\n", record.level(), record.args());

            if let Ok(mut file) = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_file)
            {
                let _ = file.write_all(log_entry.as_bytes());
            }
        }
    }

    fn flush(&self) {}
}

// Debug mode logs everything, otherwise Info and above.
pub fn level_for(debug_mode: bool) -> LevelFilter {
    if debug_mode {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

// Log into `<data_dir>/log.txt`.
pub fn init_in(data_dir: &Path, debug_mode: bool) -> Result<(), AppError> {
    create_dir_all(data_dir)?;
    let level = level_for(debug_mode);

    LOGGER
        .set(FileLogger {
            log_file: data_dir.join(LOG_FILE_NAME),
            level,
        })
        .map_err(|_| AppError::Logger("Logger already set".to_string()))?;
    let logger = LOGGER
        .get()
        .ok_or_else(|| AppError::Logger("Logger missing after initialization".to_string()))?;

    log::set_logger(logger)
        .map(|()| log::set_max_level(level))
        .map_err(|e| AppError::Logger(e.to_string()))
}

// Log into the application data directory under the home directory.
pub fn init(debug_mode: bool) -> Result<(), AppError> {
    init_in(&crate::settings::data_dir()?, debug_mode)
}
