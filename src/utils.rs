use anyhow::Result;
use chrono::{DateTime, Local};
use log::{LevelFilter, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

// The terminal belongs to the UI while the client runs, so log lines go to a file.

pub struct SimpleLogger {
    log_file: Option<Mutex<File>>,
}

impl SimpleLogger {
    pub fn new(log_file_path: Option<&Path>) -> Result<Self> {
        let log_file = match log_file_path {
            Some(path) => Some(Mutex::new(
                OpenOptions::new().create(true).append(true).open(path)?,
            )),
            None => None,
        };

        Ok(SimpleLogger { log_file })
    }

    fn format(record: &Record) -> String {
        let now: DateTime<Local> = Local::now();
        format!(
            "[{}] {} [{}:{}] {}\n",
            now.format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.file().unwrap_or("unknown"),
            record.line().unwrap_or(0),
            record.args()
        )
    }
}

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = Self::format(record);
        match &self.log_file {
            Some(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = file.write_all(line.as_bytes());
                }
            }
            None => print!("{}", line),
        }
    }

    fn flush(&self) {
        match &self.log_file {
            Some(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = file.flush();
                }
            }
            None => {
                let _ = std::io::stdout().flush();
            }
        }
    }
}

pub fn setup_logging(log_file: Option<&Path>, level: LevelFilter) -> Result<()> {
    let logger = SimpleLogger::new(log_file)?;
    log::set_boxed_logger(Box::new(logger)).map(|()| log::set_max_level(level))?;

    log::info!("Logging initialized at level: {}", level);
    log::info!("{} version {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Ok(())
}
