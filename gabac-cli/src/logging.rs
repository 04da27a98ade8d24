use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Writes log records to the standard error, so they never mix with symbols
/// or files written to the standard output.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        eprintln!(
            "{} {:<5} {}: {}",
            Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.module_path().unwrap_or_else(|| record.target()),
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

pub fn init_logging(filter: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(filter))
}
