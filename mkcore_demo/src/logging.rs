use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = match record.level() {
            Level::Error => 31,
            Level::Warn => 93,
            Level::Info => 34,
            Level::Debug => 32,
            Level::Trace => 90,
        };
        eprintln!(
            "\u{1B}[{}m[{:>5}] {}\u{1B}[0m",
            color,
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// `level` falls back to the `LOG` environment variable, then `info`.
pub fn init(level: Option<&str>) -> Result<(), SetLoggerError> {
    let env = std::env::var("LOG").ok();
    let filter = match level.or(env.as_deref()) {
        Some("error") | Some("ERROR") => LevelFilter::Error,
        Some("warn") | Some("WARN") => LevelFilter::Warn,
        Some("debug") | Some("DEBUG") => LevelFilter::Debug,
        Some("trace") | Some("TRACE") => LevelFilter::Trace,
        Some("off") | Some("OFF") => LevelFilter::Off,
        _ => LevelFilter::Info,
    };
    log::set_logger(&LOGGER)?;
    log::set_max_level(filter);
    Ok(())
}
