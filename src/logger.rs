// Console logger. Records are kept in a ring buffer that the `l` command prints,
// warnings and errors go to a log file (APP_LOG_FILE, default tvshows-browser.log),
// and APP_LOG_STDERR=1 echoes every record to stderr for runs without the console view.

use lazy_static::lazy_static;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::backtrace::Backtrace;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

const MAX_LOG_LINES: usize = 5000;
const DEFAULT_LOG_FILE: &str = "tvshows-browser.log";

#[derive(Clone)]
struct LogEntry {
    level: Level,
    target: String,
    msg: String,
}

impl LogEntry {
    fn short(&self) -> String {
        format!("[{:>5}] {}: {}", self.level, self.target, self.msg)
    }
}

#[derive(Default)]
struct Sink {
    recent: VecDeque<LogEntry>,
    file: Option<File>,
}

impl Sink {
    fn push(&mut self, entry: LogEntry) {
        if self.recent.len() == MAX_LOG_LINES {
            self.recent.pop_front();
        }
        self.recent.push_back(entry);
    }

    fn persist(&mut self, line: &str) {
        if let Some(f) = self.file.as_mut() {
            let _ = writeln!(f, "{}", line);
            let _ = f.flush();
        }
    }
}

lazy_static! {
    static ref SINK: Mutex<Sink> = Mutex::new(Sink::default());
    static ref ECHO_STDERR: bool = std::env::var("APP_LOG_STDERR")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false);
}

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // reqwest/hyper/rustls only get through at info and above
        let ours = metadata.target().starts_with(env!("CARGO_CRATE_NAME"));
        if !ours && metadata.level() > Level::Info {
            return false;
        }
        log::max_level()
            .to_level()
            .is_some_and(|max| metadata.level() <= max)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry {
            level: record.level(),
            target: record.target().to_string(),
            msg: record.args().to_string(),
        };
        let stamped = format!("[{}] {}", timestamp_millis(), entry.short());
        if *ECHO_STDERR {
            eprintln!("{}", stamped);
        }

        let Ok(mut sink) = SINK.lock() else { return };
        if entry.level <= Level::Warn {
            sink.persist(&stamped);
        }
        sink.push(entry);
    }

    fn flush(&self) {
        if let Ok(mut sink) = SINK.lock() {
            if let Some(f) = sink.file.as_mut() {
                let _ = f.flush();
            }
        }
    }
}

// RUST_LOG is read loosely: the most verbose level named anywhere in it wins.
fn parse_level(val: &str) -> Option<LevelFilter> {
    let v = val.to_lowercase();
    [
        ("trace", LevelFilter::Trace),
        ("debug", LevelFilter::Debug),
        ("info", LevelFilter::Info),
        ("warn", LevelFilter::Warn),
        ("error", LevelFilter::Error),
        ("off", LevelFilter::Off),
    ]
    .into_iter()
    .find(|(name, _)| v.contains(name))
    .map(|(_, level)| level)
}

pub fn init() {
    let _ = log::set_boxed_logger(Box::new(ConsoleLogger));

    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| parse_level(&v))
        .unwrap_or(LevelFilter::Debug);
    log::set_max_level(level);

    let path = std::env::var("APP_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let file = OpenOptions::new().create(true).append(true).open(&path);
    let opened = file.is_ok();
    if let Ok(mut sink) = SINK.lock() {
        sink.file = file.ok();
    }

    install_panic_hook();

    if opened {
        log::info!("logging at {} (warnings also go to {})", level, path);
    } else {
        log::warn!("logging at {}; could not open {}", level, path);
    }
}

/// The last `n` buffered records, oldest first.
pub fn tail(n: usize) -> Vec<String> {
    let Ok(sink) = SINK.lock() else {
        return Vec::new();
    };
    let skip = sink.recent.len().saturating_sub(n);
    sink.recent.iter().skip(skip).map(LogEntry::short).collect()
}

fn timestamp_millis() -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("{}.{:03}", now.as_secs(), now.subsec_millis())
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info.payload();
        let msg = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        let loc = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let trace = Backtrace::force_capture();
        if let Ok(mut sink) = SINK.lock() {
            sink.persist(&format!("[{}] [ERROR] panic at {loc}: {msg}", timestamp_millis()));
            sink.persist(&format!("{trace}"));
        }
        eprintln!("panic at {loc}: {msg} (backtrace written to the log file)");
    }));
}
