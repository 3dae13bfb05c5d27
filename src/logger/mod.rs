//! Internal logger with feature-gated levels.
//! - `log-info` enables `info!` output.
//! - `log-debug` enables `debug!` output and a runtime debug flag.
//! - `verbose` enables `verbose!`, an untagged printer for user-facing progress.
//! - `file-logging` redirects tagged messages to a log file (verbose output never goes to file).
//! - `warn!` and `error!` are always active.
//!
//! Messages emitted from optimizer worker threads carry the worker's thread
//! name so interleaved runs stay readable.

use std::fmt::Arguments;
#[cfg(feature = "log-debug")]
use std::sync::atomic::AtomicBool;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::LazyLock;

#[cfg(feature = "file-logging")]
use std::{
    fs::{File, OpenOptions},
    io::Write,
    sync::Mutex,
};

/// Prefix shared by the names of optimizer worker threads.
pub const WORKER_THREAD_PREFIX: &str = "examsched-worker";

/// Logging levels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    /// Error-level messages (always enabled).
    Error = 1,
    /// Warning-level messages (always enabled).
    Warn = 2,
    /// Info-level messages (requires `log-info` feature).
    Info = 3,
    /// Debug-level messages (requires `log-debug` feature and runtime flag).
    Debug = 4,
}

impl Level {
    /// Parse a level name (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "error" | "err" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }

    const fn tag(self) -> &'static str {
        match self {
            Self::Error => "[ERROR]",
            Self::Warn => "[WARN]",
            Self::Info => "[INFO]",
            Self::Debug => "[DEBUG]",
        }
    }
}

/// Library callers only see warnings and errors until a level is set.
/// The CLI raises it from `--log-level`, `--debug` or config.
const fn default_level() -> u8 {
    Level::Warn as u8
}

static LOG_LEVEL: LazyLock<AtomicU8> = LazyLock::new(|| AtomicU8::new(default_level()));
#[cfg(feature = "log-debug")]
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
#[cfg(feature = "verbose")]
static VERBOSE_ENABLED: AtomicBool = AtomicBool::new(false);
#[cfg(feature = "file-logging")]
static LOG_FILE: LazyLock<Mutex<Option<File>>> = LazyLock::new(|| Mutex::new(None));

/// Set the global log level.
pub fn set_level(level: Level) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Current global log level.
#[must_use]
pub fn level() -> Level {
    match LOG_LEVEL.load(Ordering::SeqCst) {
        1 => Level::Error,
        2 => Level::Warn,
        3 => Level::Info,
        _ => Level::Debug,
    }
}

/// Parse and set level from a string (case-insensitive). Returns true on success.
#[must_use]
pub fn set_level_from_str(value: &str) -> bool {
    Level::parse(value).map(set_level).is_some()
}

/// Enable debug logging at runtime (no-op when log-debug is disabled).
#[cfg(feature = "log-debug")]
pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::SeqCst);
}
/// Enable debug logging at runtime (no-op when log-debug is disabled).
#[cfg(not(feature = "log-debug"))]
pub const fn enable_debug() {}

/// Disable debug logging at runtime (no-op when log-debug is disabled).
#[cfg(feature = "log-debug")]
pub fn disable_debug() {
    DEBUG_ENABLED.store(false, Ordering::SeqCst);
}
/// Disable debug logging at runtime (no-op when log-debug is disabled).
#[cfg(not(feature = "log-debug"))]
pub const fn disable_debug() {}

/// Returns whether debug logging is enabled.
#[cfg(feature = "log-debug")]
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::SeqCst)
}
/// Returns whether debug logging is enabled.
#[cfg(not(feature = "log-debug"))]
pub const fn is_debug_enabled() -> bool {
    false
}

/// Enable verbose output at runtime.
#[cfg(feature = "verbose")]
pub fn enable_verbose() {
    VERBOSE_ENABLED.store(true, Ordering::SeqCst);
}
/// Enable verbose output at runtime.
#[cfg(not(feature = "verbose"))]
pub const fn enable_verbose() {}

/// Disable verbose output at runtime.
#[cfg(feature = "verbose")]
pub fn disable_verbose() {
    VERBOSE_ENABLED.store(false, Ordering::SeqCst);
}
/// Disable verbose output at runtime.
#[cfg(not(feature = "verbose"))]
pub const fn disable_verbose() {}

/// Returns whether verbose output is enabled.
#[cfg(feature = "verbose")]
pub fn is_verbose_enabled() -> bool {
    VERBOSE_ENABLED.load(Ordering::SeqCst)
}
/// Returns whether verbose output is enabled.
#[cfg(not(feature = "verbose"))]
pub const fn is_verbose_enabled() -> bool {
    false
}

/// Initialize file logging to the specified path.
/// Returns true on success, false on failure.
#[cfg(feature = "file-logging")]
#[must_use]
pub fn init_file_logging(path: &std::path::Path) -> bool {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return false;
    };
    match LOG_FILE.lock() {
        Ok(mut log_file) => {
            *log_file = Some(file);
            true
        }
        Err(_) => false,
    }
}

/// Initialize file logging to the specified path.
/// Returns true on success, false on failure.
#[cfg(not(feature = "file-logging"))]
#[must_use]
pub const fn init_file_logging(_path: &std::path::Path) -> bool {
    false
}

/// Stop writing to the log file; later messages go back to the console.
#[cfg(feature = "file-logging")]
pub fn close_file_logging() {
    if let Ok(mut log_file) = LOG_FILE.lock() {
        *log_file = None;
    }
}

/// Stop writing to the log file; later messages go back to the console.
#[cfg(not(feature = "file-logging"))]
pub const fn close_file_logging() {}

/// Try to write to the log file. Returns false when no file is active.
#[cfg(feature = "file-logging")]
fn write_to_file(message: &str) -> bool {
    let Ok(mut log_file) = LOG_FILE.lock() else {
        return false;
    };
    match log_file.as_mut() {
        Some(file) => {
            let _ = writeln!(file, "{message}");
            let _ = file.flush();
            true
        }
        None => false,
    }
}

#[cfg(not(feature = "file-logging"))]
const fn write_to_file(_message: &str) -> bool {
    false
}

/// Thread tag for worker threads, empty elsewhere.
fn thread_tag() -> String {
    std::thread::current()
        .name()
        .filter(|name| name.starts_with(WORKER_THREAD_PREFIX))
        .map(|name| format!("<{name}> "))
        .unwrap_or_default()
}

fn should_log(level: Level) -> bool {
    should_log_at(level, LOG_LEVEL.load(Ordering::SeqCst)) && (level != Level::Debug || is_debug_enabled())
}

/// Feature and threshold check, without the runtime debug flag
const fn should_log_at(level: Level, current: u8) -> bool {
    match level {
        Level::Info if !cfg!(feature = "log-info") => false,
        Level::Debug if !cfg!(feature = "log-debug") => false,
        _ => (level as u8) <= current,
    }
}

/// Internal logging dispatch used by the public macros.
pub fn log_impl(level: Level, args: Arguments) {
    if !should_log(level) {
        return;
    }
    let line = format!("{} {}{args}", level.tag(), thread_tag());
    if write_to_file(&line) {
        return;
    }
    match level {
        Level::Error | Level::Warn => eprintln!("{line}"),
        Level::Info | Level::Debug => println!("{line}"),
    }
}

/// Logs an error-level message (always enabled). Emits to stderr.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::logger::log_impl($crate::logger::Level::Error, format_args!($($arg)*)) };
}

/// Logs a warning-level message (always enabled). Emits to stderr.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::logger::log_impl($crate::logger::Level::Warn, format_args!($($arg)*)) };
}

/// Logs an info-level message (requires `log-info` feature).
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::logger::log_impl($crate::logger::Level::Info, format_args!($($arg)*)) };
}

/// Logs a debug-level message (requires `log-debug` feature and runtime enablement).
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::logger::log_impl($crate::logger::Level::Debug, format_args!($($arg)*)) };
}

/// Prints an untagged message when verbose output is enabled. Never written to log files.
#[macro_export]
macro_rules! verbose {
    ($($arg:tt)*) => {
        if $crate::logger::is_verbose_enabled() {
            println!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("ERROR"), Some(Level::Error));
        assert_eq!(Level::parse("warning"), Some(Level::Warn));
        assert_eq!(Level::parse("info"), Some(Level::Info));
        assert_eq!(Level::parse("Debug"), Some(Level::Debug));
        assert_eq!(Level::parse("trace"), None);
    }

    #[test]
    fn test_default_level_is_warn() {
        assert_eq!(default_level(), Level::Warn as u8);
        assert!(!should_log_at(Level::Info, default_level()));
        assert!(!should_log_at(Level::Debug, default_level()));
        assert!(should_log_at(Level::Warn, default_level()));
    }

    #[test]
    fn test_thread_tag_only_on_workers() {
        assert_eq!(thread_tag(), "");

        let tag = std::thread::Builder::new()
            .name(format!("{WORKER_THREAD_PREFIX}-2"))
            .spawn(thread_tag)
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(tag, "<examsched-worker-2> ");
    }

    #[test]
    fn test_macros_do_not_panic() {
        crate::info!("info {}", 1);
        crate::warn!("warn {}", 2);
        crate::error!("error {}", 3);
        crate::debug!("debug {}", 4);
        crate::verbose!("verbose {}", 5);
    }
}
