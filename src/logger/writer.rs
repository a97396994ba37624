//! Log writer module
//!
//! Provides thread-safe log writing to files or stdout/stderr.
//! The trace target carries the request/response mirror and access entries,
//! the error target carries warnings, errors and `wsgi.errors` output.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use super::LogLevel;

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    /// Write to stdout
    Stdout,
    /// Write to stderr
    Stderr,
    /// Write to file
    File(Mutex<File>),
}

/// Thread-safe log writer
pub struct LogWriter {
    /// Trace/access log target
    trace: LogTarget,
    /// Error log target
    error: LogTarget,
    /// Minimum level written
    level: LogLevel,
    /// Whether request/response lines are mirrored
    trace_enabled: bool,
    /// Whether access entries are written
    access_enabled: bool,
}

impl LogWriter {
    /// Create a new log writer with optional file paths
    fn new(
        trace_log_file: Option<&str>,
        error_log_file: Option<&str>,
        level: LogLevel,
        trace_enabled: bool,
        access_enabled: bool,
    ) -> io::Result<Self> {
        let trace = match trace_log_file {
            Some(path) => LogTarget::File(Mutex::new(open_log_file(path)?)),
            None => LogTarget::Stdout,
        };

        let error = match error_log_file {
            Some(path) => LogTarget::File(Mutex::new(open_log_file(path)?)),
            None => LogTarget::Stderr,
        };

        Ok(Self {
            trace,
            error,
            level,
            trace_enabled,
            access_enabled,
        })
    }

    /// Write to trace log
    pub fn write_trace(&self, message: &str) {
        write_to_target(&self.trace, message);
    }

    /// Write to error log
    pub fn write_error(&self, message: &str) {
        write_to_target(&self.error, message);
    }

    pub const fn level(&self) -> LogLevel {
        self.level
    }

    pub const fn trace_enabled(&self) -> bool {
        self.trace_enabled
    }

    pub const fn access_enabled(&self) -> bool {
        self.access_enabled
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Write message to log target; failures are swallowed
fn write_to_target(target: &LogTarget, message: &str) {
    match target {
        LogTarget::Stdout => {
            let _ = writeln!(io::stdout().lock(), "{message}");
        }
        LogTarget::Stderr => {
            let _ = writeln!(io::stderr().lock(), "{message}");
        }
        LogTarget::File(file) => {
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(f, "{message}");
            }
        }
    }
}

/// Initialize the global log writer
///
/// This should be called once at application startup.
/// Returns error if log files cannot be opened.
pub fn init(
    trace_log_file: Option<&str>,
    error_log_file: Option<&str>,
    level: LogLevel,
    trace_enabled: bool,
    access_enabled: bool,
) -> io::Result<()> {
    let writer = LogWriter::new(
        trace_log_file,
        error_log_file,
        level,
        trace_enabled,
        access_enabled,
    )?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if `init()` has been called
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}
