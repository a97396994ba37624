//! Logger module
//!
//! Provides logging utilities for the gateway including:
//! - Server lifecycle logging
//! - Request/response trace mirroring (`< ` inbound, `> ` outbound)
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support
//!
//! None of these functions return errors: a failing log write must never
//! interrupt an exchange.

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::LoggingConfig;
use std::net::SocketAddr;

/// Minimum severity written by the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a level name; unknown names fall back to `Info`
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Self::Debug,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    writer::init(
        config.trace_log_file.as_deref(),
        config.error_log_file.as_deref(),
        LogLevel::parse(&config.level),
        config.trace,
        config.access_log,
    )
}

fn enabled(level: LogLevel) -> bool {
    writer::get().map_or(level >= LogLevel::Info, |w| level >= w.level())
}

/// Write to trace log
fn write_trace(message: &str) {
    match writer::get() {
        Some(w) => w.write_trace(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Prefix every line of `text` with `marker`, one output line per input line
pub fn mirror_lines(marker: &str, text: &str) -> String {
    text.lines()
        .map(|line| format!("{marker} {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn log_server_start(addr: &SocketAddr, server_name: &str, app_name: &str) {
    write_trace(&format!(
        "WSGIServer: Serving HTTP on port {} ...",
        addr.port()
    ));
    if enabled(LogLevel::Info) {
        write_trace(&format!("  - Bound to: {addr}"));
        write_trace(&format!("  - Server name: {server_name}"));
        write_trace(&format!("  - Application: {app_name}\n"));
    }
}

/// Mirror the inbound request text, `< ` per line
pub fn log_inbound(text: &str) {
    if writer::get().is_none_or(writer::LogWriter::trace_enabled) {
        write_trace(&format!("{}\n", mirror_lines("<", text)));
    }
}

/// Mirror the outbound response text, `> ` per line
pub fn log_outbound(text: &str) {
    if writer::get().is_none_or(writer::LogWriter::trace_enabled) {
        write_trace(&format!("{}\n", mirror_lines(">", text)));
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    if enabled(LogLevel::Debug) {
        write_trace(&format!("[Connection] Accepted from: {peer_addr}"));
    }
}

pub fn log_state_transition(peer_addr: &SocketAddr, from: &str, to: &str) {
    if enabled(LogLevel::Debug) {
        write_trace(&format!("[Connection] {peer_addr}: {from} -> {to}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    if writer::get().is_none_or(writer::LogWriter::access_enabled) {
        write_trace(&entry.format(format));
    }
}

/// Line written by the application to `wsgi.errors`
pub fn log_app_error(message: &str) {
    write_error(&format!("[APP] {message}"));
}

pub fn log_exchange_failed(peer_addr: &SocketAddr, err: &crate::error::GatewayError) {
    write_error(&format!(
        "[ERROR] Exchange with {peer_addr} failed ({}): {err}",
        err.kind()
    ));
}

pub fn log_error(message: &str) {
    if enabled(LogLevel::Error) {
        write_error(&format!("[ERROR] {message}"));
    }
}

pub fn log_warning(message: &str) {
    if enabled(LogLevel::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_shutdown(reason: &str) {
    write_trace(&format!("\n[Shutdown] {reason}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_lines() {
        let text = "GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n";
        assert_eq!(
            mirror_lines("<", text),
            "< GET /hello HTTP/1.1\n< Host: localhost\n< "
        );
    }

    #[test]
    fn test_mirror_lines_empty() {
        assert_eq!(mirror_lines(">", ""), "");
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::parse("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("error"), LogLevel::Error);
        assert_eq!(LogLevel::parse("nonsense"), LogLevel::Info);
        assert!(LogLevel::Warn > LogLevel::Info);
    }
}
