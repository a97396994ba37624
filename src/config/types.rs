// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Default single-read ceiling for an inbound request, in bytes
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
}

/// Listening endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind host; empty means all interfaces
    pub host: String,
    pub port: u16,
    /// Pending connection queue length
    pub backlog: i32,
    /// Overrides the `SERVER_NAME` resolved at bind time
    #[serde(default)]
    pub server_name: Option<String>,
    /// What the serve loop does after a failed exchange
    pub on_error: ErrorPolicy,
}

/// Loop behaviour after an exchange fails
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the failure and accept the next connection
    #[default]
    Continue,
    /// Stop serving and return the error to the caller
    Halt,
}

/// Request translation configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub read_chunk_size: usize,
    /// Literal token written after `HTTP/` on the status line
    pub protocol_literal: String,
    /// Value of the `Server` header
    pub server_software: String,
    /// Fixed `Date` header value (live clock when unset)
    #[serde(default)]
    pub fixed_date: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// Mirror request/response lines with `< ` / `> ` prefixes
    pub trace: bool,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Trace and access log file path (optional, stdout if not set)
    #[serde(default)]
    pub trace_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            protocol_literal: "1.1".to_string(),
            server_software: "WSGIServer 0.2".to_string(),
            fixed_date: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 8888,
            backlog: 128,
            server_name: None,
            on_error: ErrorPolicy::Continue,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            trace: true,
            access_log: true,
            access_log_format: default_access_log_format(),
            trace_log_file: None,
            error_log_file: None,
        }
    }
}
