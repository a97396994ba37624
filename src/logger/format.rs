//! Access log format module
//!
//! Supports multiple log formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - `json` (JSON structured logging)
//! - Custom patterns with variables

use chrono::Local;

/// Access log entry describing one completed exchange
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client IP address
    pub remote_addr: String,
    /// Request timestamp
    pub time: chrono::DateTime<Local>,
    /// Request method token
    pub method: String,
    /// Request target path
    pub path: String,
    /// Protocol version token as sent by the client (e.g. `HTTP/1.1`)
    pub protocol: String,
    /// Status text registered by the application (e.g. `200 OK`)
    pub status: String,
    /// Response body size in bytes
    pub body_bytes: usize,
    /// Exchange processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, path: String, protocol: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            protocol,
            status: String::new(),
            body_bytes: 0,
            request_time_us: 0,
        }
    }

    /// Numeric part of the status text, `-` when absent
    fn status_code(&self) -> &str {
        self.status.split_whitespace().next().unwrap_or("-")
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    /// Combined format; the gateway never parses headers, so referer and
    /// user agent are always `-`
    fn format_combined(&self) -> String {
        format!("{} \"-\" \"-\"", self.format_common())
    }

    /// Common Log Format (CLF)
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} {}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.path,
            self.protocol,
            self.status_code(),
            self.body_bytes,
        )
    }

    /// JSON structured log format
    fn format_json(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "protocol": self.protocol,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$remote_addr` - Client IP address
    /// - `$time_local` - Local time in Common Log Format
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$request` - Full request line ("METHOD /path PROTOCOL")
    /// - `$request_method` - Request method
    /// - `$request_uri` - Request path
    /// - `$status_line` - Full registered status text
    /// - `$status` - Status code
    /// - `$body_bytes_sent` - Response body size
    /// - `$request_time` - Processing time in seconds (3 decimal places)
    fn format_custom(&self, pattern: &str) -> String {
        let mut result = pattern.to_string();

        let request_line = format!("{} {} {}", self.method, self.path, self.protocol);

        result = result.replace("$remote_addr", &self.remote_addr);
        result = result.replace(
            "$time_local",
            &self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string(),
        );
        result = result.replace("$time_iso8601", &self.time.to_rfc3339());
        // Order matters: longer variables first to avoid partial replacement
        // $request_time must come before $request
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;
        result = result.replace("$request_time", &format!("{request_time:.3}"));
        result = result.replace("$request_method", &self.method);
        result = result.replace("$request_uri", &self.path);
        result = result.replace("$request", &request_line);
        result = result.replace("$status_line", &self.status);
        result = result.replace("$status", self.status_code());
        result = result.replace("$body_bytes_sent", &self.body_bytes.to_string());

        result
    }
}
