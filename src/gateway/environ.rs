//! Per-request call environment handed to the application
//!
//! The environment is built fresh for every request and passed to the
//! application exactly once. Keys follow the WSGI/CGI naming.

use std::collections::BTreeMap;
use std::io::{self, Cursor, Write};
use std::net::IpAddr;

use super::request::RequestLine;
use crate::logger;

pub const WSGI_VERSION: (u8, u8) = (1, 0);
pub const URL_SCHEME: &str = "http";

/// Keys that are always present, in the order `keys()` reports them
const WSGI_KEYS: [&str; 7] = [
    "wsgi.version",
    "wsgi.url_scheme",
    "wsgi.input",
    "wsgi.errors",
    "wsgi.multithread",
    "wsgi.multiprocess",
    "wsgi.run_once",
];

/// Name and port recorded when the listening endpoint was bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    pub name: String,
    pub port: u16,
}

/// A value looked up by key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvValue<'a> {
    Version(u8, u8),
    Text(&'a str),
    Flag(bool),
    /// `wsgi.input` / `wsgi.errors`; use `Environ::input` / `Environ::errors`
    Stream,
}

/// Write sink behind `wsgi.errors`
///
/// Complete lines are forwarded to the error log as they are written; a
/// trailing partial line is forwarded on flush or drop.
#[derive(Debug, Default)]
pub struct ErrorStream {
    pending: Vec<u8>,
    lines: usize,
}

impl ErrorStream {
    /// Number of lines forwarded so far
    pub const fn lines_written(&self) -> usize {
        self.lines
    }

    fn emit(&mut self, line: &[u8]) {
        let text = String::from_utf8_lossy(line);
        logger::log_app_error(text.trim_end_matches('\r'));
        self.lines += 1;
    }
}

impl Write for ErrorStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line[..line.len() - 1]);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.emit(&line);
        }
        Ok(())
    }
}

impl Drop for ErrorStream {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// The call environment for one request
#[derive(Debug)]
pub struct Environ {
    input: Cursor<String>,
    errors: ErrorStream,
    vars: BTreeMap<String, String>,
}

impl Environ {
    /// Build the environment from the raw request text and its parsed line.
    pub fn new(
        raw: String,
        line: &RequestLine,
        server: &ServerIdentity,
        remote_addr: Option<IpAddr>,
    ) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert("REQUEST_METHOD".to_string(), line.method.clone());
        vars.insert("PATH_INFO".to_string(), line.path.clone());
        vars.insert("SERVER_PROTOCOL".to_string(), line.version.clone());
        vars.insert("SERVER_NAME".to_string(), server.name.clone());
        vars.insert("SERVER_PORT".to_string(), server.port.to_string());
        if let Some(addr) = remote_addr {
            vars.insert("REMOTE_ADDR".to_string(), addr.to_string());
        }

        Self {
            input: Cursor::new(raw),
            errors: ErrorStream::default(),
            vars,
        }
    }

    /// Look up any key, WSGI or CGI
    pub fn get(&self, key: &str) -> Option<EnvValue<'_>> {
        match key {
            "wsgi.version" => Some(EnvValue::Version(WSGI_VERSION.0, WSGI_VERSION.1)),
            "wsgi.url_scheme" => Some(EnvValue::Text(URL_SCHEME)),
            "wsgi.input" | "wsgi.errors" => Some(EnvValue::Stream),
            "wsgi.multithread" | "wsgi.multiprocess" | "wsgi.run_once" => {
                Some(EnvValue::Flag(false))
            }
            _ => self.vars.get(key).map(|v| EnvValue::Text(v)),
        }
    }

    /// Text value of a CGI key
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn request_method(&self) -> &str {
        self.var("REQUEST_METHOD").unwrap_or_default()
    }

    pub fn path_info(&self) -> &str {
        self.var("PATH_INFO").unwrap_or_default()
    }

    /// `wsgi.input`: the full raw request text, positioned at its start
    pub fn input(&mut self) -> &mut Cursor<String> {
        &mut self.input
    }

    /// `wsgi.errors`
    pub fn errors(&mut self) -> &mut ErrorStream {
        &mut self.errors
    }

    /// All keys, WSGI keys first, then CGI keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        WSGI_KEYS
            .iter()
            .copied()
            .chain(self.vars.keys().map(String::as_str))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}
