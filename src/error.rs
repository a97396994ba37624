//! Gateway error types
//!
//! Every failure of a request/response exchange surfaces as a `GatewayError`.
//! Nothing is retried; the serve loop decides what happens next according to
//! `server.on_error`.

use std::io;

/// Errors produced while binding, reading, translating or writing.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The listening endpoint could not be established.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The request bytes were not text, or the request line did not split
    /// into method, path and protocol version.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Response assembly was attempted before the application registered a
    /// status and headers.
    #[error("application returned without registering a response")]
    MissingResponseRegistration,

    /// A body chunk returned by the application was not valid UTF-8.
    #[error("response body chunk is not valid UTF-8: {0}")]
    BodyDecode(#[from] std::string::FromUtf8Error),

    /// Socket read/write/accept failure.
    #[error("connection I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// Short machine-friendly label used in log lines.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bind { .. } => "bind",
            Self::MalformedRequest(_) => "malformed_request",
            Self::MissingResponseRegistration => "missing_response_registration",
            Self::BodyDecode(_) => "body_decode",
            Self::Io(_) => "io",
        }
    }
}
