//! Minimal single-threaded HTTP-to-application gateway
//!
//! Accepts one TCP connection at a time, parses the request line, hands a
//! WSGI-style call environment to an [`gateway::Application`] and writes the
//! registered status, headers and body back to the client.

pub mod apps;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logger;
pub mod server;

pub use error::{GatewayError, Result};
pub use gateway::{Application, Environ, ResponseBody, StartResponse};
pub use server::{Server, ServerOptions};
