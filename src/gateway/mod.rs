//! HTTP-to-application translation layer
//!
//! Independent of sockets: everything here works on bytes and text, which
//! keeps the protocol rules testable without a listener.

pub mod app;
pub mod environ;
pub mod request;
pub mod response;
pub mod translator;

// Re-export commonly used types
pub use app::Application;
pub use environ::{EnvValue, Environ, ErrorStream, ServerIdentity};
pub use request::RequestLine;
pub use response::{
    AssembledResponse, DateHeader, ResponseBody, ResponseMetadata, ServerHeaders, StartResponse,
};
pub use translator::{Translation, Translator};
