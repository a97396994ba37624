//! Request translator
//!
//! Turns the raw bytes of one request into the bytes of its response:
//! decode, parse the request line, build the environment, invoke the
//! application, assemble. Failures propagate to the caller untouched.

use std::net::IpAddr;

use super::app::Application;
use super::environ::{Environ, ServerIdentity};
use super::request::{self, RequestLine};
use super::response::{self, AssembledResponse, ResponseBody, ServerHeaders, StartResponse};
use crate::error::{GatewayError, Result};
use crate::logger;

/// Result of a successful translation
#[derive(Debug, Clone)]
pub struct Translation {
    pub request_line: RequestLine,
    pub response: AssembledResponse,
}

#[derive(Debug, Clone)]
pub struct Translator {
    protocol_literal: String,
    server_headers: ServerHeaders,
    server: ServerIdentity,
}

impl Translator {
    pub fn new(
        protocol_literal: impl Into<String>,
        server_headers: ServerHeaders,
        server: ServerIdentity,
    ) -> Self {
        Self {
            protocol_literal: protocol_literal.into(),
            server_headers,
            server,
        }
    }

    pub const fn server(&self) -> &ServerIdentity {
        &self.server
    }

    /// Decode the raw bytes, mirror them to the trace and parse the first line
    pub fn parse_request(&self, raw: &[u8]) -> Result<(String, RequestLine)> {
        let text = request::decode(raw)?;
        logger::log_inbound(&text);
        let line = RequestLine::parse(&text)?;
        Ok((text, line))
    }

    pub fn build_environ(
        &self,
        raw: String,
        line: &RequestLine,
        remote_addr: Option<IpAddr>,
    ) -> Environ {
        Environ::new(raw, line, &self.server, remote_addr)
    }

    /// Call the application with a fresh registration slot
    pub fn invoke(
        &self,
        app: &dyn Application,
        environ: &mut Environ,
    ) -> (StartResponse, ResponseBody) {
        let mut start_response = StartResponse::new(self.server_headers.clone());
        let body = app.call(environ, &mut start_response);
        (start_response, body)
    }

    /// Assemble the final response from the registered metadata and the body
    pub fn finish_response(
        &self,
        start_response: &mut StartResponse,
        body: ResponseBody,
    ) -> Result<AssembledResponse> {
        let metadata = start_response
            .take()
            .ok_or(GatewayError::MissingResponseRegistration)?;
        let response = response::assemble(&self.protocol_literal, metadata, body)?;
        logger::log_outbound(&response.text);
        Ok(response)
    }

    /// Run the whole pipeline for one request
    pub fn translate(
        &self,
        raw: &[u8],
        remote_addr: Option<IpAddr>,
        app: &dyn Application,
    ) -> Result<Translation> {
        let (text, request_line) = self.parse_request(raw)?;
        let mut environ = self.build_environ(text, &request_line, remote_addr);
        let (mut start_response, body) = self.invoke(app, &mut environ);
        let response = self.finish_response(&mut start_response, body)?;
        Ok(Translation {
            request_line,
            response,
        })
    }
}
