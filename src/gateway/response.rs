//! Response registration and wire assembly
//!
//! The application registers its status and headers through
//! `StartResponse`, a single-slot holder. `assemble` turns the registered
//! metadata and the body chunks into the bytes written to the client.

use chrono::Utc;

/// Source of the `Date` header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateHeader {
    /// Current time in IMF-fixdate form
    Clock,
    /// Literal value
    Fixed(String),
}

impl DateHeader {
    pub fn value(&self) -> String {
        match self {
            Self::Clock => Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
            Self::Fixed(value) => value.clone(),
        }
    }
}

/// The two headers prepended to every response, `Date` then `Server`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHeaders {
    pub date: DateHeader,
    pub server: String,
}

impl ServerHeaders {
    pub fn new(date: DateHeader, server: impl Into<String>) -> Self {
        Self {
            date,
            server: server.into(),
        }
    }

    fn render(&self) -> Vec<(String, String)> {
        vec![
            ("Date".to_string(), self.date.value()),
            ("Server".to_string(), self.server.clone()),
        ]
    }
}

/// Status text and ordered headers registered by the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMetadata {
    pub status: String,
    pub headers: Vec<(String, String)>,
}

/// Response registration capability passed to the application
///
/// Each call to `start_response` replaces whatever was registered before.
#[derive(Debug)]
pub struct StartResponse {
    server_headers: ServerHeaders,
    slot: Option<ResponseMetadata>,
    calls: usize,
}

impl StartResponse {
    pub const fn new(server_headers: ServerHeaders) -> Self {
        Self {
            server_headers,
            slot: None,
            calls: 0,
        }
    }

    /// Register the response status and headers.
    ///
    /// Server headers come first, followed by `headers` in the given order;
    /// duplicates are kept. `exc_info` is only reported: nothing has been
    /// sent yet, so there is never anything to abort.
    pub fn start_response<S, N, V>(
        &mut self,
        status: S,
        headers: impl IntoIterator<Item = (N, V)>,
        exc_info: Option<&dyn std::error::Error>,
    ) where
        S: Into<String>,
        N: Into<String>,
        V: Into<String>,
    {
        if let Some(err) = exc_info {
            crate::logger::log_warning(&format!(
                "Application re-registered response after error: {err}"
            ));
        }

        let mut all_headers = self.server_headers.render();
        all_headers.extend(headers.into_iter().map(|(n, v)| (n.into(), v.into())));

        self.calls += 1;
        self.slot = Some(ResponseMetadata {
            status: status.into(),
            headers: all_headers,
        });
    }

    pub const fn is_registered(&self) -> bool {
        self.slot.is_some()
    }

    /// How many times the application registered a response
    pub const fn calls(&self) -> usize {
        self.calls
    }

    /// Take the registered metadata, leaving the slot empty
    pub fn take(&mut self) -> Option<ResponseMetadata> {
        self.slot.take()
    }
}

/// The application's response body: a finite sequence of byte chunks,
/// consumed once, in order
pub struct ResponseBody {
    chunks: Box<dyn Iterator<Item = Vec<u8>>>,
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self::from_chunks(Vec::<Vec<u8>>::new())
    }

    /// Body made of a single chunk
    pub fn once(chunk: impl Into<Vec<u8>>) -> Self {
        Self::from_chunks([chunk.into()])
    }

    /// Lazily wrap any iterator of chunks
    pub fn from_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        I::IntoIter: 'static,
        C: Into<Vec<u8>> + 'static,
    {
        Self {
            chunks: Box::new(chunks.into_iter().map(Into::<Vec<u8>>::into)),
        }
    }
}

impl Iterator for ResponseBody {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.next()
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}

/// Response text ready for the wire, with the body length kept for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledResponse {
    pub text: String,
    pub status: String,
    pub body_bytes: usize,
}

impl AssembledResponse {
    pub fn into_bytes(self) -> Vec<u8> {
        self.text.into_bytes()
    }
}

/// Render the status line, headers, blank line and body into one buffer.
///
/// Every chunk is decoded as UTF-8 and appended in order; a chunk that is
/// not valid UTF-8 aborts assembly.
pub fn assemble(
    protocol_literal: &str,
    metadata: ResponseMetadata,
    body: ResponseBody,
) -> crate::error::Result<AssembledResponse> {
    let mut text = format!("HTTP/{protocol_literal} {}\r\n", metadata.status);
    for (name, value) in &metadata.headers {
        text.push_str(name);
        text.push_str(": ");
        text.push_str(value);
        text.push_str("\r\n");
    }
    text.push_str("\r\n");

    let head_len = text.len();
    for chunk in body {
        text.push_str(&String::from_utf8(chunk)?);
    }

    Ok(AssembledResponse {
        body_bytes: text.len() - head_len,
        text,
        status: metadata.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;

    const FIXED_DATE: &str = "Sun, 24 Nov 2024 04:42:00 GMT";

    fn registrar() -> StartResponse {
        StartResponse::new(ServerHeaders::new(
            DateHeader::Fixed(FIXED_DATE.to_string()),
            "WSGIServer 0.2",
        ))
    }

    /// Split an assembled response back into status, headers and body
    fn split_response(bytes: &[u8]) -> (String, Vec<(String, String)>, String) {
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let (head, body) = text.split_once("\r\n\r\n").unwrap();
        let mut lines = head.split("\r\n");
        let status_line = lines.next().unwrap();
        let status = status_line.split_once(' ').unwrap().1.to_string();
        let headers = lines
            .map(|l| {
                let (n, v) = l.split_once(": ").unwrap();
                (n.to_string(), v.to_string())
            })
            .collect();
        (status, headers, body.to_string())
    }

    #[test]
    fn test_server_headers_prepended() {
        let mut sr = registrar();
        sr.start_response("200 OK", [("Content-Type", "text/plain")], None);
        let meta = sr.take().unwrap();
        assert_eq!(meta.status, "200 OK");
        assert_eq!(
            meta.headers,
            vec![
                ("Date".to_string(), FIXED_DATE.to_string()),
                ("Server".to_string(), "WSGIServer 0.2".to_string()),
                ("Content-Type".to_string(), "text/plain".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_headers_kept() {
        let mut sr = registrar();
        sr.start_response("200 OK", [("Server", "app"), ("X-A", "1"), ("X-A", "2")], None);
        let meta = sr.take().unwrap();
        let servers: Vec<_> = meta.headers.iter().filter(|(n, _)| n == "Server").collect();
        assert_eq!(servers.len(), 2);
        assert_eq!(meta.headers[1].1, "WSGIServer 0.2");
        assert_eq!(meta.headers[2].1, "app");
        assert_eq!(meta.headers.len(), 5);
    }

    #[test]
    fn test_second_registration_overwrites() {
        let mut sr = registrar();
        sr.start_response("500 Internal Server Error", [("X-First", "1")], None);
        sr.start_response("201 Created", [("X-Second", "2")], None);
        assert_eq!(sr.calls(), 2);
        let meta = sr.take().unwrap();
        assert_eq!(meta.status, "201 Created");
        assert!(meta.headers.iter().all(|(n, _)| n != "X-First"));
        assert!(!sr.is_registered());
    }

    #[test]
    fn test_exc_info_accepted() {
        let mut sr = registrar();
        let err = std::io::Error::other("boom");
        sr.start_response(
            "500 Internal Server Error",
            Vec::<(String, String)>::new(),
            Some(&err),
        );
        assert_eq!(sr.take().unwrap().status, "500 Internal Server Error");
    }

    #[test]
    fn test_assemble_hello() {
        let mut sr = registrar();
        sr.start_response("200 OK", [("Content-Type", "text/plain")], None);
        let resp = assemble("1.1", sr.take().unwrap(), ResponseBody::once(&b"hi"[..])).unwrap();
        assert_eq!(
            resp.text,
            format!(
                "HTTP/1.1 200 OK\r\nDate: {FIXED_DATE}\r\nServer: WSGIServer 0.2\r\nContent-Type: text/plain\r\n\r\nhi"
            )
        );
        assert_eq!(resp.body_bytes, 2);
        assert_eq!(resp.status, "200 OK");
    }

    #[test]
    fn test_assemble_uses_protocol_literal() {
        let mut sr = registrar();
        sr.start_response("404 Not Found", Vec::<(&str, &str)>::new(), None);
        let resp = assemble("2.1", sr.take().unwrap(), ResponseBody::empty()).unwrap();
        assert!(resp.text.starts_with("HTTP/2.1 404 Not Found\r\n"));
    }

    #[test]
    fn test_assemble_empty_body() {
        let mut sr = registrar();
        sr.start_response("204 No Content", Vec::<(&str, &str)>::new(), None);
        let resp = assemble("1.1", sr.take().unwrap(), ResponseBody::empty()).unwrap();
        assert!(resp.text.ends_with("\r\n\r\n"));
        assert_eq!(resp.body_bytes, 0);
    }

    #[test]
    fn test_assemble_concatenates_chunks_in_order() {
        let mut sr = registrar();
        sr.start_response("200 OK", Vec::<(&str, &str)>::new(), None);
        let body = ResponseBody::from_chunks(vec![b"Hello".to_vec(), b", ".to_vec(), b"World!".to_vec()]);
        let resp = assemble("1.1", sr.take().unwrap(), body).unwrap();
        assert!(resp.text.ends_with("\r\n\r\nHello, World!"));
        assert_eq!(resp.body_bytes, 13);
    }

    #[test]
    fn test_assemble_rejects_invalid_utf8_chunk() {
        let mut sr = registrar();
        sr.start_response("200 OK", Vec::<(&str, &str)>::new(), None);
        let body = ResponseBody::from_chunks(vec![vec![0xff, 0xfe]]);
        let err = assemble("1.1", sr.take().unwrap(), body).unwrap_err();
        assert!(matches!(err, GatewayError::BodyDecode(_)));
    }

    #[test]
    fn test_round_trip_split() {
        let mut sr = registrar();
        sr.start_response(
            "200 OK",
            [("Content-Type", "text/plain"), ("X-Trace", "abc")],
            None,
        );
        let meta = sr.take().unwrap();
        let expected_headers = meta.headers.clone();
        let body = ResponseBody::from_chunks(vec![b"line one\r\n".to_vec(), b"line two".to_vec()]);
        let bytes = assemble("1.1", meta, body).unwrap().into_bytes();

        let (status, headers, body) = split_response(&bytes);
        assert_eq!(status, "200 OK");
        assert_eq!(headers, expected_headers);
        assert_eq!(body, "line one\r\nline two");
    }

    #[test]
    fn test_clock_date_format() {
        let value = DateHeader::Clock.value();
        assert!(value.ends_with(" GMT"));
        assert_eq!(value.len(), "Sun, 24 Nov 2024 04:42:00 GMT".len());
        assert!(chrono::NaiveDateTime::parse_from_str(&value, "%a, %d %b %Y %H:%M:%S GMT").is_ok());
    }

    #[test]
    fn test_body_from_lazy_string_chunks() {
        let body = ResponseBody::from_chunks((1..=3).map(|n| format!("chunk {n};")));
        let chunks: Vec<Vec<u8>> = body.collect();
        assert_eq!(chunks.concat(), b"chunk 1;chunk 2;chunk 3;");
    }
}
