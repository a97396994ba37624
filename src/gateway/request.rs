//! Request decoding and request-line parsing
//!
//! Only the first line of the request is interpreted. Headers and body stay
//! in the raw text handed to the application through `wsgi.input`.

use crate::error::{GatewayError, Result};

/// The three tokens of an HTTP request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub path: String,
    pub version: String,
}

impl RequestLine {
    /// Parse the first line of `text` into method, path and version.
    ///
    /// The first line ends at any line break (`\n`, `\r`, `\r\n` or one of
    /// the other Unicode line separators). It is split on runs of whitespace
    /// and must yield exactly three tokens. Anything else is a
    /// `MalformedRequest`.
    pub fn parse(text: &str) -> Result<Self> {
        let first_line = text.split(is_line_break).next().unwrap_or_default();
        if first_line.is_empty() {
            return Err(GatewayError::MalformedRequest(
                "empty request".to_string(),
            ));
        }

        let tokens: Vec<&str> = first_line.split_whitespace().collect();
        match tokens.as_slice() {
            [method, path, version] => Ok(Self {
                method: (*method).to_string(),
                path: (*path).to_string(),
                version: (*version).to_string(),
            }),
            _ => Err(GatewayError::MalformedRequest(format!(
                "expected 3 request-line tokens, found {} in {first_line:?}",
                tokens.len()
            ))),
        }
    }
}

/// Characters that end a line of request text
const fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\x0b'
            | '\x0c'
            | '\x1c'
            | '\x1d'
            | '\x1e'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

/// Decode raw request bytes as UTF-8 text
pub fn decode(raw: &[u8]) -> Result<String> {
    String::from_utf8(raw.to_vec())
        .map_err(|e| GatewayError::MalformedRequest(format!("request is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_line() {
        let line = RequestLine::parse("GET /hello HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
        assert_eq!(line.method, "GET");
        assert_eq!(line.path, "/hello");
        assert_eq!(line.version, "HTTP/1.1");
    }

    #[test]
    fn test_parse_whitespace_runs() {
        let line = RequestLine::parse("POST \t /a/b?x=1   HTTP/1.0\n").unwrap();
        assert_eq!(line.method, "POST");
        assert_eq!(line.path, "/a/b?x=1");
        assert_eq!(line.version, "HTTP/1.0");
    }

    #[test]
    fn test_parse_without_line_terminator() {
        let line = RequestLine::parse("DELETE /item/7 HTTP/1.1").unwrap();
        assert_eq!(line.path, "/item/7");
    }

    #[test]
    fn test_parse_bare_cr_terminator() {
        let line = RequestLine::parse("GET /hello HTTP/1.1\rHost: x\r\n\r\n").unwrap();
        assert_eq!(line.method, "GET");
        assert_eq!(line.path, "/hello");
        assert_eq!(line.version, "HTTP/1.1");
    }

    #[test]
    fn test_parse_other_line_breaks() {
        for text in [
            "GET /a HTTP/1.1\x0bHost: x",
            "GET /a HTTP/1.1\x0cHost: x",
            "GET /a HTTP/1.1\u{2028}Host: x",
        ] {
            let line = RequestLine::parse(text).unwrap();
            assert_eq!(line.path, "/a");
            assert_eq!(line.version, "HTTP/1.1");
        }
    }

    #[test]
    fn test_parse_two_tokens_is_malformed() {
        let err = RequestLine::parse("GET /hello\r\n\r\n").unwrap_err();
        assert!(matches!(err, GatewayError::MalformedRequest(_)));
    }

    #[test]
    fn test_parse_four_tokens_is_malformed() {
        let err = RequestLine::parse("GET /a b HTTP/1.1\r\n").unwrap_err();
        assert!(matches!(err, GatewayError::MalformedRequest(_)));
    }

    #[test]
    fn test_parse_empty_is_malformed() {
        assert!(matches!(
            RequestLine::parse(""),
            Err(GatewayError::MalformedRequest(_))
        ));
        assert!(matches!(
            RequestLine::parse("\r\n"),
            Err(GatewayError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = decode(&[0x47, 0x45, 0x54, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedRequest(_)));
    }

    #[test]
    fn test_decode_valid() {
        assert_eq!(decode(b"GET / HTTP/1.1").unwrap(), "GET / HTTP/1.1");
    }
}
