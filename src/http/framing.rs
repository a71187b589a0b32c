//! Header-driven body framing

use std::io::BufRead;

use crate::error::{CodecError, Result};

use super::{BodyRead, BoundedReader, ChunkedReader};

/// How the end of a message body is found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// `Transfer-Encoding: chunked`
    Chunked,
    /// `Content-Length: n`
    Length(u64),
    /// Neither header: the body runs until the connection closes
    UntilClose,
}

impl BodyFraming {
    /// Framing from the `Transfer-Encoding` and `Content-Length` header values.
    ///
    /// Chunked wins when it is the final transfer coding; a `Content-Length`
    /// that is not a decimal number is a framing error.
    pub fn from_headers(transfer_encoding: Option<&str>, content_length: Option<&str>) -> Result<Self> {
        let chunked = transfer_encoding
            .and_then(|codings| codings.rsplit(',').next())
            .map_or(false, |last| last.trim().eq_ignore_ascii_case("chunked"));
        if chunked {
            return Ok(BodyFraming::Chunked);
        }
        if transfer_encoding.is_some() {
            return Ok(BodyFraming::UntilClose);
        }
        match content_length {
            None => Ok(BodyFraming::UntilClose),
            Some(text) => {
                let text = text.trim();
                if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(CodecError::framing(format!("invalid Content-Length {:?}", text)));
                }
                text.parse::<u64>()
                    .map(BodyFraming::Length)
                    .map_err(|_| CodecError::framing(format!("Content-Length {} out of range", text)))
            }
        }
    }
}

/// Body reader for a framing over a buffered transport
pub fn open_body<'a, R: BufRead + 'a>(reader: R, framing: BodyFraming) -> Box<dyn BodyRead + 'a> {
    match framing {
        BodyFraming::Chunked => Box::new(ChunkedReader::new(reader)),
        BodyFraming::Length(n) => Box::new(BoundedReader::new(reader, Some(n))),
        BodyFraming::UntilClose => Box::new(BoundedReader::new(reader, None)),
    }
}

/// Whether the connection stays open after this message
pub fn keep_alive(http_version: &str, connection: Option<&str>) -> bool {
    let has = |token: &str| {
        connection.map_or(false, |value| {
            value.split(',').any(|t| t.trim().eq_ignore_ascii_case(token))
        })
    };
    if has("close") {
        return false;
    }
    match http_version.trim().to_ascii_uppercase().as_str() {
        "HTTP/1.0" => has("keep-alive"),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_framing_from_headers() {
        assert_eq!(BodyFraming::from_headers(Some("chunked"), Some("10")).unwrap(), BodyFraming::Chunked);
        assert_eq!(BodyFraming::from_headers(Some("gzip, Chunked"), None).unwrap(), BodyFraming::Chunked);
        assert_eq!(BodyFraming::from_headers(Some("gzip"), None).unwrap(), BodyFraming::UntilClose);
        assert_eq!(BodyFraming::from_headers(None, Some(" 42 ")).unwrap(), BodyFraming::Length(42));
        assert_eq!(BodyFraming::from_headers(None, None).unwrap(), BodyFraming::UntilClose);
        assert!(matches!(
            BodyFraming::from_headers(None, Some("-1")),
            Err(CodecError::Framing { .. })
        ));
    }

    #[test]
    fn test_open_body_dispatch() {
        let mut body = String::new();
        open_body(&b"3\r\nabc\r\n0\r\n\r\n"[..], BodyFraming::Chunked)
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, "abc");
        body.clear();
        open_body(&b"abcdef"[..], BodyFraming::Length(4)).read_to_string(&mut body).unwrap();
        assert_eq!(body, "abcd");
    }

    #[test]
    fn test_keep_alive() {
        assert!(keep_alive("HTTP/1.1", None));
        assert!(!keep_alive("HTTP/1.1", Some("close")));
        assert!(!keep_alive("HTTP/1.0", None));
        assert!(keep_alive("HTTP/1.0", Some("Keep-Alive")));
        assert!(!keep_alive("HTTP/1.0", Some("keep-alive, close")));
    }
}
