//! Transfer-coding streams
//!
//! Byte-level adapters between an HTTP transport and the codec:
//!
//! - [`ChunkedReader`] / [`ChunkedWriter`]: `Transfer-Encoding: chunked`
//! - [`BoundedReader`]: `Content-Length` bodies, or bodies that end at close
//! - [`NotifyingReader`]: tells the connection owner when a body is done
//!
//! Framing failures are reported as `io::Error` of kind `InvalidData`
//! carrying a [`crate::CodecError::Framing`], which `CodecError::from`
//! unwraps again.

mod bounded;
mod chunked;
mod framing;
mod notify;

use std::io::{self, BufRead, Read};

use crate::builder::{self, ParseOptions};
use crate::core::encoding::Charset;
use crate::error::Result;
use crate::model::Envelope;
use crate::trace::NoTrace;

pub use bounded::BoundedReader;
pub use chunked::{ChunkedReader, ChunkedWriter, DEFAULT_BLOCK_SIZE};
pub use framing::{keep_alive, open_body, BodyFraming};
pub use notify::NotifyingReader;

/// A message body: readable, and closable without leaving unread bytes on
/// the transport
pub trait BodyRead: Read {
    /// Finish with the body. Calling it again does nothing.
    fn close(&mut self) -> io::Result<()>;
}

impl<B: BodyRead + ?Sized> BodyRead for Box<B> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<B: BodyRead + ?Sized> BodyRead for &mut B {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Parse one framed message body off a transport and close the body.
///
/// `content_type` selects the charset (UTF-8 when absent or unusable).
pub fn read_message<R: BufRead>(reader: R, framing: BodyFraming, content_type: Option<&str>) -> Result<Envelope> {
    let charset = Charset::from_content_type(content_type);
    let options = ParseOptions::default().with_charset(charset);
    let mut body = open_body(reader, framing);
    let envelope = builder::parse_with(&mut body, &options, &mut NoTrace)?;
    body.close()?;
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use std::io::Write;

    const BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?><CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="3" PROTOCOLVERSION="1.0"><SIMPLERSP><IMETHODRESPONSE NAME="DeleteInstance"/></SIMPLERSP></MESSAGE></CIM>"#;

    #[test]
    fn test_read_chunked_message() {
        let mut writer = ChunkedWriter::with_block_size(Vec::new(), 16);
        writer.write_all(BODY.as_bytes()).unwrap();
        let mut wire = writer.finish().unwrap();
        wire.extend_from_slice(b"HTTP/1.1 200 OK");
        let mut transport = &wire[..];
        let envelope = read_message(&mut transport, BodyFraming::Chunked, Some("application/xml; charset=utf-8")).unwrap();
        assert_eq!(envelope.message_id, "3");
        assert_eq!(transport, b"HTTP/1.1 200 OK");
    }

    #[test]
    fn test_short_length_body_fails() {
        let err = read_message(&BODY.as_bytes()[..40], BodyFraming::Length(BODY.len() as u64), None).unwrap_err();
        assert!(matches!(err, CodecError::Framing { .. }));
    }
}
