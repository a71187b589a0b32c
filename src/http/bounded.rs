//! `Content-Length` bounded body reader

use std::io::{self, Read};

use crate::error::CodecError;

use super::BodyRead;

/// Serves at most `limit` bytes of the underlying stream.
///
/// With no limit every read is delegated unchanged, for bodies that end when
/// the connection closes.
pub struct BoundedReader<R: Read> {
    inner: R,
    limit: Option<u64>,
    remaining: u64,
    closed: bool,
}

impl<R: Read> BoundedReader<R> {
    pub fn new(inner: R, limit: Option<u64>) -> Self {
        BoundedReader {
            inner,
            limit,
            remaining: limit.unwrap_or(0),
            closed: false,
        }
    }

    /// Bytes still owed by the body; `None` when unbounded
    pub fn remaining(&self) -> Option<u64> {
        self.limit.map(|_| self.remaining)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for BoundedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            return Ok(0);
        }
        if self.limit.is_none() {
            return self.inner.read(buf);
        }
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let limit = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..limit])?;
        if n == 0 {
            let owed = self.remaining;
            self.remaining = 0;
            return Err(CodecError::framing_io(format!(
                "body ended {} bytes short of its Content-Length",
                owed
            )));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}

impl<R: Read> BodyRead for BoundedReader<R> {
    /// Skip unread body bytes, then stop serving reads
    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        if self.limit.is_some() && self.remaining > 0 {
            io::copy(self, &mut io::sink())?;
        }
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_stop_at_limit() {
        let mut reader = BoundedReader::new(&b"hello world"[..], Some(5));
        let mut body = String::new();
        reader.read_to_string(&mut body).unwrap();
        assert_eq!(body, "hello");
        assert_eq!(reader.remaining(), Some(0));
        assert_eq!(reader.into_inner(), b" world");
    }

    #[test]
    fn test_unbounded_delegates() {
        let mut reader = BoundedReader::new(&b"all of it"[..], None);
        let mut body = Vec::new();
        reader.read_to_end(&mut body).unwrap();
        assert_eq!(body, b"all of it");
        assert_eq!(reader.remaining(), None);
    }

    #[test]
    fn test_short_body_is_framing_error() {
        let mut reader = BoundedReader::new(&b"abc"[..], Some(10));
        let mut body = Vec::new();
        let err = reader.read_to_end(&mut body).unwrap_err();
        assert!(matches!(CodecError::from(err), CodecError::Framing { .. }));
    }

    #[test]
    fn test_close_drains_to_limit_once() {
        let mut reader = BoundedReader::new(&b"0123456789next"[..], Some(10));
        let mut first = [0u8; 3];
        reader.read_exact(&mut first).unwrap();
        reader.close().unwrap();
        reader.close().unwrap();
        assert_eq!(reader.read(&mut first).unwrap(), 0);
        assert_eq!(reader.into_inner(), b"next");
    }
}
