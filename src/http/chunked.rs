//! `Transfer-Encoding: chunked` reader and writer

use std::io::{self, BufRead, Read, Write};

use crate::error::CodecError;

use super::BodyRead;

/// Default chunk payload size for [`ChunkedWriter`]
pub const DEFAULT_BLOCK_SIZE: usize = 8192;

/// Longest size or trailer line accepted
const MAX_LINE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Expecting a chunk-size line
    Size,
    /// Inside a chunk with this many bytes left
    Data(u64),
    /// Expecting the line break after a chunk's data
    DataEnd,
    Trailers,
    Done,
    /// A framing error was reported; nothing more will be read
    Failed,
}

/// Decodes a chunked body from a buffered transport.
///
/// Reads never go past the terminating chunk and trailer section, so the
/// transport is left positioned at the next message.
pub struct ChunkedReader<R: BufRead> {
    inner: R,
    state: State,
    trailers: Vec<(String, String)>,
    closed: bool,
}

impl<R: BufRead> ChunkedReader<R> {
    pub fn new(inner: R) -> Self {
        ChunkedReader {
            inner,
            state: State::Size,
            trailers: Vec::new(),
            closed: false,
        }
    }

    /// Trailer headers, available once the body has been read to the end
    pub fn trailers(&self) -> &[(String, String)] {
        &self.trailers
    }

    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fail(&mut self, message: impl Into<String>) -> io::Error {
        let message = message.into();
        tracing::debug!(%message, "chunked body failed");
        self.state = State::Failed;
        CodecError::framing_io(message)
    }

    /// One line without its line break; `None` at end of stream
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        loop {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                if line.is_empty() {
                    return Ok(None);
                }
                return Err(self.fail("stream ended inside a chunk line"));
            }
            let (taken, complete) = match memchr::memchr(b'\n', available) {
                Some(i) => {
                    line.extend_from_slice(&available[..i]);
                    (i + 1, true)
                }
                None => {
                    line.extend_from_slice(available);
                    (available.len(), false)
                }
            };
            self.inner.consume(taken);
            if line.len() > MAX_LINE {
                return Err(self.fail("chunk line too long"));
            }
            if complete {
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(line));
            }
        }
    }

    fn read_size(&mut self) -> io::Result<()> {
        let line = match self.read_line()? {
            Some(line) => line,
            None => return Err(self.fail("stream ended before a chunk size")),
        };
        // Extensions after ';' are ignored
        let size = line.split(|&b| b == b';').next().unwrap_or_default();
        let size = String::from_utf8_lossy(size);
        let size = size.trim();
        let parsed = if size.is_empty() {
            None
        } else {
            u64::from_str_radix(size, 16).ok()
        };
        match parsed {
            Some(0) => self.state = State::Trailers,
            Some(n) => self.state = State::Data(n),
            None => return Err(self.fail(format!("invalid chunk size {:?}", size))),
        }
        Ok(())
    }

    fn read_trailers(&mut self) -> io::Result<()> {
        loop {
            let line = match self.read_line()? {
                Some(line) => line,
                None => return Err(self.fail("stream ended inside the trailer section")),
            };
            if line.is_empty() {
                self.state = State::Done;
                return Ok(());
            }
            let line = String::from_utf8_lossy(&line);
            match line.split_once(':') {
                Some((name, value)) => self
                    .trailers
                    .push((name.trim().to_string(), value.trim().to_string())),
                None => return Err(self.fail(format!("malformed trailer {:?}", line))),
            }
        }
    }
}

impl<R: BufRead> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.state {
                State::Done | State::Failed => return Ok(0),
                State::Size => self.read_size()?,
                State::Trailers => self.read_trailers()?,
                State::DataEnd => match self.read_line()? {
                    Some(line) if line.is_empty() => self.state = State::Size,
                    Some(_) => return Err(self.fail("missing line break after chunk data")),
                    None => return Err(self.fail("stream ended after chunk data")),
                },
                State::Data(remaining) => {
                    if buf.is_empty() {
                        return Ok(0);
                    }
                    let limit = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
                    let n = self.inner.read(&mut buf[..limit])?;
                    if n == 0 {
                        return Err(self.fail(format!("stream ended with {} chunk bytes owed", remaining)));
                    }
                    let left = remaining - n as u64;
                    self.state = if left == 0 { State::DataEnd } else { State::Data(left) };
                    return Ok(n);
                }
            }
        }
    }
}

impl<R: BufRead> BodyRead for ChunkedReader<R> {
    /// Drain the rest of the body so the transport stays aligned
    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        io::copy(self, &mut io::sink())?;
        Ok(())
    }
}

/// Encodes writes as chunks of at most `block_size` bytes
pub struct ChunkedWriter<W: Write> {
    inner: W,
    buffer: Vec<u8>,
    block_size: usize,
    closed: bool,
}

impl<W: Write> ChunkedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_block_size(inner, DEFAULT_BLOCK_SIZE)
    }

    pub fn with_block_size(inner: W, block_size: usize) -> Self {
        let block_size = block_size.max(1);
        ChunkedWriter {
            inner,
            buffer: Vec::with_capacity(block_size),
            block_size,
            closed: false,
        }
    }

    fn write_chunk(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        write!(self.inner, "{:x}\r\n", self.buffer.len())?;
        self.inner.write_all(&self.buffer)?;
        self.inner.write_all(b"\r\n")?;
        self.buffer.clear();
        Ok(())
    }

    /// Flush any buffered data and write the terminating chunk; repeat calls do nothing
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.write_chunk()?;
        self.inner.write_all(b"0\r\n\r\n")?;
        self.inner.flush()?;
        self.closed = true;
        Ok(())
    }

    /// Close and hand back the transport
    pub fn finish(mut self) -> io::Result<W> {
        self.close()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for ChunkedWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "chunked body already closed"));
        }
        let room = self.block_size - self.buffer.len();
        let n = data.len().min(room);
        self.buffer.extend_from_slice(&data[..n]);
        if self.buffer.len() == self.block_size {
            self.write_chunk()?;
        }
        Ok(n)
    }

    /// Sends buffered data as a (possibly short) chunk
    fn flush(&mut self) -> io::Result<()> {
        if !self.closed {
            self.write_chunk()?;
        }
        self.inner.flush()
    }
}
