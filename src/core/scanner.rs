//! Streaming XML scanning using memchr
//!
//! The scanner owns a growable byte buffer filled on demand from any
//! `Read` source. All offsets handed out are relative to the read cursor,
//! so refilling (which compacts the buffer) never invalidates them.
//! Line and column are tracked as the cursor advances.

use memchr::{memchr, memchr_iter};
use std::io::{self, Read};

/// Buffer size for reading chunks
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Scanner over a streaming byte source
pub struct Scanner<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    pos: usize,
    end: usize,
    eof: bool,
    /// 1-based line of the cursor
    line: u64,
    /// Absolute offset of the first byte of the current line
    line_start: u64,
    /// Absolute offset of `buffer[0]`
    base: u64,
}

impl<R: Read> Scanner<R> {
    /// Create a new scanner for the given source
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new scanner with specified initial buffer capacity
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Scanner {
            reader,
            buffer: vec![0u8; capacity.max(16)],
            pos: 0,
            end: 0,
            eof: false,
            line: 1,
            line_start: 0,
            base: 0,
        }
    }

    /// Current (line, column), both 1-based; columns count bytes
    #[inline]
    pub fn position(&self) -> (u64, u64) {
        let abs = self.base + self.pos as u64;
        (self.line, abs - self.line_start + 1)
    }

    /// Number of buffered bytes after the cursor
    #[inline]
    pub fn available(&self) -> usize {
        self.end - self.pos
    }

    /// Read more data, compacting and growing the buffer as needed.
    /// Returns false once the source is exhausted.
    fn fill(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }

        if self.pos > 0 {
            let remaining = self.end - self.pos;
            if remaining > 0 {
                self.buffer.copy_within(self.pos..self.end, 0);
            }
            self.base += self.pos as u64;
            self.end = remaining;
            self.pos = 0;
        }

        if self.end == self.buffer.len() {
            let grown = self.buffer.len() * 2;
            self.buffer.resize(grown, 0);
        }

        loop {
            match self.reader.read(&mut self.buffer[self.end..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.end += n;
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Make sure at least `n` bytes are buffered; false if the source ends first
    pub fn ensure(&mut self, n: usize) -> io::Result<bool> {
        while self.available() < n {
            if !self.fill()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Check if we've reached the end of input
    pub fn is_eof(&mut self) -> io::Result<bool> {
        Ok(!self.ensure(1)?)
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&mut self) -> io::Result<Option<u8>> {
        self.peek_at(0)
    }

    /// Peek at byte at offset from current position
    pub fn peek_at(&mut self, offset: usize) -> io::Result<Option<u8>> {
        if !self.ensure(offset + 1)? {
            return Ok(None);
        }
        Ok(Some(self.buffer[self.pos + offset]))
    }

    /// Check if input starts with a byte sequence at current position
    pub fn starts_with(&mut self, needle: &[u8]) -> io::Result<bool> {
        if !self.ensure(needle.len())? {
            return Ok(false);
        }
        Ok(self.buffer[self.pos..self.end].starts_with(needle))
    }

    /// Buffered bytes from the cursor; call `ensure` first for a minimum length
    #[inline]
    pub fn remaining(&self) -> &[u8] {
        &self.buffer[self.pos..self.end]
    }

    /// Advance by n bytes, keeping line tracking current
    pub fn advance(&mut self, n: usize) {
        let n = n.min(self.available());
        let start = self.pos;
        for i in memchr_iter(b'\n', &self.buffer[start..start + n]) {
            self.line += 1;
            self.line_start = self.base + (start + i + 1) as u64;
        }
        self.pos += n;
    }

    /// Advance by n bytes and return them
    pub fn take(&mut self, n: usize) -> &[u8] {
        let n = n.min(self.available());
        let start = self.pos;
        self.advance(n);
        &self.buffer[start..start + n]
    }

    /// Skip whitespace characters (space, tab, newline, carriage return)
    pub fn skip_whitespace(&mut self) -> io::Result<()> {
        loop {
            let skip = self
                .remaining()
                .iter()
                .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
                .count();
            let exhausted = skip == self.available();
            self.advance(skip);
            if !exhausted || !self.fill()? {
                return Ok(());
            }
        }
    }

    /// Find next occurrence of a byte, relative to the cursor, reading ahead as needed
    pub fn find_byte(&mut self, byte: u8) -> io::Result<Option<usize>> {
        let mut searched = 0;
        loop {
            if let Some(i) = memchr(byte, &self.buffer[self.pos + searched..self.end]) {
                return Ok(Some(searched + i));
            }
            searched = self.available();
            if !self.fill()? {
                return Ok(None);
            }
        }
    }

    /// Find next occurrence of a byte sequence, relative to the cursor
    pub fn find_seq(&mut self, needle: &[u8]) -> io::Result<Option<usize>> {
        let Some(&first) = needle.first() else {
            return Ok(Some(0));
        };
        let mut from = 0;
        loop {
            let found = memchr(first, &self.buffer[self.pos + from..self.end]).map(|i| from + i);
            match found {
                Some(at) => {
                    if !self.ensure(at + needle.len())? {
                        return Ok(None);
                    }
                    if self.buffer[self.pos + at..].starts_with(needle) {
                        return Ok(Some(at));
                    }
                    from = at + 1;
                }
                None => {
                    from = self.available();
                    if !self.fill()? {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Find tag end while handling quotes properly.
    /// Returns the offset of '>' that is not inside quotes.
    pub fn find_tag_end_quoted(&mut self) -> io::Result<Option<usize>> {
        let mut offset = 0;
        let mut in_single_quote = false;
        let mut in_double_quote = false;

        loop {
            while self.pos + offset < self.end {
                match self.buffer[self.pos + offset] {
                    b'"' if !in_single_quote => in_double_quote = !in_double_quote,
                    b'\'' if !in_double_quote => in_single_quote = !in_single_quote,
                    b'>' if !in_single_quote && !in_double_quote => return Ok(Some(offset)),
                    _ => {}
                }
                offset += 1;
            }
            if !self.fill()? {
                return Ok(None);
            }
        }
    }

    /// Consume the underlying source
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Position of the byte at the end of `prefix`, given the position of its start
pub fn locate(start: (u64, u64), prefix: &[u8]) -> (u64, u64) {
    let (mut line, mut column) = start;
    let mut last_newline = None;
    for i in memchr_iter(b'\n', prefix) {
        line += 1;
        last_newline = Some(i);
    }
    match last_newline {
        Some(i) => column = (prefix.len() - i) as u64,
        None => column += prefix.len() as u64,
    }
    (line, column)
}
