//! Charset Selection and Conversion
//!
//! The charset comes from the HTTP `Content-Type` header (default UTF-8 when
//! absent or unparsable). A byte order mark in the body overrides it.
//! Non-UTF-8 input is converted to UTF-8 on the fly by [`Transcoder`].

use std::io::{self, Read};

use crate::error::CodecError;

/// Character encodings a CIM-XML body may arrive in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    Iso8859_1,
    UsAscii,
}

impl Charset {
    /// Look up a charset by its IANA label (case-insensitive)
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().trim_matches('"').to_ascii_lowercase();
        match label.as_str() {
            "utf-8" | "utf8" => Some(Charset::Utf8),
            "utf-16le" => Some(Charset::Utf16Le),
            "utf-16be" | "utf-16" => Some(Charset::Utf16Be),
            "iso-8859-1" | "latin1" | "iso_8859-1" | "l1" => Some(Charset::Iso8859_1),
            "us-ascii" | "ascii" => Some(Charset::UsAscii),
            _ => None,
        }
    }

    /// Select the decode charset from a `Content-Type` header value.
    ///
    /// Falls back to UTF-8 when the header is absent, has no `charset`
    /// parameter, or names a charset we cannot decode.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(value) = content_type else {
            return Charset::Utf8;
        };
        let param = value.split(';').skip(1).find_map(|p| {
            let (name, val) = p.split_once('=')?;
            name.trim().eq_ignore_ascii_case("charset").then_some(val)
        });
        match param {
            None => Charset::Utf8,
            Some(label) => Self::from_label(label).unwrap_or_else(|| {
                tracing::warn!("Unsupported charset {:?} in Content-Type, using UTF-8", label);
                Charset::Utf8
            }),
        }
    }

    /// The label written in outgoing `Content-Type` headers
    pub fn label(&self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Utf16Le => "utf-16le",
            Charset::Utf16Be => "utf-16be",
            Charset::Iso8859_1 => "iso-8859-1",
            Charset::UsAscii => "us-ascii",
        }
    }

    /// Detect a byte order mark; returns the charset and the BOM length
    pub fn detect_bom(input: &[u8]) -> Option<(Self, usize)> {
        match input {
            [0xEF, 0xBB, 0xBF, ..] => Some((Charset::Utf8, 3)),
            [0xFF, 0xFE, ..] => Some((Charset::Utf16Le, 2)),
            [0xFE, 0xFF, ..] => Some((Charset::Utf16Be, 2)),
            _ => None,
        }
    }
}

/// Reader adapter that converts a body in any [`Charset`] to UTF-8
pub struct Transcoder<R: Read> {
    inner: R,
    charset: Charset,
    sniffed: bool,
    /// Undecoded input carried between reads (odd UTF-16 byte, split surrogate pair)
    raw: Vec<u8>,
    /// Decoded UTF-8 not yet handed out
    out: Vec<u8>,
    out_pos: usize,
    /// Position of the next decoded byte, for error reports
    line: u64,
    column: u64,
}

impl<R: Read> Transcoder<R> {
    pub fn new(inner: R, charset: Charset) -> Self {
        Transcoder {
            inner,
            charset,
            sniffed: false,
            raw: Vec::new(),
            out: Vec::new(),
            out_pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Charset in effect (after BOM detection, once the first read happened)
    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn sniff(&mut self) -> io::Result<()> {
        self.sniffed = true;
        let mut head = [0u8; 3];
        let mut len = 0;
        while len < head.len() {
            match self.inner.read(&mut head[len..]) {
                Ok(0) => break,
                Ok(n) => len += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        let head = &head[..len];
        let skip = match Charset::detect_bom(head) {
            Some((charset, bom_len)) => {
                if charset != self.charset {
                    tracing::debug!("Byte order mark selects {:?} over {:?}", charset, self.charset);
                }
                self.charset = charset;
                bom_len
            }
            None => 0,
        };
        self.decode(&head[skip..])
    }

    /// Move the error position past `out[from..]`
    fn advance(&mut self, from: usize) {
        let (mut line, mut column) = (self.line, self.column);
        for &b in &self.out[from..] {
            if b == b'\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        self.line = line;
        self.column = column;
    }

    /// Undecodable input is a document error, positioned after the bytes decoded so far
    fn malformed(&mut self, from: usize, message: String) -> io::Error {
        self.advance(from);
        CodecError::malformed_document(message, self.line, self.column).into_io()
    }

    /// Decode a block of raw input onto `out`
    fn decode(&mut self, input: &[u8]) -> io::Result<()> {
        let from = self.out.len();
        match self.charset {
            Charset::Utf8 => self.out.extend_from_slice(input),
            Charset::Iso8859_1 => {
                for &b in input {
                    let mut utf8 = [0u8; 2];
                    self.out
                        .extend_from_slice(char::from(b).encode_utf8(&mut utf8).as_bytes());
                }
            }
            Charset::UsAscii => {
                let valid = input.iter().take_while(|b| b.is_ascii()).count();
                self.out.extend_from_slice(&input[..valid]);
                if let Some(b) = input.get(valid) {
                    return Err(self.malformed(from, format!("byte 0x{:02x} is not US-ASCII", b)));
                }
            }
            Charset::Utf16Le | Charset::Utf16Be => {
                self.raw.extend_from_slice(input);
                let even = self.raw.len() & !1;
                let mut units: Vec<u16> = self.raw[..even]
                    .chunks_exact(2)
                    .map(|pair| match self.charset {
                        Charset::Utf16Le => u16::from_le_bytes([pair[0], pair[1]]),
                        _ => u16::from_be_bytes([pair[0], pair[1]]),
                    })
                    .collect();
                let mut keep = self.raw.len() - even;
                // A high surrogate at the end waits for its partner
                if matches!(units.last(), Some(0xD800..=0xDBFF)) {
                    units.pop();
                    keep += 2;
                }
                let tail = self.raw.split_off(self.raw.len() - keep);
                self.raw = tail;
                for decoded in char::decode_utf16(units) {
                    let c = match decoded {
                        Ok(c) => c,
                        Err(e) => {
                            let message = format!("unpaired surrogate 0x{:04x}", e.unpaired_surrogate());
                            return Err(self.malformed(from, message));
                        }
                    };
                    let mut utf8 = [0u8; 4];
                    self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
                }
            }
        }
        self.advance(from);
        Ok(())
    }
}

impl<R: Read> Read for Transcoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.sniffed {
            self.sniff()?;
        }
        if self.out_pos == self.out.len() {
            self.out.clear();
            self.out_pos = 0;
            // UTF-8 with nothing pending needs no copying
            if self.charset == Charset::Utf8 {
                return self.inner.read(buf);
            }
            let mut chunk = [0u8; 4096];
            while self.out.is_empty() {
                let n = self.inner.read(&mut chunk)?;
                if n == 0 {
                    if !self.raw.is_empty() {
                        let from = self.out.len();
                        return Err(self.malformed(from, "truncated UTF-16 sequence at end of body".into()));
                    }
                    return Ok(0);
                }
                self.decode(&chunk[..n])?;
            }
        }
        let n = buf.len().min(self.out.len() - self.out_pos);
        buf[..n].copy_from_slice(&self.out[self.out_pos..self.out_pos + n]);
        self.out_pos += n;
        Ok(n)
    }
}
