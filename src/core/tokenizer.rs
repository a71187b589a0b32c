//! XML Tokenizer - State machine for XML event extraction
//!
//! Implements a pull-parser over a streaming source that produces:
//! - StartDocument / EndDocument
//! - Element start (with attributes) and end
//! - Character data (text and CDATA, references decoded)
//!
//! Comments and processing instructions are skipped. Every end tag must
//! match the innermost open start tag. All failures are fatal and carry
//! the line/column where they were detected.

use std::io::Read;

use super::attributes::{parse_start_tag, read_name};
use super::entities::decode_text;
use super::scanner::{locate, Scanner};
use crate::error::{CodecError, Result};
use crate::reader::events::{EndElement, StartElement, XmlEvent};

/// Default limit on element nesting
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Current parsing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Nothing emitted yet
    Init,
    /// Before the root element
    Prolog,
    /// Inside the root element
    Content,
    /// After the root element closed
    Epilog,
    /// EndDocument emitted
    Done,
}

/// XML tokenizer implementing a pull-parser pattern
pub struct Tokenizer<R: Read> {
    scanner: Scanner<R>,
    state: ParseState,
    /// Open element names, innermost last
    stack: Vec<String>,
    /// Set after `<name/>` so the next call synthesizes the end event
    pending_end: bool,
    /// Processing instructions seen before the root element
    prolog_pis: usize,
    max_depth: usize,
}

impl<R: Read> Tokenizer<R> {
    /// Create a new tokenizer over a UTF-8 source
    pub fn new(reader: R) -> Self {
        Tokenizer {
            scanner: Scanner::new(reader),
            state: ParseState::Init,
            stack: Vec::new(),
            pending_end: false,
            prolog_pis: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit element nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Get the current parse state
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Current (line, column) in the input
    pub fn position(&self) -> (u64, u64) {
        self.scanner.position()
    }

    /// Current element nesting depth
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// True until EndDocument has been returned
    pub fn has_next(&self) -> bool {
        self.state != ParseState::Done
    }

    /// Consume the tokenizer, returning the source
    pub fn into_inner(self) -> R {
        self.scanner.into_inner()
    }

    fn error_at(&self, position: (u64, u64), message: impl Into<String>) -> CodecError {
        CodecError::malformed_document(message, position.0, position.1)
    }

    fn error(&self, message: impl Into<String>) -> CodecError {
        self.error_at(self.scanner.position(), message)
    }

    /// Get the next event
    pub fn next_event(&mut self) -> Result<XmlEvent> {
        let event = self.next_inner()?;
        #[cfg(feature = "trace_events")]
        tracing::trace!(depth = self.stack.len(), ?event, "xml event");
        Ok(event)
    }

    fn next_inner(&mut self) -> Result<XmlEvent> {
        match self.state {
            ParseState::Init => {
                self.state = ParseState::Prolog;
                return Ok(XmlEvent::StartDocument);
            }
            ParseState::Done => return Ok(XmlEvent::EndDocument),
            _ => {}
        }

        if self.pending_end {
            self.pending_end = false;
            return Ok(self.close_element());
        }

        loop {
            match self.state {
                ParseState::Prolog | ParseState::Epilog => {
                    if let Some(event) = self.next_outside_root()? {
                        return Ok(event);
                    }
                }
                ParseState::Content => {
                    if let Some(event) = self.next_in_content()? {
                        return Ok(event);
                    }
                }
                ParseState::Init | ParseState::Done => return Ok(XmlEvent::EndDocument),
            }
        }
    }

    /// Pop the innermost element and produce its end event
    fn close_element(&mut self) -> XmlEvent {
        let name = self.stack.pop().unwrap_or_default();
        if self.stack.is_empty() {
            self.state = ParseState::Epilog;
        }
        XmlEvent::EndElement(EndElement { name })
    }

    /// Before or after the root element: only whitespace, comments and PIs
    fn next_outside_root(&mut self) -> Result<Option<XmlEvent>> {
        self.scanner.skip_whitespace()?;

        if self.scanner.is_eof()? {
            if self.state == ParseState::Prolog {
                return Err(self.error("document has no root element"));
            }
            self.state = ParseState::Done;
            return Ok(Some(XmlEvent::EndDocument));
        }

        if self.scanner.starts_with(b"<?")? {
            if self.state == ParseState::Prolog {
                if self.prolog_pis > 0 {
                    return Err(self.error("second processing instruction before the root element"));
                }
                self.prolog_pis += 1;
            }
            self.skip_pi()?;
            return Ok(None);
        }
        if self.scanner.starts_with(b"<!--")? {
            self.skip_comment()?;
            return Ok(None);
        }
        if self.scanner.starts_with(b"<!DOCTYPE")? {
            if self.state == ParseState::Epilog {
                return Err(self.error("DOCTYPE after the root element"));
            }
            self.skip_doctype()?;
            return Ok(None);
        }
        if self.scanner.peek()? == Some(b'<') && self.scanner.peek_at(1)? != Some(b'/') {
            if self.state == ParseState::Epilog {
                return Err(self.error("content after the root element"));
            }
            return self.parse_start_tag().map(Some);
        }
        Err(self.error("content outside the root element"))
    }

    /// Inside the root element
    fn next_in_content(&mut self) -> Result<Option<XmlEvent>> {
        match self.scanner.peek()? {
            None => {
                let open = self.stack.last().cloned().unwrap_or_default();
                Err(self.error(format!("unexpected end of document inside <{}>", open)))
            }
            Some(b'<') => match self.scanner.peek_at(1)? {
                Some(b'/') => self.parse_end_tag().map(Some),
                Some(b'?') => {
                    self.skip_pi()?;
                    Ok(None)
                }
                Some(b'!') => {
                    if self.scanner.starts_with(b"<!--")? {
                        self.skip_comment()?;
                        Ok(None)
                    } else if self.scanner.starts_with(b"<![CDATA[")? {
                        self.parse_cdata().map(Some)
                    } else {
                        Err(self.error("invalid declaration inside element content"))
                    }
                }
                _ => self.parse_start_tag().map(Some),
            },
            Some(_) => self.parse_text().map(Some),
        }
    }

    /// Parse a start tag or empty element tag
    fn parse_start_tag(&mut self) -> Result<XmlEvent> {
        let start = self.scanner.position();
        let end = self
            .scanner
            .find_tag_end_quoted()?
            .ok_or_else(|| self.error("unterminated start tag"))?;
        let raw = self.scanner.take(end + 1);
        let content = &raw[1..raw.len() - 1];
        let tag = match parse_start_tag(content) {
            Ok(tag) => tag,
            Err(e) => {
                let at = locate((start.0, start.1 + 1), &content[..e.offset.min(content.len())]);
                return Err(self.error_at(at, e.message));
            }
        };

        if self.stack.len() >= self.max_depth {
            return Err(self.error_at(start, format!("element nesting exceeds {} levels", self.max_depth)));
        }
        self.state = ParseState::Content;
        self.stack.push(tag.name.clone());
        self.pending_end = tag.is_empty;
        Ok(XmlEvent::StartElement(StartElement::new(tag.name, tag.attributes)))
    }

    /// Parse an end tag and check it closes the innermost element
    fn parse_end_tag(&mut self) -> Result<XmlEvent> {
        let start = self.scanner.position();
        let end = self
            .scanner
            .find_byte(b'>')?
            .ok_or_else(|| self.error("unterminated end tag"))?;
        let raw = self.scanner.take(end + 1);
        let content = &raw[2..raw.len() - 1];
        let name_len = read_name(content).unwrap_or(0);
        let (name, rest) = content.split_at(name_len);
        if name.is_empty() || !rest.iter().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r')) {
            return Err(self.error_at(start, "malformed end tag"));
        }
        let name = String::from_utf8_lossy(name).into_owned();
        match self.stack.last() {
            Some(open) if *open == name => Ok(self.close_element()),
            Some(open) => Err(self.error_at(
                start,
                format!("mismatched end tag </{}>, expected </{}>", name, open),
            )),
            None => Err(self.error_at(start, format!("unexpected end tag </{}>", name))),
        }
    }

    /// Parse text up to the next '<' (or end of input)
    fn parse_text(&mut self) -> Result<XmlEvent> {
        let start = self.scanner.position();
        let len = match self.scanner.find_byte(b'<')? {
            Some(len) => len,
            None => self.scanner.available(),
        };
        let raw = self.scanner.take(len);
        let decoded = match decode_text(raw) {
            Ok(decoded) => decoded.into_owned(),
            Err(e) => {
                let at = locate(start, &raw[..e.offset]);
                return Err(self.error_at(at, e.message));
            }
        };
        String::from_utf8(decoded)
            .map(XmlEvent::Characters)
            .map_err(|_| self.error_at(start, "invalid UTF-8 in character data"))
    }

    /// Parse a CDATA section <![CDATA[...]]>
    fn parse_cdata(&mut self) -> Result<XmlEvent> {
        let start = self.scanner.position();
        self.scanner.advance(9);
        let len = self
            .scanner
            .find_seq(b"]]>")?
            .ok_or_else(|| self.error_at(start, "unterminated CDATA section"))?;
        let content = self.scanner.take(len).to_vec();
        self.scanner.advance(3);
        String::from_utf8(content)
            .map(XmlEvent::Characters)
            .map_err(|_| self.error_at(start, "invalid UTF-8 in CDATA section"))
    }

    /// Skip a comment <!--...-->
    fn skip_comment(&mut self) -> Result<()> {
        let start = self.scanner.position();
        self.scanner.advance(4);
        let len = self
            .scanner
            .find_seq(b"-->")?
            .ok_or_else(|| self.error_at(start, "unterminated comment"))?;
        self.scanner.advance(len + 3);
        Ok(())
    }

    /// Skip a processing instruction <?target ...?>
    fn skip_pi(&mut self) -> Result<()> {
        let start = self.scanner.position();
        self.scanner.advance(2);
        self.scanner.ensure(1)?;
        if read_name(self.scanner.remaining()).is_none() {
            return Err(self.error_at(start, "processing instruction has no target"));
        }
        let len = self
            .scanner
            .find_seq(b"?>")?
            .ok_or_else(|| self.error_at(start, "unterminated processing instruction"))?;
        self.scanner.advance(len + 2);
        Ok(())
    }

    /// Skip a DOCTYPE declaration, including a bracketed internal subset
    fn skip_doctype(&mut self) -> Result<()> {
        let start = self.scanner.position();
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        self.scanner.advance(9);
        loop {
            let b = self
                .scanner
                .peek()?
                .ok_or_else(|| self.error_at(start, "unterminated DOCTYPE"))?;
            self.scanner.advance(1);
            match (quote, b) {
                (Some(q), b) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => depth += 1,
                (None, b']') => depth = depth.saturating_sub(1),
                (None, b'>') if depth == 0 => return Ok(()),
                _ => {}
            }
        }
    }
}

impl<R: Read> Iterator for Tokenizer<R> {
    type Item = Result<XmlEvent>;

    /// Yields events after StartDocument up to, but not including, EndDocument
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if !self.has_next() {
                return None;
            }
            match self.next_event() {
                Ok(XmlEvent::StartDocument) => continue,
                Ok(XmlEvent::EndDocument) => return None,
                Ok(event) => return Some(Ok(event)),
                Err(e) => {
                    self.state = ParseState::Done;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(input: &str) -> Result<Vec<XmlEvent>> {
        Tokenizer::new(input.as_bytes()).collect()
    }

    fn error_of(input: &str) -> CodecError {
        events(input).unwrap_err()
    }

    #[test]
    fn test_simple_element() {
        let events = events("<root>hello</root>").unwrap();
        assert_eq!(
            events,
            vec![XmlEvent::start("root", &[]), XmlEvent::text("hello"), XmlEvent::end("root")]
        );
    }

    #[test]
    fn test_document_boundaries() {
        let mut tok = Tokenizer::new(&b"<a/>"[..]);
        assert!(tok.has_next());
        assert_eq!(tok.next_event().unwrap(), XmlEvent::StartDocument);
        assert_eq!(tok.next_event().unwrap(), XmlEvent::start("a", &[]));
        assert_eq!(tok.next_event().unwrap(), XmlEvent::end("a"));
        assert_eq!(tok.next_event().unwrap(), XmlEvent::EndDocument);
        assert!(!tok.has_next());
    }

    #[test]
    fn test_empty_element_synthesizes_end() {
        let events = events("<a><b x=\"1\"/></a>").unwrap();
        assert_eq!(
            events,
            vec![
                XmlEvent::start("a", &[]),
                XmlEvent::start("b", &[("x", "1")]),
                XmlEvent::end("b"),
                XmlEvent::end("a"),
            ]
        );
    }

    #[test]
    fn test_declaration_comments_and_pis_skipped() {
        let input = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!-- c --><a><!-- x --><?pi data?>t</a>\n<!-- end -->";
        let events = events(input).unwrap();
        assert_eq!(
            events,
            vec![XmlEvent::start("a", &[]), XmlEvent::text("t"), XmlEvent::end("a")]
        );
    }

    #[test]
    fn test_second_prolog_pi_rejected() {
        let err = error_of("<?xml version=\"1.0\"?><?xml version=\"1.0\"?><a/>");
        assert!(matches!(err, CodecError::MalformedDocument { .. }));
    }

    #[test]
    fn test_doctype_skipped() {
        let events = events("<!DOCTYPE CIM SYSTEM \"cim.dtd\" [ <!ELEMENT a ANY> ]><a/>").unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_references_decoded() {
        let events = events("<a v=\"&quot;q&quot;\">&lt;&#65;&#x42;&amp;</a>").unwrap();
        assert_eq!(events[0], XmlEvent::start("a", &[("v", "\"q\"")]));
        assert_eq!(events[1], XmlEvent::text("<AB&"));
    }

    #[test]
    fn test_cdata() {
        let events = events("<a><![CDATA[<x> & ]]></a>").unwrap();
        assert_eq!(events[1], XmlEvent::text("<x> & "));
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = error_of("<a>\n  <b></c></a>");
        match err {
            CodecError::MalformedDocument { message, line, column } => {
                assert!(message.contains("</c>"));
                assert_eq!((line, column), (2, 6));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bad_reference_position() {
        match error_of("<a>\nxy&#xZZ;</a>") {
            CodecError::MalformedDocument { line, column, .. } => assert_eq!((line, column), (2, 3)),
            other => panic!("unexpected {other:?}"),
        }
        match error_of("<a>\n <b v=\"&nope;\"/></a>") {
            CodecError::MalformedDocument { line, column, .. } => assert_eq!((line, column), (2, 8)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_reference() {
        assert!(matches!(error_of("<a>x &amp y</a>"), CodecError::MalformedDocument { .. }));
    }

    #[test]
    fn test_content_outside_root() {
        assert!(error_of("junk<a/>").to_string().contains("outside the root"));
        assert!(error_of("<a/><b/>").to_string().contains("after the root"));
        assert!(error_of("<a/>junk").to_string().contains("outside the root"));
    }

    #[test]
    fn test_truncated_document() {
        assert!(error_of("<a><b>").to_string().contains("inside <b>"));
        assert!(error_of("").to_string().contains("no root"));
        assert!(error_of("<a").to_string().contains("unterminated"));
    }

    #[test]
    fn test_max_depth() {
        let tok = Tokenizer::new(&b"<a><b><c/></b></a>"[..]).with_max_depth(2);
        let result: Result<Vec<_>> = tok.collect();
        assert!(result.unwrap_err().to_string().contains("nesting"));
    }

    #[test]
    fn test_whitespace_text_preserved() {
        let events = events("<a> <b/> </a>").unwrap();
        assert_eq!(events[1], XmlEvent::text(" "));
        assert_eq!(events.len(), 6);
    }
}
