//! XML Attribute Parsing
//!
//! Parses the element name and attributes from the raw bytes of a start tag.

use super::entities::decode_attribute;
use crate::reader::events::Attribute;

/// Failure inside a tag, positioned by byte offset into the tag content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagError {
    pub offset: usize,
    pub message: String,
}

impl TagError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        TagError {
            offset,
            message: message.into(),
        }
    }
}

/// Parsed start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// True for `<name .../>`
    pub is_empty: bool,
}

/// Parse tag content: the bytes between '<' and '>' (exclusive)
pub fn parse_start_tag(input: &[u8]) -> Result<ParsedTag, TagError> {
    let (is_empty, input) = match input.split_last() {
        Some((b'/', rest)) => (true, rest),
        _ => (false, input),
    };

    let name_len = read_name(input).ok_or_else(|| {
        TagError::new(0, "element name must start with letter, underscore, or colon")
    })?;
    let name = utf8(&input[..name_len], 0)?;
    let attributes = parse_attributes(input, name_len)?;

    Ok(ParsedTag {
        name,
        attributes,
        is_empty,
    })
}

/// Parse attributes starting at `pos`
fn parse_attributes(input: &[u8], mut pos: usize) -> Result<Vec<Attribute>, TagError> {
    let mut attrs: Vec<Attribute> = Vec::new();

    loop {
        let ws_start = pos;
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            return Ok(attrs);
        }
        if pos == ws_start {
            return Err(TagError::new(pos, "whitespace required before attribute"));
        }

        let name_start = pos;
        let name_len = read_name(&input[pos..])
            .ok_or_else(|| TagError::new(pos, "attribute name must start with letter, underscore, or colon"))?;
        let name = utf8(&input[name_start..name_start + name_len], name_start)?;
        pos += name_len;

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if input.get(pos) != Some(&b'=') {
            return Err(TagError::new(pos, format!("attribute {} has no value", name)));
        }
        pos += 1;
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        let quote = match input.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err(TagError::new(pos, "attribute value must be quoted")),
        };
        pos += 1;
        let value_start = pos;
        let value_len = memchr::memchr(quote, &input[pos..])
            .ok_or_else(|| TagError::new(value_start, "unterminated attribute value"))?;
        let raw = &input[value_start..value_start + value_len];
        if let Some(lt) = memchr::memchr(b'<', raw) {
            return Err(TagError::new(value_start + lt, "'<' not allowed in attribute value"));
        }
        let decoded = decode_attribute(raw)
            .map_err(|e| TagError::new(value_start + e.offset, e.message))?;
        let value = utf8(&decoded, value_start)?;
        pos = value_start + value_len + 1;

        if attrs.iter().any(|a| a.name == name) {
            return Err(TagError::new(name_start, format!("duplicate attribute {}", name)));
        }
        attrs.push(Attribute { name, value });
    }
}

fn utf8(bytes: &[u8], offset: usize) -> Result<String, TagError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        TagError::new(offset + e.utf8_error().valid_up_to(), "invalid UTF-8")
    })
}

/// Length of the XML name at the start of `input`, if any
pub fn read_name(input: &[u8]) -> Option<usize> {
    match input.first() {
        Some(&b) if is_name_start_char(b) => {}
        _ => return None,
    }
    Some(1 + input[1..].iter().take_while(|&&b| is_name_char(b)).count())
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Check if byte is valid XML name start character
/// Allows ASCII letters, underscore, colon, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Check if byte is valid XML name character
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}
