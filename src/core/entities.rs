//! XML Entity Decoding and Output Escaping
//!
//! Decoding handles:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//!
//! There is no DTD processing, so any other reference is an error.
//! Uses Cow for zero-copy when no entities are present.
//!
//! Escaping implements the CIM-XML canonical rules used by the writer.

use memchr::memchr;
use std::borrow::Cow;
use std::fmt::Write;

use crate::error::{CodecError, Result};

/// A reference that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityError {
    /// Byte offset of the '&' in the decoded input
    pub offset: usize,
    pub message: String,
}

/// Decode text content, handling entity references
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded.
#[inline]
pub fn decode_text(input: &[u8]) -> std::result::Result<Cow<'_, [u8]>, EntityError> {
    if memchr(b'&', input).is_none() {
        return Ok(Cow::Borrowed(input));
    }
    decode_entities(input).map(Cow::Owned)
}

/// Decode an attribute value: literal tab/CR/LF become spaces before references are expanded
pub fn decode_attribute(input: &[u8]) -> std::result::Result<Cow<'_, [u8]>, EntityError> {
    if !input.iter().any(|b| matches!(b, b'\t' | b'\n' | b'\r')) {
        return decode_text(input);
    }
    let normalized: Vec<u8> = input
        .iter()
        .map(|&b| if matches!(b, b'\t' | b'\n' | b'\r') { b' ' } else { b })
        .collect();
    match decode_text(&normalized)? {
        Cow::Borrowed(_) => Ok(Cow::Owned(normalized)),
        Cow::Owned(decoded) => Ok(Cow::Owned(decoded)),
    }
}

/// Decode all entity references in the input
fn decode_entities(input: &[u8]) -> std::result::Result<Vec<u8>, EntityError> {
    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;

    while pos < input.len() {
        let Some(amp_pos) = memchr(b'&', &input[pos..]) else {
            result.extend_from_slice(&input[pos..]);
            break;
        };
        result.extend_from_slice(&input[pos..pos + amp_pos]);
        pos += amp_pos;

        let Some(semi_offset) = memchr(b';', &input[pos..]) else {
            return Err(EntityError {
                offset: pos,
                message: "unterminated entity reference".to_string(),
            });
        };
        let entity = &input[pos + 1..pos + semi_offset];
        match decode_entity(entity) {
            Some(c) => {
                let mut utf8 = [0u8; 4];
                result.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
            None => {
                return Err(EntityError {
                    offset: pos,
                    message: format!(
                        "unresolvable reference &{};",
                        String::from_utf8_lossy(entity)
                    ),
                });
            }
        }
        pos += semi_offset + 1;
    }

    Ok(result)
}

/// Decode a single entity (without & and ;)
fn decode_entity(entity: &[u8]) -> Option<char> {
    match entity {
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"amp" => Some('&'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        [b'#', digits @ ..] => decode_numeric_entity(digits),
        _ => None,
    }
}

/// Decode a numeric character reference
fn decode_numeric_entity(entity: &[u8]) -> Option<char> {
    let codepoint = match entity {
        [b'x' | b'X', hex @ ..] if !hex.is_empty() && hex.iter().all(u8::is_ascii_hexdigit) => {
            u32::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()?
        }
        [] => return None,
        dec => {
            if !dec.iter().all(u8::is_ascii_digit) {
                return None;
            }
            std::str::from_utf8(dec).ok()?.parse::<u32>().ok()?
        }
    };
    // Surrogates and out-of-range code points have no char
    char::from_u32(codepoint)
}

/// True when `c` must be written as a reference regardless of position
#[inline]
fn needs_escape(c: char) -> bool {
    c < ' ' || matches!(c, '<' | '>' | '&' | '"' | '\'')
}

/// Escape text or an attribute value for CIM-XML output.
///
/// - below 0x20: `&#xHH;` (lowercase hex, no padding)
/// - `< > & " '`: named entities
/// - space: `&#x20;` when first, last, or followed by another space
/// - everything else, including non-ASCII: unchanged
pub fn escape(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    let plain = !input.chars().any(needs_escape)
        && bytes.first() != Some(&b' ')
        && bytes.last() != Some(&b' ')
        && memchr::memmem::find(bytes, b"  ").is_none();
    if plain {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 16);
    escape_into(&mut out, input);
    Cow::Owned(out)
}

/// Escape `input` onto the end of `out`
pub fn escape_into(out: &mut String, input: &str) {
    let mut chars = input.chars().peekable();
    let mut first = true;
    while let Some(c) = chars.next() {
        match c {
            ' ' => {
                if first || matches!(chars.peek(), None | Some(' ')) {
                    out.push_str("&#x20;");
                } else {
                    out.push(' ');
                }
            }
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c < ' ' => {
                let _ = write!(out, "&#x{:x};", c as u32);
            }
            c => out.push(c),
        }
        first = false;
    }
}

/// Escape UTF-16 text, rejecting unpaired surrogates
pub fn escape_utf16(units: &[u16]) -> Result<String> {
    let mut text = String::with_capacity(units.len());
    for decoded in char::decode_utf16(units.iter().copied()) {
        match decoded {
            Ok(c) => text.push(c),
            Err(e) => {
                return Err(CodecError::serialize(format!(
                    "unpaired surrogate 0x{:04x}",
                    e.unpaired_surrogate()
                )));
            }
        }
    }
    let mut out = String::with_capacity(text.len() + 16);
    escape_into(&mut out, &text);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unescape(s: &str) -> String {
        String::from_utf8(decode_text(s.as_bytes()).unwrap().into_owned()).unwrap()
    }

    #[test]
    fn test_no_entities() {
        let result = decode_text(b"Hello, World!").unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), b"Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        let result = decode_text(b"&lt;hello&gt; &amp; &quot;world&quot;&apos;").unwrap();
        assert_eq!(result.as_ref(), b"<hello> & \"world\"'");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode_text(b"&#65;&#66;&#67;").unwrap().as_ref(), b"ABC");
        assert_eq!(decode_text(b"&#x41;&#X42;&#x43;").unwrap().as_ref(), b"ABC");
        assert_eq!(
            std::str::from_utf8(decode_text(b"&#x1F600;").unwrap().as_ref()).unwrap(),
            "😀"
        );
    }

    #[test]
    fn test_unknown_entity_is_error() {
        let err = decode_text(b"ab&nbsp;").unwrap_err();
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_unterminated_reference_is_error() {
        let err = decode_text(b"x &amp y").unwrap_err();
        assert_eq!(err.offset, 2);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_surrogate_reference_is_error() {
        assert!(decode_text(b"&#xD800;").is_err());
        assert!(decode_text(b"&#x110000;").is_err());
        assert!(decode_text(b"&#;").is_err());
        assert!(decode_text(b"&#x;").is_err());
    }

    #[test]
    fn test_attribute_normalization() {
        let result = decode_attribute(b"a\tb\nc&#xa;").unwrap();
        assert_eq!(result.as_ref(), b"a b c\n");
    }

    #[test]
    fn test_space_run_rule() {
        assert_eq!(escape(" a  b "), "&#x20;a&#x20; b&#x20;");
    }

    #[test]
    fn test_escape_specials_and_controls() {
        assert_eq!(escape("<a & 'b'>\"c\""), "&lt;a &amp; &apos;b&apos;&gt;&quot;c&quot;");
        assert_eq!(escape("a\tb\nc\u{1}"), "a&#x9;b&#xa;c&#x1;");
        assert_eq!(escape("ü~\u{7f}"), "ü~\u{7f}");
    }

    #[test]
    fn test_escape_plain_is_borrowed() {
        assert!(matches!(escape("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_utf16() {
        let units: Vec<u16> = "a😀".encode_utf16().collect();
        assert_eq!(escape_utf16(&units).unwrap(), "a😀");
        let err = escape_utf16(&[0x61, 0xD800, 0x62]).unwrap_err();
        assert!(err.to_string().contains("0xd800"));
        assert!(escape_utf16(&[0xDC00]).is_err());
    }

    proptest! {
        #[test]
        fn prop_unescape_inverts_escape(s in "\\PC*|[ <>&'\"\t\n\r\u{1}a-z]{0,24}") {
            prop_assert_eq!(unescape(&escape(&s)), s);
        }
    }
}
