//! Literal text <-> typed scalar conversion

use std::fmt;
use std::str::FromStr;

use crate::error::{CodecError, Result};
use crate::model::{CimDateTime, ObjectPath, Scalar, TypeTag};

use super::types::wire_name_to_type_tag;

/// Parse `text` as a scalar of the type named by `wire_name`.
///
/// Unrecognized type names pass the text through as a string.
pub fn parse_literal(wire_name: &str, text: &str) -> Result<Scalar> {
    parse_typed(wire_name_to_type_tag(wire_name), text)
}

/// Parse `text` as a scalar of type `tag`
pub fn parse_typed(tag: TypeTag, text: &str) -> Result<Scalar> {
    match tag {
        t if t.is_integer() => parse_integer(t, text),
        TypeTag::Real32 => parse_real(tag, text).map(Scalar::Real32),
        TypeTag::Real64 => parse_real(tag, text).map(Scalar::Real64),
        TypeTag::Boolean => parse_boolean(text),
        TypeTag::DateTime => CimDateTime::parse(text.trim())
            .map(Scalar::DateTime)
            .map_err(|reason| CodecError::malformed_value(tag.wire_name(), text, reason)),
        TypeTag::Char16 => parse_char16(text),
        TypeTag::Reference => text.parse::<ObjectPath>().map(Scalar::Reference),
        TypeTag::Numeric => parse_numeric(text),
        _ => Ok(Scalar::String(text.to_string())),
    }
}

fn parse_integer(tag: TypeTag, text: &str) -> Result<Scalar> {
    let fail = |reason: &str| CodecError::malformed_value(tag.wire_name(), text, reason);

    let trimmed = text.trim();
    let (negative, body) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if body.is_empty() {
        return Err(fail("no digits"));
    }

    // Hex prefix first so `0x1B` is not taken for a binary suffix
    let (digits, radix) = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(bin) = body.strip_suffix('b').or_else(|| body.strip_suffix('B')) {
        (bin, 2)
    } else if body.len() > 1 && body.starts_with('0') {
        (&body[1..], 8)
    } else {
        (body, 10)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(fail(&format!("invalid base-{} digits", radix)));
    }
    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| fail("does not fit in 64 bits"))?;

    if tag.is_unsigned() {
        if negative && magnitude != 0 {
            return Err(fail("negative value for unsigned type"));
        }
        return Ok(Scalar::Uint(magnitude));
    }
    let value = if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    };
    value.map(Scalar::Sint).ok_or_else(|| fail("does not fit in 64 bits"))
}

fn parse_real<T>(tag: TypeTag, text: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CodecError::malformed_value(tag.wire_name(), text, "empty"));
    }
    trimmed
        .parse::<T>()
        .map_err(|e| CodecError::malformed_value(tag.wire_name(), text, e.to_string()))
}

fn parse_boolean(text: &str) -> Result<Scalar> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(Scalar::Boolean(true))
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(Scalar::Boolean(false))
    } else {
        Err(CodecError::malformed_value("boolean", text, "expected TRUE or FALSE"))
    }
}

fn parse_char16(text: &str) -> Result<Scalar> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Scalar::Char16(c)),
        (None, _) => Err(CodecError::malformed_value("char16", text, "empty")),
        _ => Err(CodecError::malformed_value("char16", text, "more than one character")),
    }
}

/// Key value of unknown numeric type: sint64, else uint64, else real64
fn parse_numeric(text: &str) -> Result<Scalar> {
    parse_integer(TypeTag::Sint64, text)
        .or_else(|_| parse_integer(TypeTag::Uint64, text))
        .or_else(|_| parse_real(TypeTag::Real64, text).map(Scalar::Real64))
        .map_err(|_| CodecError::malformed_value("numeric", text, "not a number"))
}

/// Canonical text of a scalar.
///
/// Embedded objects have no literal form of their own; they render as their
/// path and are written as nested XML by the serializer instead.
pub fn format_literal(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Uint(v) => v.to_string(),
        Scalar::Sint(v) => v.to_string(),
        Scalar::Real32(v) => format_real(*v as f64, format!("{:?}", v)),
        Scalar::Real64(v) => format_real(*v, format!("{:?}", v)),
        Scalar::Boolean(true) => "TRUE".to_string(),
        Scalar::Boolean(false) => "FALSE".to_string(),
        Scalar::String(s) => s.clone(),
        Scalar::Char16(c) => c.to_string(),
        Scalar::DateTime(dt) => dt.to_string(),
        Scalar::Reference(path) => path.to_string(),
        Scalar::Object(object) => object.path().to_string(),
    }
}

fn format_real(value: f64, shortest: String) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        shortest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sint(text: &str) -> Option<i64> {
        parse_literal("sint32", text).ok().and_then(|s| s.as_i64())
    }

    #[test]
    fn test_integer_bases() {
        assert_eq!(sint("0x1A"), Some(26));
        assert_eq!(sint("0X1a"), Some(26));
        assert_eq!(sint("032"), Some(26));
        assert_eq!(sint("11010b"), Some(26));
        assert_eq!(sint("-11010B"), Some(-26));
        assert_eq!(sint("+26"), Some(26));
        assert_eq!(sint("-0x1A"), Some(-26));
        assert_eq!(sint(" 26 "), Some(26));
    }

    #[test]
    fn test_octal_zero() {
        assert_eq!(sint("0"), Some(0));
        assert_eq!(sint("00"), Some(0));
        assert_eq!(sint("-0"), Some(0));
    }

    #[test]
    fn test_unsigned_rejects_negative() {
        assert!(parse_literal("uint8", "-1").is_err());
        assert_eq!(parse_literal("uint8", "-0").unwrap(), Scalar::Uint(0));
        let err = parse_literal("uint8", "-1").unwrap_err();
        assert!(matches!(err, CodecError::MalformedValue { ref type_name, ref literal, .. }
            if type_name == "uint8" && literal == "-1"));
    }

    #[test]
    fn test_integer_errors() {
        assert!(parse_literal("sint32", "").is_err());
        assert!(parse_literal("sint32", "-").is_err());
        assert!(parse_literal("sint32", "0x").is_err());
        assert!(parse_literal("sint32", "09").is_err());
        assert!(parse_literal("sint32", "12b").is_err());
        assert!(parse_literal("sint32", "1.5").is_err());
        assert!(parse_literal("sint32", "0x+1").is_err());
        assert!(parse_literal("uint64", "18446744073709551616").is_err());
        assert!(parse_literal("sint64", "9223372036854775808").is_err());
    }

    #[test]
    fn test_integer_extremes() {
        assert_eq!(parse_literal("sint64", "-9223372036854775808").unwrap(), Scalar::Sint(i64::MIN));
        assert_eq!(parse_literal("uint64", "18446744073709551615").unwrap(), Scalar::Uint(u64::MAX));
        // Width overflow is left to the caller
        assert_eq!(parse_literal("uint8", "300").unwrap(), Scalar::Uint(300));
    }

    #[test]
    fn test_reals() {
        assert_eq!(parse_literal("real64", "1.5e3").unwrap(), Scalar::Real64(1500.0));
        assert_eq!(parse_literal("real32", "-0.25").unwrap(), Scalar::Real32(-0.25));
        assert!(parse_literal("real64", "1,5").is_err());
        assert!(parse_literal("real64", "").is_err());
        assert_eq!(
            parse_literal("real64", "INF").unwrap(),
            Scalar::Real64(f64::INFINITY)
        );
    }

    #[test]
    fn test_boolean_char16_string() {
        assert_eq!(parse_literal("boolean", "True").unwrap(), Scalar::Boolean(true));
        assert_eq!(parse_literal("BOOLEAN", "FALSE").unwrap(), Scalar::Boolean(false));
        assert!(parse_literal("boolean", "yes").is_err());
        assert_eq!(parse_literal("char16", "x").unwrap(), Scalar::Char16('x'));
        assert_eq!(parse_literal("char16", " ").unwrap(), Scalar::Char16(' '));
        assert!(parse_literal("char16", "").is_err());
        assert!(parse_literal("char16", "xy").is_err());
        assert_eq!(parse_literal("string", " keep ").unwrap(), Scalar::String(" keep ".into()));
        assert_eq!(parse_literal("nosuchtype", "raw").unwrap(), Scalar::String("raw".into()));
    }

    #[test]
    fn test_datetime_and_reference() {
        let dt = parse_literal("datetime", "20240315123045.123456+060").unwrap();
        assert!(matches!(dt, Scalar::DateTime(ref d) if d.year() == Some(2024)));
        assert!(parse_literal("datetime", "2024").is_err());

        let r = parse_literal("reference", "root/cimv2:CIM_Foo.Id=1").unwrap();
        let path = r.as_reference().unwrap();
        assert_eq!(path.class_name, "CIM_Foo");
        assert_eq!(path.keys.len(), 1);
    }

    #[test]
    fn test_numeric_order() {
        assert_eq!(parse_literal("numeric", "-5").unwrap(), Scalar::Sint(-5));
        assert_eq!(parse_literal("numeric", "18446744073709551615").unwrap(), Scalar::Uint(u64::MAX));
        assert_eq!(parse_literal("numeric", "2.5").unwrap(), Scalar::Real64(2.5));
        assert!(parse_literal("numeric", "abc").is_err());
    }

    #[test]
    fn test_format_literal() {
        assert_eq!(format_literal(&Scalar::Sint(-26)), "-26");
        assert_eq!(format_literal(&Scalar::Real64(1.0)), "1.0");
        assert_eq!(format_literal(&Scalar::Real32(0.1)), "0.1");
        assert_eq!(format_literal(&Scalar::Real64(f64::NEG_INFINITY)), "-INF");
        assert_eq!(format_literal(&Scalar::Real64(f64::NAN)), "NaN");
        assert_eq!(format_literal(&Scalar::Boolean(true)), "TRUE");
        assert_eq!(format_literal(&Scalar::Char16('z')), "z");
    }

    #[test]
    fn test_formatted_reals_parse_back() {
        for v in [0.1f64, -3.25, 1e300, 5e-324, 123456789.0] {
            let text = format_literal(&Scalar::Real64(v));
            assert_eq!(parse_literal("real64", &text).unwrap(), Scalar::Real64(v));
        }
    }
}
