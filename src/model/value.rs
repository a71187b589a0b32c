//! Typed CIM values

use super::datetime::CimDateTime;
use super::object::CimObject;
use super::path::ObjectPath;
use super::types::{DataType, TypeTag};

/// A single value of some CIM type.
///
/// Integers are stored at 64-bit width; the declared width lives in the
/// enclosing [`DataType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Uint(u64),
    Sint(i64),
    Real32(f32),
    Real64(f64),
    Boolean(bool),
    String(String),
    Char16(char),
    DateTime(CimDateTime),
    Reference(ObjectPath),
    Object(Box<CimObject>),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Scalar::Uint(v) => Some(*v),
            Scalar::Sint(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Sint(v) => Some(*v),
            Scalar::Uint(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ObjectPath> {
        match self {
            Scalar::Reference(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&CimObject> {
        match self {
            Scalar::Object(o) => Some(o),
            _ => None,
        }
    }
}

/// Payload of a value
#[derive(Debug, Clone, PartialEq)]
pub enum ValueData {
    Null,
    Scalar(Scalar),
    /// Array elements; `None` is a null element
    Array(Vec<Option<Scalar>>),
}

/// A data type plus its payload
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data_type: DataType,
    pub data: ValueData,
}

impl Value {
    /// Untyped `numeric` payloads are stored in the form their text reads back as
    pub fn new(data_type: DataType, data: ValueData) -> Self {
        let data = if data_type.tag == TypeTag::Numeric {
            match data {
                ValueData::Scalar(scalar) => ValueData::Scalar(numeric_form(scalar)),
                ValueData::Array(items) => {
                    ValueData::Array(items.into_iter().map(|item| item.map(numeric_form)).collect())
                }
                ValueData::Null => ValueData::Null,
            }
        } else {
            data
        };
        Value { data_type, data }
    }

    pub fn null(data_type: DataType) -> Self {
        Value::new(data_type, ValueData::Null)
    }

    pub fn scalar(data_type: DataType, scalar: Scalar) -> Self {
        Value::new(data_type, ValueData::Scalar(scalar))
    }

    pub fn array(data_type: DataType, items: Vec<Option<Scalar>>) -> Self {
        Value::new(data_type, ValueData::Array(items))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::scalar(DataType::scalar(TypeTag::String), Scalar::String(s.into()))
    }

    pub fn boolean(b: bool) -> Self {
        Value::scalar(DataType::scalar(TypeTag::Boolean), Scalar::Boolean(b))
    }

    /// Unsigned integer of the given width tag
    pub fn uint(tag: TypeTag, v: u64) -> Self {
        Value::scalar(DataType::scalar(tag), Scalar::Uint(v))
    }

    /// Signed integer of the given width tag
    pub fn sint(tag: TypeTag, v: i64) -> Self {
        Value::scalar(DataType::scalar(tag), Scalar::Sint(v))
    }

    pub fn reference(path: ObjectPath) -> Self {
        Value::scalar(DataType::reference(""), Scalar::Reference(path))
    }

    pub fn object(object: CimObject) -> Self {
        Value::scalar(DataType::scalar(TypeTag::Object), Scalar::Object(Box::new(object)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.data, ValueData::Null)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.data {
            ValueData::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Option<Scalar>]> {
        match &self.data {
            ValueData::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Signed before unsigned before real, as a `numeric` literal is parsed
fn numeric_form(scalar: Scalar) -> Scalar {
    match scalar {
        Scalar::Uint(n) => i64::try_from(n).map_or(Scalar::Uint(n), Scalar::Sint),
        Scalar::Real32(f) => Scalar::Real64(f64::from(f)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_distinct_from_empty_array() {
        let null = Value::null(DataType::array(TypeTag::Uint8));
        let empty = Value::array(DataType::array(TypeTag::Uint8), vec![]);
        assert!(null.is_null());
        assert!(!empty.is_null());
        assert_ne!(null, empty);
    }

    #[test]
    fn test_numeric_payload_normalized() {
        let numeric = DataType::scalar(TypeTag::Numeric);
        assert_eq!(Value::scalar(numeric.clone(), Scalar::Uint(5)).data, ValueData::Scalar(Scalar::Sint(5)));
        assert_eq!(
            Value::scalar(numeric.clone(), Scalar::Uint(u64::MAX)).data,
            ValueData::Scalar(Scalar::Uint(u64::MAX))
        );
        assert_eq!(
            Value::scalar(numeric, Scalar::Real32(0.5)).data,
            ValueData::Scalar(Scalar::Real64(0.5))
        );
        assert_eq!(Value::uint(TypeTag::Uint64, 5).data, ValueData::Scalar(Scalar::Uint(5)));
    }

    #[test]
    fn test_scalar_accessors() {
        assert_eq!(Value::uint(TypeTag::Uint16, 7).as_scalar().and_then(Scalar::as_u64), Some(7));
        assert_eq!(Scalar::Sint(-1).as_u64(), None);
        assert_eq!(Value::string("x").as_scalar().and_then(Scalar::as_str), Some("x"));
        assert_eq!(Value::boolean(true).as_scalar().and_then(Scalar::as_bool), Some(true));
    }
}
