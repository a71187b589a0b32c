//! CIM data types

use std::fmt;

use crate::codec::types::{type_tag_to_wire_name, wire_name_to_type_tag};

/// Primitive and structural type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Sint8,
    Sint16,
    Sint32,
    Sint64,
    String,
    Boolean,
    Real32,
    Real64,
    DateTime,
    Char16,
    Reference,
    /// Embedded class or instance
    Object,
    Class,
    /// Key value of unknown numeric type
    Numeric,
}

impl TypeTag {
    /// The 15 tags with a wire name of their own
    pub const PRIMITIVES: [TypeTag; 15] = [
        TypeTag::Uint8,
        TypeTag::Uint16,
        TypeTag::Uint32,
        TypeTag::Uint64,
        TypeTag::Sint8,
        TypeTag::Sint16,
        TypeTag::Sint32,
        TypeTag::Sint64,
        TypeTag::String,
        TypeTag::Boolean,
        TypeTag::Real32,
        TypeTag::Real64,
        TypeTag::DateTime,
        TypeTag::Char16,
        TypeTag::Reference,
    ];

    pub fn wire_name(self) -> &'static str {
        type_tag_to_wire_name(self)
    }

    pub fn from_wire_name(name: &str) -> Self {
        wire_name_to_type_tag(name)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(self, TypeTag::Uint8 | TypeTag::Uint16 | TypeTag::Uint32 | TypeTag::Uint64)
    }

    pub fn is_signed(self) -> bool {
        matches!(self, TypeTag::Sint8 | TypeTag::Sint16 | TypeTag::Sint32 | TypeTag::Sint64)
    }

    pub fn is_integer(self) -> bool {
        self.is_unsigned() || self.is_signed()
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, TypeTag::Real32 | TypeTag::Real64 | TypeTag::Numeric)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A type tag plus array and reference metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataType {
    pub tag: TypeTag,
    /// Referenced class for `Reference` (possibly empty)
    pub reference_class: String,
    pub is_array: bool,
    /// Fixed array size; `None` is unbounded
    pub array_size: Option<u32>,
}

impl DataType {
    /// Scalar of the given tag
    pub fn scalar(tag: TypeTag) -> Self {
        DataType {
            tag,
            reference_class: String::new(),
            is_array: false,
            array_size: None,
        }
    }

    /// Unbounded array of the given tag
    pub fn array(tag: TypeTag) -> Self {
        DataType {
            is_array: true,
            ..Self::scalar(tag)
        }
    }

    /// Reference to instances of `class` ("" for any class)
    pub fn reference(class: impl Into<String>) -> Self {
        DataType {
            reference_class: class.into(),
            ..Self::scalar(TypeTag::Reference)
        }
    }

    /// Same type as an array with the given size
    pub fn with_array(mut self, size: Option<u32>) -> Self {
        self.is_array = true;
        self.array_size = size;
        self
    }

    /// Element type of an array type
    pub fn element(&self) -> DataType {
        DataType {
            is_array: false,
            array_size: None,
            ..self.clone()
        }
    }

    pub fn is_reference(&self) -> bool {
        self.tag == TypeTag::Reference
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag.wire_name())?;
        if self.is_reference() && !self.reference_class.is_empty() {
            write!(f, "({})", self.reference_class)?;
        }
        if self.is_array {
            match self.array_size {
                Some(n) => write!(f, "[{}]", n)?,
                None => f.write_str("[]")?,
            }
        }
        Ok(())
    }
}
