//! Type tag <-> wire name mapping

use crate::model::TypeTag;

/// Wire name of a type tag, as used in `TYPE`/`PARAMTYPE` attributes
pub fn type_tag_to_wire_name(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::Uint8 => "uint8",
        TypeTag::Uint16 => "uint16",
        TypeTag::Uint32 => "uint32",
        TypeTag::Uint64 => "uint64",
        TypeTag::Sint8 => "sint8",
        TypeTag::Sint16 => "sint16",
        TypeTag::Sint32 => "sint32",
        TypeTag::Sint64 => "sint64",
        TypeTag::String => "string",
        TypeTag::Boolean => "boolean",
        TypeTag::Real32 => "real32",
        TypeTag::Real64 => "real64",
        TypeTag::DateTime => "datetime",
        TypeTag::Char16 => "char16",
        TypeTag::Reference => "reference",
        TypeTag::Object => "object",
        TypeTag::Class => "class",
        TypeTag::Numeric => "numeric",
    }
}

/// Type tag for a wire name (case-insensitive); unknown names are `String`
pub fn wire_name_to_type_tag(name: &str) -> TypeTag {
    lookup_wire_name(name).unwrap_or_else(|| {
        tracing::warn!("Unknown CIM type {:?}, treating as string", name);
        TypeTag::String
    })
}

/// Type tag for a wire name without the string fallback
pub fn lookup_wire_name(name: &str) -> Option<TypeTag> {
    let tag = match name.trim().to_ascii_lowercase().as_str() {
        "uint8" => TypeTag::Uint8,
        "uint16" => TypeTag::Uint16,
        "uint32" => TypeTag::Uint32,
        "uint64" => TypeTag::Uint64,
        "sint8" => TypeTag::Sint8,
        "sint16" => TypeTag::Sint16,
        "sint32" => TypeTag::Sint32,
        "sint64" => TypeTag::Sint64,
        "string" => TypeTag::String,
        "boolean" => TypeTag::Boolean,
        "real32" => TypeTag::Real32,
        "real64" => TypeTag::Real64,
        "datetime" => TypeTag::DateTime,
        "char16" => TypeTag::Char16,
        "reference" => TypeTag::Reference,
        "object" => TypeTag::Object,
        "class" => TypeTag::Class,
        "numeric" => TypeTag::Numeric,
        _ => return None,
    };
    Some(tag)
}
