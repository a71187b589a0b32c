//! Type codec: type tags, wire names and literal text

pub mod literal;
pub mod types;

pub use literal::{format_literal, parse_literal, parse_typed};
pub use types::{lookup_wire_name, type_tag_to_wire_name, wire_name_to_type_tag};
