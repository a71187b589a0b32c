//! XML Reader Module
//!
//! Owned event types produced by the tokenizer and consumed by the object
//! builder.

pub mod events;

pub use events::{Attribute, EndElement, StartElement, XmlEvent};
