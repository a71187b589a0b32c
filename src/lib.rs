//! cimxml - CIM-XML over HTTP client codec
//!
//! Pipeline:
//! A: Transfer-coding streams (http): chunked / Content-Length bodies
//! B: Tokenizer (core): streaming XML events with line/column positions
//! C: Object builder (builder): events folded into the CIM model
//! D: Canonical serializer (writer): CIM model to escaped CIM-XML text
//! E: Type codec (codec): type tags and literal text
//!
//! ```
//! use cimxml::{parse, serialize, Charset, Envelope, MethodCall};
//!
//! let request = Envelope::request("1", MethodCall::intrinsic("EnumerateClasses", "root/cimv2"));
//! let bytes = serialize(&request, false).unwrap();
//! assert_eq!(parse(bytes.as_slice(), Charset::Utf8).unwrap(), request);
//! ```

pub mod builder;
pub mod codec;
pub mod core;
pub mod error;
pub mod http;
pub mod model;
pub mod reader;
pub mod trace;
pub mod writer;

// ============================================================================
// Public surface
// ============================================================================

pub use builder::{parse, parse_document, parse_object, parse_str, parse_with, Builder, Document, ParseOptions};
pub use codec::{format_literal, parse_literal, type_tag_to_wire_name, wire_name_to_type_tag};
pub use crate::core::encoding::Charset;
pub use crate::core::entities::{escape, escape_utf16};
pub use error::{CodecError, Result};
pub use model::{
    CallTarget, CimClass, CimData, CimDateTime, CimError, CimInstance, CimObject, CimStatus, DataType,
    Envelope, Flavor, KeyBinding, MessageBody, Method, MethodCall, MethodKind, MethodResponse,
    ObjectPath, ParamValue, Parameter, Property, Qualifier, QualifierType, Reply, Scalar, Scope,
    TypeTag, Value, ValueData,
};
pub use trace::{NoTrace, RecordingSink, TraceSink, TraceStage, TracingSink};
pub use writer::{serialize, serialize_object, serialize_with, WriterOptions, XmlElement, XmlNode};
