//! Canonical serializer
//!
//! Domain objects are first mapped to an [`XmlElement`] tree (`cim`), which
//! is then written as escaped UTF-8 text (`tree`). Callers holding a tree of
//! their own can write it directly with [`serialize_element`].

mod cim;
mod tree;

use std::io::Write;

use crate::error::Result;
use crate::model::{CimObject, Envelope};
use crate::trace::{NoTrace, TraceSink};

pub use cim::{class_element, envelope_element, instance_element, object_element, path_element};
pub use tree::{XmlElement, XmlNode};

/// XML declaration written ahead of every message
pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Newline and indent between structural elements
    pub pretty: bool,
    /// Spaces per nesting level when pretty
    pub indent: usize,
    /// Write the XML declaration first
    pub declaration: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            pretty: false,
            indent: 2,
            declaration: true,
        }
    }
}

impl WriterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }
}

/// Write an element tree as text
pub fn serialize_element(element: &XmlElement, options: &WriterOptions, trace: &mut dyn TraceSink) -> String {
    let mut out = String::with_capacity(1024);
    if options.declaration {
        out.push_str(DECLARATION);
        if options.pretty {
            out.push('\n');
        }
    }
    let elements = tree::write_element(&mut out, element, options, 0, options.pretty, trace);
    tracing::debug!(root = %element.name, elements, bytes = out.len(), "serialized");
    out
}

/// Serialize a message to UTF-8 bytes
pub fn serialize(envelope: &Envelope, pretty: bool) -> Result<Vec<u8>> {
    let options = WriterOptions::default().with_pretty(pretty);
    Ok(serialize_with(envelope, &options, &mut NoTrace)?.into_bytes())
}

/// Serialize a message with explicit options and trace sink
pub fn serialize_with(envelope: &Envelope, options: &WriterOptions, trace: &mut dyn TraceSink) -> Result<String> {
    let element = cim::envelope_element(envelope)?;
    Ok(serialize_element(&element, options, trace))
}

/// Serialize a message straight into `out`, such as a chunked body writer
pub fn write_envelope<W: Write>(mut out: W, envelope: &Envelope, options: &WriterOptions) -> Result<()> {
    let text = serialize_with(envelope, options, &mut NoTrace)?;
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Compact form of a class or instance, as carried by embedded-object strings
pub fn serialize_object(object: &CimObject) -> Result<String> {
    let options = WriterOptions::default().with_declaration(false);
    let element = cim::object_element(object)?;
    Ok(serialize_element(&element, &options, &mut NoTrace))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CimStatus, CimError, MethodCall, MethodKind, MethodResponse, ParamValue, CimData, Value};
    use crate::trace::{RecordingSink, TraceStage};

    fn request() -> Envelope {
        let call = MethodCall::intrinsic("GetClass", "root/cimv2")
            .with_param(ParamValue::new("ClassName", CimData::Path(crate::model::ObjectPath::class("CIM_Fan"))))
            .with_param(ParamValue::new("LocalOnly", CimData::Value(Value::boolean(false))));
        Envelope::request("1001", call)
    }

    #[test]
    fn test_compact_request() {
        let text = String::from_utf8(serialize(&request(), false).unwrap()).unwrap();
        assert_eq!(
            text,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="1001" PROTOCOLVERSION="1.0">"#,
                r#"<SIMPLEREQ><IMETHODCALL NAME="GetClass">"#,
                r#"<LOCALNAMESPACEPATH><NAMESPACE NAME="root"/><NAMESPACE NAME="cimv2"/></LOCALNAMESPACEPATH>"#,
                r#"<IPARAMVALUE NAME="ClassName"><CLASSNAME NAME="CIM_Fan"/></IPARAMVALUE>"#,
                r#"<IPARAMVALUE NAME="LocalOnly" PARAMTYPE="boolean"><VALUE>FALSE</VALUE></IPARAMVALUE>"#,
                r#"</IMETHODCALL></SIMPLEREQ></MESSAGE></CIM>"#
            )
        );
    }

    #[test]
    fn test_pretty_response() {
        let response = MethodResponse::error(
            "GetClass",
            MethodKind::Intrinsic,
            CimError::new(CimStatus::NotFound),
        );
        let options = WriterOptions::default().with_pretty(true).with_declaration(false);
        let text = serialize_with(&Envelope::response("7", response), &options, &mut NoTrace).unwrap();
        let expected = "<CIM CIMVERSION=\"2.0\" DTDVERSION=\"2.0\">\n  <MESSAGE ID=\"7\" PROTOCOLVERSION=\"1.0\">\n    <SIMPLERSP>\n      <IMETHODRESPONSE NAME=\"GetClass\">\n        <ERROR CODE=\"6\"/>\n      </IMETHODRESPONSE>\n    </SIMPLERSP>\n  </MESSAGE>\n</CIM>";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_trace_records_each_element() {
        let mut sink = RecordingSink::new();
        serialize_with(&request(), &WriterOptions::default(), &mut sink).unwrap();
        let writes = sink.stage(TraceStage::Write);
        assert_eq!(writes.first().copied(), Some("<CIM> depth 0"));
        assert_eq!(writes.len(), 11);
    }

    #[test]
    fn test_write_envelope_to_sink() {
        let mut out = Vec::new();
        write_envelope(&mut out, &request(), &WriterOptions::default()).unwrap();
        assert_eq!(out, serialize(&request(), false).unwrap());
    }
}
