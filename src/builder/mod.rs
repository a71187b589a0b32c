//! Object builder
//!
//! Consumes tokenizer events and folds them into the CIM domain model. Each
//! start tag pushes one frame; each end tag pops it, completes it and
//! attaches it to the frame beneath (see `rules`). A successful parse leaves
//! exactly one frame: the finished document.

mod rules;
mod stack;

use std::fmt;
use std::io::Read;

use crate::core::encoding::{Charset, Transcoder};
use crate::core::tokenizer::{Tokenizer, DEFAULT_MAX_DEPTH};
use crate::error::{CodecError, Result};
use crate::model::{CimObject, Envelope};
use crate::reader::events::{StartElement, XmlEvent};
use crate::trace::{NoTrace, TraceSink, TraceStage};

use stack::BuildStack;
pub use stack::Document;

/// Parse configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Charset of the input bytes (a BOM overrides it)
    pub charset: Charset,
    /// Maximum element nesting
    pub max_depth: usize,
    /// Decode embedded object strings into classes and instances
    pub embedded_objects: bool,
    /// How many embedded objects may nest inside one another; deeper ones stay strings
    pub max_embedding: usize,
}

/// Default limit on embedded objects nested inside embedded objects
pub const DEFAULT_MAX_EMBEDDING: usize = 16;

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            charset: Charset::Utf8,
            max_depth: DEFAULT_MAX_DEPTH,
            embedded_objects: true,
            max_embedding: DEFAULT_MAX_EMBEDDING,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_embedded_objects(mut self, enabled: bool) -> Self {
        self.embedded_objects = enabled;
        self
    }

    pub fn with_max_embedding(mut self, max_embedding: usize) -> Self {
        self.max_embedding = max_embedding;
        self
    }
}

/// Stack-based folding state machine over XML events.
///
/// One builder serves one document.
pub struct Builder<'t> {
    stack: BuildStack,
    options: ParseOptions,
    trace: Option<&'t mut dyn TraceSink>,
    folded: usize,
}

impl<'t> Builder<'t> {
    pub fn new(options: ParseOptions) -> Self {
        Builder {
            stack: BuildStack::new(),
            options,
            trace: None,
            folded: 0,
        }
    }

    /// Report events and folds to `trace`
    pub fn with_trace(mut self, trace: &'t mut dyn TraceSink) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Number of frames on the object stack
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    fn trace(&mut self, stage: TraceStage, message: fmt::Arguments<'_>) {
        if let Some(sink) = self.trace.as_deref_mut() {
            if sink.enabled() {
                sink.record(stage, message);
            }
        }
    }

    /// Consume one event
    pub fn feed(&mut self, event: XmlEvent) -> Result<()> {
        match event {
            XmlEvent::StartDocument => Ok(()),
            XmlEvent::StartElement(start) => self.start(start),
            XmlEvent::Characters(text) => {
                self.characters(text);
                Ok(())
            }
            XmlEvent::EndElement(end) => self.end(&end.name),
            XmlEvent::EndDocument => {
                if self.stack.depth() != 1 || self.stack.open_elements() != 0 {
                    return Err(CodecError::IncompleteDocument {
                        depth: self.stack.depth(),
                    });
                }
                Ok(())
            }
        }
    }

    fn start(&mut self, start: StartElement) -> Result<()> {
        if self.stack.has_root() {
            return Err(CodecError::inconsistent(&start.name, "element after the document root"));
        }
        self.trace(TraceStage::Event, format_args!("<{}>", start.name));
        let frame = rules::open(&start)?;
        self.stack.push(&start.name, frame);
        Ok(())
    }

    fn characters(&mut self, text: String) {
        match self.stack.top_mut().and_then(|frame| frame.text_slot()) {
            Some(slot) => slot.push_str(&text),
            None if text.trim().is_empty() => {}
            None => tracing::trace!(len = text.len(), "text outside a value dropped"),
        }
    }

    fn end(&mut self, name: &str) -> Result<()> {
        let frame = self.stack.pop(name)?;
        let item = rules::finish(name, frame, &self.options)?;
        let kind = item.kind();
        match self.stack.top_mut() {
            Some(parent) => {
                let parent_kind = parent.kind();
                rules::attach(parent, item, name)?;
                self.trace(TraceStage::Fold, format_args!("</{}> {} -> {}", name, kind, parent_kind));
            }
            None => {
                let document = rules::root(item, name)?;
                self.stack.set_root(document);
                self.trace(TraceStage::Fold, format_args!("</{}> {} -> document", name, kind));
            }
        }
        self.folded += 1;
        Ok(())
    }

    /// The finished document
    pub fn finish(self) -> Result<Document> {
        let folded = self.folded;
        let document = self
            .stack
            .into_root()
            .map_err(|depth| CodecError::IncompleteDocument { depth })?;
        tracing::debug!(elements = folded, "document built");
        Ok(document)
    }
}

/// Parse a CIM-XML message from `reader` in `charset`
pub fn parse<R: Read>(reader: R, charset: Charset) -> Result<Envelope> {
    parse_with(reader, &ParseOptions::default().with_charset(charset), &mut NoTrace)
}

/// Parse a CIM-XML message with explicit options and trace sink
pub fn parse_with<R: Read>(reader: R, options: &ParseOptions, trace: &mut dyn TraceSink) -> Result<Envelope> {
    match parse_document(reader, options, trace)? {
        Document::Envelope(envelope) => Ok(envelope),
        Document::Object(object) => Err(CodecError::inconsistent(
            object_element(&object),
            "expected a CIM message",
        )),
    }
}

/// Parse a message held in memory
pub fn parse_str(xml: &str) -> Result<Envelope> {
    parse(xml.as_bytes(), Charset::Utf8)
}

/// Parse either an envelope or a bare `CLASS`/`INSTANCE` document
pub fn parse_document<R: Read>(
    reader: R,
    options: &ParseOptions,
    trace: &mut dyn TraceSink,
) -> Result<Document> {
    let source = Transcoder::new(reader, options.charset);
    let mut tokenizer = Tokenizer::new(source).with_max_depth(options.max_depth);
    let mut builder = Builder::new(options.clone()).with_trace(trace);
    loop {
        let event = tokenizer.next_event()?;
        let done = matches!(event, XmlEvent::EndDocument);
        builder.feed(event)?;
        if done {
            break;
        }
    }
    builder.finish()
}

/// Parse a bare `CLASS` or `INSTANCE` document, as carried by embedded objects
pub fn parse_object(xml: &str) -> Result<CimObject> {
    parse_object_with(xml, &ParseOptions::default())
}

pub(crate) fn parse_object_with(xml: &str, options: &ParseOptions) -> Result<CimObject> {
    let options = ParseOptions {
        charset: Charset::Utf8,
        ..options.clone()
    };
    match parse_document(xml.as_bytes(), &options, &mut NoTrace)? {
        Document::Object(object) => Ok(object),
        Document::Envelope(_) => Err(CodecError::inconsistent("CIM", "expected CLASS or INSTANCE")),
    }
}

fn object_element(object: &CimObject) -> &'static str {
    match object {
        CimObject::Class(_) => "CLASS",
        CimObject::Instance(_) => "INSTANCE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CallTarget, CimData, CimInstance, CimStatus, DataType, MessageBody, MethodKind, Property,
        Reply, Scalar, TypeTag, Value,
    };
    use crate::trace::RecordingSink;

    const HEADER: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

    fn response(body: &str) -> String {
        format!(
            r#"{}<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="1001" PROTOCOLVERSION="1.0"><SIMPLERSP>{}</SIMPLERSP></MESSAGE></CIM>"#,
            HEADER, body
        )
    }

    fn only_response(env: &Envelope) -> &crate::model::MethodResponse {
        match &env.body {
            MessageBody::Response(r) => r,
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_enumerate_instance_names_response() {
        let xml = response(
            r#"<IMETHODRESPONSE NAME="EnumerateInstanceNames"><IRETURNVALUE>
                <INSTANCENAME CLASSNAME="CIM_Disk"><KEYBINDING NAME="DeviceID"><KEYVALUE VALUETYPE="string">C:</KEYVALUE></KEYBINDING></INSTANCENAME>
                <INSTANCENAME CLASSNAME="CIM_Disk"><KEYBINDING NAME="DeviceID"><KEYVALUE>D:</KEYVALUE></KEYBINDING></INSTANCENAME>
            </IRETURNVALUE></IMETHODRESPONSE>"#,
        );
        let env = parse_str(&xml).unwrap();
        assert_eq!(env.message_id, "1001");
        let rsp = only_response(&env);
        assert_eq!(rsp.kind, MethodKind::Intrinsic);
        let names: Vec<_> = rsp.returned().iter().filter_map(CimData::as_path).collect();
        assert_eq!(names.len(), 2);
        assert_eq!(names[1].key("DeviceID"), Some(&Value::string("D:")));
    }

    #[test]
    fn test_named_instance_with_typed_properties() {
        let xml = response(
            r#"<IMETHODRESPONSE NAME="GetInstance"><IRETURNVALUE><VALUE.NAMEDINSTANCE>
                <INSTANCENAME CLASSNAME="CIM_Fan"><KEYBINDING NAME="Id"><KEYVALUE VALUETYPE="numeric" TYPE="uint32">7</KEYVALUE></KEYBINDING></INSTANCENAME>
                <INSTANCE CLASSNAME="CIM_Fan">
                  <PROPERTY NAME="Speed" TYPE="uint16"><VALUE>0x10</VALUE></PROPERTY>
                  <PROPERTY NAME="Caption" TYPE="string"><VALUE>  spaced  </VALUE></PROPERTY>
                  <PROPERTY NAME="Unset" TYPE="sint8"></PROPERTY>
                  <PROPERTY.ARRAY NAME="Codes" TYPE="uint8"><VALUE.ARRAY><VALUE>1</VALUE><VALUE.NULL/><VALUE>3</VALUE></VALUE.ARRAY></PROPERTY.ARRAY>
                  <PROPERTY.REFERENCE NAME="Owner" REFERENCECLASS="CIM_System"><VALUE.REFERENCE><INSTANCENAME CLASSNAME="CIM_System"><KEYBINDING NAME="Name"><KEYVALUE>box</KEYVALUE></KEYBINDING></INSTANCENAME></VALUE.REFERENCE></PROPERTY.REFERENCE>
                </INSTANCE>
            </VALUE.NAMEDINSTANCE></IRETURNVALUE></IMETHODRESPONSE>"#,
        );
        let env = parse_str(&xml).unwrap();
        let instance = only_response(&env).returned()[0].as_instance().unwrap();
        assert_eq!(instance.path.key("Id"), Some(&Value::uint(TypeTag::Uint32, 7)));
        assert_eq!(instance.property("Speed").unwrap().value, Value::uint(TypeTag::Uint16, 16));
        assert_eq!(instance.property("Caption").unwrap().value, Value::string("  spaced  "));
        assert!(instance.property("Unset").unwrap().value.is_null());
        assert_eq!(
            instance.property("Codes").unwrap().value.as_array().unwrap(),
            &[Some(Scalar::Uint(1)), None, Some(Scalar::Uint(3))]
        );
        let owner = instance.property("Owner").unwrap();
        assert_eq!(owner.data_type(), &DataType::reference("CIM_System"));
        let target = owner.value.as_scalar().and_then(Scalar::as_reference).unwrap();
        assert_eq!(target.key("Name"), Some(&Value::string("box")));
    }

    #[test]
    fn test_error_response() {
        let xml = response(
            r#"<METHODRESPONSE NAME="Reset"><ERROR CODE="6" DESCRIPTION="gone &amp; forgotten"/></METHODRESPONSE>"#,
        );
        let env = parse_str(&xml).unwrap();
        let err = only_response(&env).cim_error().unwrap();
        assert_eq!(err.status, CimStatus::NotFound);
        assert_eq!(err.description.as_deref(), Some("gone & forgotten"));
    }

    #[test]
    fn test_intrinsic_request() {
        let xml = format!(
            r#"{}<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="7" PROTOCOLVERSION="1.0"><SIMPLEREQ>
                <IMETHODCALL NAME="GetClass"><LOCALNAMESPACEPATH><NAMESPACE NAME="root"/><NAMESPACE NAME="cimv2"/></LOCALNAMESPACEPATH>
                <IPARAMVALUE NAME="ClassName"><CLASSNAME NAME="CIM_Fan"/></IPARAMVALUE>
                <IPARAMVALUE NAME="LocalOnly"><VALUE>FALSE</VALUE></IPARAMVALUE>
                <IPARAMVALUE NAME="DeepInheritance" PARAMTYPE="boolean"><VALUE>true</VALUE></IPARAMVALUE>
                </IMETHODCALL></SIMPLEREQ></MESSAGE></CIM>"#,
            HEADER
        );
        let env = parse_str(&xml).unwrap();
        let call = match env.body {
            MessageBody::Request(call) => call,
            other => panic!("unexpected body {:?}", other),
        };
        assert_eq!(call.target, CallTarget::Namespace(vec!["root".into(), "cimv2".into()]));
        assert_eq!(call.param("ClassName").unwrap().value, Some(CimData::Path(crate::model::ObjectPath::class("CIM_Fan"))));
        assert_eq!(call.param("LocalOnly").unwrap().value, Some(CimData::Value(Value::string("FALSE"))));
        assert_eq!(call.param("DeepInheritance").unwrap().value, Some(CimData::Value(Value::boolean(true))));
    }

    #[test]
    fn test_property_end_without_object_is_inconsistent() {
        let mut builder = Builder::new(ParseOptions::default());
        builder.feed(XmlEvent::StartDocument).unwrap();
        builder
            .feed(XmlEvent::start("PROPERTY", &[("NAME", "Orphan"), ("TYPE", "string")]))
            .unwrap();
        let err = builder.feed(XmlEvent::end("PROPERTY")).unwrap_err();
        assert!(matches!(err, CodecError::InconsistentStructure { ref element, .. } if element == "PROPERTY"));
    }

    #[test]
    fn test_property_inside_call_is_inconsistent() {
        let xml = format!(
            r#"{}<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="7" PROTOCOLVERSION="1.0"><SIMPLEREQ>
                <IMETHODCALL NAME="GetClass"><PROPERTY NAME="x" TYPE="string"/></IMETHODCALL></SIMPLEREQ></MESSAGE></CIM>"#,
            HEADER
        );
        assert!(matches!(
            parse_str(&xml),
            Err(CodecError::InconsistentStructure { .. })
        ));
    }

    #[test]
    fn test_incomplete_document() {
        let mut builder = Builder::new(ParseOptions::default());
        builder.feed(XmlEvent::StartDocument).unwrap();
        builder
            .feed(XmlEvent::start("CIM", &[("CIMVERSION", "2.0"), ("DTDVERSION", "2.0")]))
            .unwrap();
        let err = builder.feed(XmlEvent::EndDocument).unwrap_err();
        assert!(matches!(err, CodecError::IncompleteDocument { depth: 1 }));
    }

    #[test]
    fn test_unknown_element() {
        let xml = response(r#"<IMETHODRESPONSE NAME="X"><BOGUS/></IMETHODRESPONSE>"#);
        let err = parse_str(&xml).unwrap_err();
        assert!(matches!(err, CodecError::InconsistentStructure { ref element, .. } if element == "BOGUS"));
    }

    #[test]
    fn test_malformed_value_fails_parse() {
        let xml = response(
            r#"<IMETHODRESPONSE NAME="GetInstance"><IRETURNVALUE><INSTANCE CLASSNAME="X"><PROPERTY NAME="n" TYPE="uint8"><VALUE>-1</VALUE></PROPERTY></INSTANCE></IRETURNVALUE></IMETHODRESPONSE>"#,
        );
        assert!(matches!(parse_str(&xml), Err(CodecError::MalformedValue { .. })));
    }

    #[test]
    fn test_missing_message_is_inconsistent() {
        let xml = format!(r#"{}<CIM CIMVERSION="2.0" DTDVERSION="2.0"></CIM>"#, HEADER);
        assert!(matches!(parse_str(&xml), Err(CodecError::InconsistentStructure { .. })));
    }

    #[test]
    fn test_embedded_object_decoded() {
        let xml = response(
            r#"<METHODRESPONSE NAME="Get"><RETURNVALUE PARAMTYPE="string" EmbeddedObject="object"><VALUE>&lt;INSTANCE CLASSNAME="CIM_Inner"&gt;&lt;PROPERTY NAME="A" TYPE="boolean"&gt;&lt;VALUE&gt;TRUE&lt;/VALUE&gt;&lt;/PROPERTY&gt;&lt;/INSTANCE&gt;</VALUE></RETURNVALUE></METHODRESPONSE>"#,
        );
        let env = parse_str(&xml).unwrap();
        let value = only_response(&env).returned()[0].as_value().unwrap();
        assert_eq!(value.data_type.tag, TypeTag::Object);
        let object = value.as_scalar().and_then(Scalar::as_object).unwrap();
        assert_eq!(object.name(), "CIM_Inner");
    }

    #[test]
    fn test_embedded_object_fallback_keeps_string() {
        let xml = response(
            r#"<METHODRESPONSE NAME="Get"><RETURNVALUE PARAMTYPE="string" EmbeddedObject="object"><VALUE>not xml</VALUE></RETURNVALUE></METHODRESPONSE>"#,
        );
        let env = parse_str(&xml).unwrap();
        assert_eq!(
            only_response(&env).returned()[0],
            CimData::Value(Value::string("not xml"))
        );
    }

    fn nested_instances(levels: usize) -> CimObject {
        let mut object = CimObject::Instance(CimInstance::new("CIM_Leaf"));
        for _ in 0..levels {
            let outer = CimInstance::new("CIM_Shell").with_property(Property::new("Inner", Value::object(object)));
            object = CimObject::Instance(outer);
        }
        object
    }

    /// Decoded embedding levels, and the value where decoding stopped
    fn decoded_levels(object: &CimObject) -> (usize, Option<Value>) {
        let mut levels = 0;
        let mut current = object;
        loop {
            let CimObject::Instance(instance) = current else {
                return (levels, None);
            };
            let Some(property) = instance.property("Inner") else {
                return (levels, None);
            };
            match property.value.as_scalar().and_then(Scalar::as_object) {
                Some(inner) => {
                    levels += 1;
                    current = inner;
                }
                None => return (levels, Some(property.value.clone())),
            }
        }
    }

    #[test]
    fn test_deeply_nested_embedded_objects_stop_at_limit() {
        let xml = crate::writer::serialize_object(&nested_instances(60)).unwrap();
        let (levels, rest) = decoded_levels(&parse_object(&xml).unwrap());
        assert_eq!(levels, DEFAULT_MAX_EMBEDDING);
        let rest = rest.unwrap();
        assert_eq!(rest.data_type.tag, TypeTag::String);
        assert!(rest.as_scalar().and_then(Scalar::as_str).unwrap().starts_with("<INSTANCE"));

        let options = ParseOptions::new().with_max_embedding(2);
        let (levels, _) = decoded_levels(&parse_object_with(&xml, &options).unwrap());
        assert_eq!(levels, 2);
    }

    #[test]
    fn test_embedding_within_limit_decodes_fully() {
        let object = nested_instances(5);
        let xml = crate::writer::serialize_object(&object).unwrap();
        assert_eq!(parse_object(&xml).unwrap(), object);
    }

    #[test]
    fn test_embedded_objects_can_be_disabled() {
        let xml = r#"<INSTANCE CLASSNAME="Outer"><PROPERTY NAME="E" TYPE="string" EMBEDDEDOBJECT="object"><VALUE>&lt;CLASS NAME="C"/&gt;</VALUE></PROPERTY></INSTANCE>"#;
        let decoded = parse_object(xml).unwrap();
        let options = ParseOptions::new().with_embedded_objects(false);
        let raw = parse_object_with(xml, &options).unwrap();
        let value_of = |o: &CimObject| match o {
            CimObject::Instance(i) => i.property("E").unwrap().value.clone(),
            CimObject::Class(_) => unreachable!(),
        };
        assert_eq!(value_of(&decoded).data_type.tag, TypeTag::Object);
        assert_eq!(value_of(&raw), Value::string(r#"<CLASS NAME="C"/>"#));
    }

    #[test]
    fn test_class_with_methods_and_qualifiers() {
        let xml = r#"<CLASS NAME="CIM_Fan" SUPERCLASS="CIM_Device">
            <QUALIFIER NAME="Description" TYPE="string" TRANSLATABLE="true"><VALUE>A fan</VALUE></QUALIFIER>
            <PROPERTY NAME="Speed" TYPE="uint64" CLASSORIGIN="CIM_Fan"><QUALIFIER NAME="Units" TYPE="string"><VALUE>RPM</VALUE></QUALIFIER></PROPERTY>
            <METHOD NAME="SetSpeed" TYPE="uint32">
                <PARAMETER NAME="Desired" TYPE="uint64"/>
                <PARAMETER.REFARRAY NAME="Peers" REFERENCECLASS="CIM_Fan" ARRAYSIZE="2"/>
            </METHOD>
        </CLASS>"#;
        let class = match parse_object(xml).unwrap() {
            CimObject::Class(c) => c,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(class.superclass.as_deref(), Some("CIM_Device"));
        assert!(class.qualifiers[0].flavor.translatable);
        let speed = class.property("speed").unwrap();
        assert_eq!(speed.class_origin.as_deref(), Some("CIM_Fan"));
        assert_eq!(speed.qualifiers[0].value, Value::string("RPM"));
        let method = class.method("SetSpeed").unwrap();
        assert_eq!(method.return_type, DataType::scalar(TypeTag::Uint32));
        assert_eq!(
            method.parameter("Peers").unwrap().data_type.to_string(),
            "reference(CIM_Fan)[2]"
        );
    }

    #[test]
    fn test_qualifier_declaration() {
        let xml = response(
            r#"<IMETHODRESPONSE NAME="GetQualifier"><IRETURNVALUE>
                <QUALIFIER.DECLARATION NAME="Key" TYPE="boolean" OVERRIDABLE="false">
                  <SCOPE PROPERTY="true" REFERENCE="true"/><VALUE>FALSE</VALUE>
                </QUALIFIER.DECLARATION></IRETURNVALUE></IMETHODRESPONSE>"#,
        );
        let env = parse_str(&xml).unwrap();
        let decl = match &only_response(&env).returned()[0] {
            CimData::QualifierType(d) => d,
            other => panic!("unexpected {:?}", other),
        };
        assert!(decl.scope.property && decl.scope.reference && !decl.scope.class);
        assert!(decl.flavor.disable_override);
        assert_eq!(decl.default, Value::boolean(false));
    }

    #[test]
    fn test_batch_response() {
        let xml = format!(
            r#"{}<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="9" PROTOCOLVERSION="1.0"><MULTIRSP>
                <SIMPLERSP><IMETHODRESPONSE NAME="DeleteInstance"><IRETURNVALUE/></IMETHODRESPONSE></SIMPLERSP>
                <SIMPLERSP><IMETHODRESPONSE NAME="DeleteInstance"><ERROR CODE="2"/></IMETHODRESPONSE></SIMPLERSP>
                </MULTIRSP></MESSAGE></CIM>"#,
            HEADER
        );
        let env = parse_str(&xml).unwrap();
        assert!(env.is_batch());
        match env.body {
            MessageBody::BatchResponse(responses) => {
                assert_eq!(responses.len(), 2);
                assert_eq!(
                    responses[0].reply,
                    Reply::Success {
                        returned: Some(vec![]),
                        params: vec![]
                    }
                );
                assert_eq!(responses[1].cim_error().map(|e| e.status), Some(CimStatus::AccessDenied));
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_trace_sink_sees_folds() {
        let xml = response(r#"<IMETHODRESPONSE NAME="DeleteInstance"/>"#);
        let mut sink = RecordingSink::new();
        parse_with(xml.as_bytes(), &ParseOptions::default(), &mut sink).unwrap();
        let folds = sink.stage(TraceStage::Fold);
        assert_eq!(folds.first().copied(), Some("</IMETHODRESPONSE> method response -> response list"));
        assert_eq!(folds.last().copied(), Some("</CIM> envelope -> document"));
        assert_eq!(sink.stage(TraceStage::Event).len(), 4);
    }

    #[test]
    fn test_utf16_input() {
        let xml = response(r#"<IMETHODRESPONSE NAME="Ünïcode"/>"#).replace("utf-8", "utf-16");
        let mut bytes = vec![0xFF, 0xFE];
        for unit in xml.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let env = parse(bytes.as_slice(), Charset::Utf8).unwrap();
        assert_eq!(only_response(&env).name, "Ünïcode");
    }

    #[test]
    fn test_envelope_root_required_for_parse() {
        let err = parse_str(r#"<INSTANCE CLASSNAME="X"/>"#).unwrap_err();
        assert!(matches!(err, CodecError::InconsistentStructure { .. }));
    }
}
