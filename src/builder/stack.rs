//! Build stack: element names plus partially built objects

use crate::error::{CodecError, Result};
use crate::model::{
    CallTarget, CimClass, CimData, CimError, CimInstance, CimObject, DataType, Envelope, KeyBinding,
    Method, MessageBody, MethodCall, MethodKind, MethodResponse, ObjectPath, ParamValue, Parameter,
    Property, Qualifier, QualifierType, Scope, Value,
};

/// Value text not yet converted to its declared type
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Raw {
    Text(String),
    Array(Vec<Option<String>>),
    Reference(ObjectPath),
    RefArray(Vec<Option<ObjectPath>>),
}

/// Payload of a parameter or return value, typed when its element ends
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Content {
    Raw(Raw),
    Data(CimData),
}

/// A partially built object on the stack, one per open element
#[derive(Debug)]
pub(crate) enum Frame {
    Cim {
        cim_version: String,
        dtd_version: String,
        message: Option<(String, String, MessageBody)>,
    },
    Message {
        id: String,
        protocol_version: String,
        body: Option<MessageBody>,
    },
    Requests(Vec<MethodCall>),
    Responses(Vec<MethodResponse>),
    Call {
        name: String,
        kind: MethodKind,
        target: Option<CallTarget>,
        params: Vec<ParamValue>,
    },
    Response {
        name: String,
        kind: MethodKind,
        error: Option<CimError>,
        returned: Option<Vec<CimData>>,
        params: Vec<ParamValue>,
    },
    Param {
        name: String,
        param_type: Option<DataType>,
        embedded: bool,
        content: Option<Content>,
    },
    Return {
        param_type: Option<DataType>,
        embedded: bool,
        contents: Vec<Content>,
    },
    Error(CimError),
    NamespacePath {
        host: Option<String>,
        namespace: Vec<String>,
    },
    Namespace(String),
    /// `HOST` and `VALUE` text
    Text(String),
    Path(ObjectPath),
    KeyBinding {
        name: String,
        value: Option<Value>,
    },
    KeyValue {
        value_type: String,
        type_name: Option<String>,
        text: String,
    },
    ValueArray(Vec<Option<String>>),
    RefArray(Vec<Option<ObjectPath>>),
    Reference(Option<ObjectPath>),
    Null,
    /// `VALUE.OBJECT` and the path-carrying object wrappers
    Wrapper {
        path: Option<ObjectPath>,
        object: Option<CimObject>,
    },
    Class(CimClass),
    Instance(CimInstance),
    Qualifier {
        qualifier: Qualifier,
        raw: Option<Raw>,
    },
    QualifierDecl {
        decl: QualifierType,
        raw: Option<Raw>,
    },
    Scope(Scope),
    Property {
        property: Property,
        embedded: bool,
        raw: Option<Raw>,
    },
    Method(Method),
    Parameter(Parameter),
    /// Finished document; the only frame left after a successful parse
    Root(Document),
}

impl Frame {
    /// Short name used in error messages
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Frame::Cim { .. } => "envelope",
            Frame::Message { .. } => "message",
            Frame::Requests(_) => "request list",
            Frame::Responses(_) => "response list",
            Frame::Call { .. } => "method call",
            Frame::Response { .. } => "method response",
            Frame::Param { .. } => "parameter value",
            Frame::Return { .. } => "return value",
            Frame::Error(_) => "error",
            Frame::NamespacePath { .. } => "namespace path",
            Frame::Namespace(_) => "namespace",
            Frame::Text(_) => "text",
            Frame::Path(_) => "object path",
            Frame::KeyBinding { .. } => "key binding",
            Frame::KeyValue { .. } => "key value",
            Frame::ValueArray(_) => "value array",
            Frame::RefArray(_) => "reference array",
            Frame::Reference(_) => "reference",
            Frame::Null => "null",
            Frame::Wrapper { .. } => "object wrapper",
            Frame::Class(_) => "class",
            Frame::Instance(_) => "instance",
            Frame::Qualifier { .. } => "qualifier",
            Frame::QualifierDecl { .. } => "qualifier declaration",
            Frame::Scope(_) => "scope",
            Frame::Property { .. } => "property",
            Frame::Method(_) => "method",
            Frame::Parameter(_) => "parameter",
            Frame::Root(_) => "document",
        }
    }

    /// Where character data goes, for frames that take text
    pub(crate) fn text_slot(&mut self) -> Option<&mut String> {
        match self {
            Frame::Text(text) | Frame::KeyValue { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// A completed element, ready to be attached to its parent frame
#[derive(Debug)]
pub(crate) enum Item {
    Envelope(Envelope),
    Message {
        id: String,
        protocol_version: String,
        body: MessageBody,
    },
    Request(MethodCall),
    BatchRequest(Vec<MethodCall>),
    Response(MethodResponse),
    BatchResponse(Vec<MethodResponse>),
    Call(MethodCall),
    MethodResponse(MethodResponse),
    Param(ParamValue),
    Return(Vec<CimData>),
    Error(CimError),
    NamespacePath {
        host: Option<String>,
        namespace: Vec<String>,
    },
    Namespace(String),
    Host(String),
    Path(ObjectPath),
    KeyBinding(KeyBinding),
    KeyValue(Value),
    Raw(Raw),
    Null,
    Object(CimObject),
    Qualifier(Qualifier),
    QualifierType(QualifierType),
    Scope(Scope),
    Property(Property),
    Method(Method),
    Parameter(Parameter),
}

impl Item {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Item::Envelope(_) => "envelope",
            Item::Message { .. } => "message",
            Item::Request(_) => "request",
            Item::BatchRequest(_) => "batch request",
            Item::Response(_) => "response",
            Item::BatchResponse(_) => "batch response",
            Item::Call(_) => "method call",
            Item::MethodResponse(_) => "method response",
            Item::Param(_) => "parameter value",
            Item::Return(_) => "return value",
            Item::Error(_) => "error",
            Item::NamespacePath { .. } => "namespace path",
            Item::Namespace(_) => "namespace",
            Item::Host(_) => "host",
            Item::Path(_) => "object path",
            Item::KeyBinding(_) => "key binding",
            Item::KeyValue(_) => "key value",
            Item::Raw(Raw::Text(_)) => "value",
            Item::Raw(Raw::Array(_)) => "value array",
            Item::Raw(Raw::Reference(_)) => "reference",
            Item::Raw(Raw::RefArray(_)) => "reference array",
            Item::Null => "null",
            Item::Object(CimObject::Class(_)) => "class",
            Item::Object(CimObject::Instance(_)) => "instance",
            Item::Qualifier(_) => "qualifier",
            Item::QualifierType(_) => "qualifier declaration",
            Item::Scope(_) => "scope",
            Item::Property(_) => "property",
            Item::Method(_) => "method",
            Item::Parameter(_) => "parameter",
        }
    }
}

/// Result of a parse: an envelope, or a bare class/instance document
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Envelope(Envelope),
    Object(CimObject),
}

/// Object stack plus the element-name stack that mirrors it
#[derive(Debug, Default)]
pub(crate) struct BuildStack {
    names: Vec<String>,
    frames: Vec<Frame>,
}

impl BuildStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: &str, frame: Frame) {
        self.names.push(name.to_string());
        self.frames.push(frame);
    }

    /// Pop the frame of the element `name` ends
    pub(crate) fn pop(&mut self, name: &str) -> Result<Frame> {
        match self.names.last() {
            Some(open) if open == name => {}
            Some(open) => {
                return Err(CodecError::inconsistent(
                    name,
                    format!("end of <{}> while <{}> is open", name, open),
                ))
            }
            None => return Err(CodecError::inconsistent(name, "end tag with nothing open")),
        }
        self.names.pop();
        self.frames
            .pop()
            .ok_or_else(|| CodecError::inconsistent(name, "object stack is empty"))
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut Frame> {
        match self.frames.last_mut() {
            Some(Frame::Root(_)) | None => None,
            Some(frame) => Some(frame),
        }
    }

    pub(crate) fn has_root(&self) -> bool {
        matches!(self.frames.first(), Some(Frame::Root(_)))
    }

    /// Install the finished document
    pub(crate) fn set_root(&mut self, document: Document) {
        self.frames.push(Frame::Root(document));
    }

    pub(crate) fn open_elements(&self) -> usize {
        self.names.len()
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The finished document, when the stack holds exactly that
    pub(crate) fn into_root(mut self) -> std::result::Result<Document, usize> {
        let depth = self.frames.len();
        match (depth, self.frames.pop()) {
            (1, Some(Frame::Root(document))) => Ok(document),
            _ => Err(depth),
        }
    }
}
