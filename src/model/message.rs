//! Request/response envelopes

use super::object::{CimClass, CimInstance};
use super::path::ObjectPath;
use super::qualifier::QualifierType;
use super::status::CimError;
use super::types::DataType;
use super::value::Value;

/// An argument or returned item
#[derive(Debug, Clone, PartialEq)]
pub enum CimData {
    Value(Value),
    /// Class or instance name (`CLASSNAME`, `INSTANCENAME`, paths)
    Path(ObjectPath),
    Class(CimClass),
    Instance(CimInstance),
    QualifierType(QualifierType),
}

impl CimData {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            CimData::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&ObjectPath> {
        match self {
            CimData::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&CimInstance> {
        match self {
            CimData::Instance(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&CimClass> {
        match self {
            CimData::Class(c) => Some(c),
            _ => None,
        }
    }
}

/// A named argument or output parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamValue {
    pub name: String,
    /// `None` for a parameter sent without a value
    pub value: Option<CimData>,
}

impl ParamValue {
    pub fn new(name: impl Into<String>, value: CimData) -> Self {
        ParamValue {
            name: name.into(),
            value: Some(value),
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        ParamValue {
            name: name.into(),
            value: None,
        }
    }

    /// Declared type of a value argument
    pub fn param_type(&self) -> Option<&DataType> {
        match &self.value {
            Some(CimData::Value(v)) => Some(&v.data_type),
            _ => None,
        }
    }
}

/// Which family of method a call or response belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Operation defined by the protocol (`IMETHODCALL`)
    Intrinsic,
    /// Method defined by a class (`METHODCALL`)
    Extrinsic,
    /// Export to a listener (`EXPMETHODCALL`)
    Export,
}

/// What a method call is addressed to
#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    /// Namespace segments of an intrinsic call
    Namespace(Vec<String>),
    /// Class or instance of an extrinsic call
    Object(ObjectPath),
    /// Export calls have no target
    Export,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub name: String,
    pub target: CallTarget,
    pub params: Vec<ParamValue>,
}

impl MethodCall {
    pub fn intrinsic(name: impl Into<String>, namespace: &str) -> Self {
        MethodCall {
            name: name.into(),
            target: CallTarget::Namespace(super::path::split_namespace(namespace)),
            params: Vec::new(),
        }
    }

    pub fn extrinsic(name: impl Into<String>, target: ObjectPath) -> Self {
        MethodCall {
            name: name.into(),
            target: CallTarget::Object(target),
            params: Vec::new(),
        }
    }

    pub fn export(name: impl Into<String>) -> Self {
        MethodCall {
            name: name.into(),
            target: CallTarget::Export,
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: ParamValue) -> Self {
        self.params.push(param);
        self
    }

    pub fn kind(&self) -> MethodKind {
        match self.target {
            CallTarget::Namespace(_) => MethodKind::Intrinsic,
            CallTarget::Object(_) => MethodKind::Extrinsic,
            CallTarget::Export => MethodKind::Export,
        }
    }

    pub fn is_export(&self) -> bool {
        self.kind() == MethodKind::Export
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// Outcome of a method
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Error(CimError),
    Success {
        /// Items of `RETURNVALUE`/`IRETURNVALUE`; `None` when the element is absent
        returned: Option<Vec<CimData>>,
        /// Output parameters (`PARAMVALUE`)
        params: Vec<ParamValue>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodResponse {
    pub name: String,
    pub kind: MethodKind,
    pub reply: Reply,
}

impl MethodResponse {
    pub fn success(name: impl Into<String>, kind: MethodKind, returned: Option<Vec<CimData>>) -> Self {
        MethodResponse {
            name: name.into(),
            kind,
            reply: Reply::Success {
                returned,
                params: Vec::new(),
            },
        }
    }

    pub fn error(name: impl Into<String>, kind: MethodKind, error: CimError) -> Self {
        MethodResponse {
            name: name.into(),
            kind,
            reply: Reply::Error(error),
        }
    }

    pub fn is_export(&self) -> bool {
        self.kind == MethodKind::Export
    }

    /// The protocol error, if the method failed
    pub fn cim_error(&self) -> Option<&CimError> {
        match &self.reply {
            Reply::Error(e) => Some(e),
            Reply::Success { .. } => None,
        }
    }

    /// Returned items; empty for errors and absent return values
    pub fn returned(&self) -> &[CimData] {
        match &self.reply {
            Reply::Success {
                returned: Some(items),
                ..
            } => items,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Request(MethodCall),
    Response(MethodResponse),
    BatchRequest(Vec<MethodCall>),
    BatchResponse(Vec<MethodResponse>),
}

/// One wire message: `CIM` root plus `MESSAGE`
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub cim_version: String,
    pub dtd_version: String,
    pub message_id: String,
    pub protocol_version: String,
    pub body: MessageBody,
}

impl Envelope {
    pub const CIM_VERSION: &'static str = "2.0";
    pub const DTD_VERSION: &'static str = "2.0";
    pub const PROTOCOL_VERSION: &'static str = "1.0";

    pub fn new(message_id: impl Into<String>, body: MessageBody) -> Self {
        Envelope {
            cim_version: Self::CIM_VERSION.to_string(),
            dtd_version: Self::DTD_VERSION.to_string(),
            message_id: message_id.into(),
            protocol_version: Self::PROTOCOL_VERSION.to_string(),
            body,
        }
    }

    pub fn request(message_id: impl Into<String>, call: MethodCall) -> Self {
        Self::new(message_id, MessageBody::Request(call))
    }

    pub fn response(message_id: impl Into<String>, response: MethodResponse) -> Self {
        Self::new(message_id, MessageBody::Response(response))
    }

    pub fn is_request(&self) -> bool {
        matches!(self.body, MessageBody::Request(_) | MessageBody::BatchRequest(_))
    }

    pub fn is_batch(&self) -> bool {
        matches!(self.body, MessageBody::BatchRequest(_) | MessageBody::BatchResponse(_))
    }

    /// Whether the message goes to or comes from a listener
    pub fn is_export(&self) -> bool {
        match &self.body {
            MessageBody::Request(c) => c.is_export(),
            MessageBody::Response(r) => r.is_export(),
            MessageBody::BatchRequest(calls) => calls.first().map_or(false, MethodCall::is_export),
            MessageBody::BatchResponse(rsps) => rsps.first().map_or(false, MethodResponse::is_export),
        }
    }
}
