//! Folding rules
//!
//! `open` builds the frame an element's start tag implies, `finish` turns a
//! frame into a completed item when its end tag arrives, and `attach` folds
//! that item into the frame beneath it. `attach` looks only at the immediate
//! parent frame.

use crate::codec::literal::parse_typed;
use crate::codec::types::wire_name_to_type_tag;
use crate::error::{CodecError, Result};
use crate::model::qualifier::find_qualifier;
use crate::model::{
    CallTarget, CimClass, CimData, CimError, CimInstance, CimObject, CimStatus, DataType, Envelope,
    Flavor, KeyBinding, MessageBody, Method, MethodCall, MethodKind, MethodResponse, ObjectPath,
    ParamValue, Parameter, Property, Qualifier, QualifierType, Reply, Scalar, Scope, TypeTag, Value,
    ValueData,
};
use crate::reader::events::StartElement;

use super::stack::{Content, Document, Frame, Item, Raw};
use super::ParseOptions;

fn attr<'a>(start: &'a StartElement, name: &str) -> Option<&'a str> {
    start.get_attribute_value(name)
}

fn required<'a>(start: &'a StartElement, name: &str) -> Result<&'a str> {
    attr(start, name)
        .ok_or_else(|| CodecError::inconsistent(&start.name, format!("missing attribute {}", name)))
}

fn owned(start: &StartElement, name: &str) -> Option<String> {
    attr(start, name).map(str::to_string)
}

/// `true`/`false` attribute; anything else counts as absent
fn bool_attr(start: &StartElement, name: &str) -> Option<bool> {
    let value = attr(start, name)?.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn flag(start: &StartElement, name: &str) -> bool {
    bool_attr(start, name).unwrap_or(false)
}

fn type_tag(start: &StartElement, name: &str) -> TypeTag {
    attr(start, name).map_or(TypeTag::String, wire_name_to_type_tag)
}

fn array_size(start: &StartElement) -> Result<Option<u32>> {
    match attr(start, "ARRAYSIZE") {
        None => Ok(None),
        Some(text) => text
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| CodecError::malformed_value("uint32", text, "invalid ARRAYSIZE")),
    }
}

fn reference_type(start: &StartElement) -> DataType {
    DataType::reference(attr(start, "REFERENCECLASS").unwrap_or_default())
}

fn flavor(start: &StartElement) -> Flavor {
    let mut flavor = Flavor::default();
    match bool_attr(start, "OVERRIDABLE") {
        Some(true) => flavor.overridable = true,
        Some(false) => flavor.disable_override = true,
        None => {}
    }
    match bool_attr(start, "TOSUBCLASS") {
        Some(true) => flavor.to_subclass = true,
        Some(false) => flavor.restricted = true,
        None => {}
    }
    flavor.translatable = flag(start, "TRANSLATABLE");
    flavor
}

/// `EmbeddedObject="object"` or `"instance"`, in any case
fn is_embedded(start: &StartElement) -> bool {
    start
        .get_attribute_value_ci("EmbeddedObject")
        .map_or(false, |kind| {
            let kind = kind.trim();
            kind.eq_ignore_ascii_case("object") || kind.eq_ignore_ascii_case("instance")
        })
}

fn param_type(start: &StartElement) -> Option<DataType> {
    let tag = wire_name_to_type_tag(attr(start, "PARAMTYPE")?);
    Some(if tag == TypeTag::Reference {
        DataType::reference("")
    } else {
        DataType::scalar(tag)
    })
}

fn method_kind(element: &str) -> MethodKind {
    match element.trim_end_matches("METHODCALL").trim_end_matches("METHODRESPONSE") {
        "I" => MethodKind::Intrinsic,
        "EXP" => MethodKind::Export,
        _ => MethodKind::Extrinsic,
    }
}

fn property_frame(start: &StartElement, data_type: DataType) -> Result<Frame> {
    let mut property = Property::new(required(start, "NAME")?, Value::null(data_type));
    property.class_origin = owned(start, "CLASSORIGIN");
    property.propagated = flag(start, "PROPAGATED");
    Ok(Frame::Property {
        property,
        embedded: is_embedded(start),
        raw: None,
    })
}

/// Frame for an element start; everything it needs comes from the start tag
pub(crate) fn open(start: &StartElement) -> Result<Frame> {
    let element = start.name.as_str();
    let frame = match element {
        "CIM" => Frame::Cim {
            cim_version: owned(start, "CIMVERSION").unwrap_or_default(),
            dtd_version: owned(start, "DTDVERSION").unwrap_or_default(),
            message: None,
        },
        "MESSAGE" => Frame::Message {
            id: required(start, "ID")?.to_string(),
            protocol_version: owned(start, "PROTOCOLVERSION").unwrap_or_default(),
            body: None,
        },
        "SIMPLEREQ" | "MULTIREQ" | "SIMPLEEXPREQ" | "MULTIEXPREQ" => Frame::Requests(Vec::new()),
        "SIMPLERSP" | "MULTIRSP" | "SIMPLEEXPRSP" | "MULTIEXPRSP" => Frame::Responses(Vec::new()),
        "METHODCALL" | "IMETHODCALL" | "EXPMETHODCALL" => Frame::Call {
            name: required(start, "NAME")?.to_string(),
            kind: method_kind(element),
            target: None,
            params: Vec::new(),
        },
        "METHODRESPONSE" | "IMETHODRESPONSE" | "EXPMETHODRESPONSE" => Frame::Response {
            name: required(start, "NAME")?.to_string(),
            kind: method_kind(element),
            error: None,
            returned: None,
            params: Vec::new(),
        },
        "PARAMVALUE" | "IPARAMVALUE" | "EXPPARAMVALUE" => Frame::Param {
            name: required(start, "NAME")?.to_string(),
            param_type: param_type(start),
            embedded: is_embedded(start),
            content: None,
        },
        "RETURNVALUE" | "IRETURNVALUE" => Frame::Return {
            param_type: param_type(start),
            embedded: is_embedded(start),
            contents: Vec::new(),
        },
        "ERROR" => {
            let code = required(start, "CODE")?;
            let code = code
                .trim()
                .parse::<u32>()
                .map_err(|_| CodecError::malformed_value("uint32", code, "invalid status code"))?;
            let mut error = CimError::new(CimStatus::from_code(code));
            error.description = owned(start, "DESCRIPTION");
            Frame::Error(error)
        }
        "NAMESPACEPATH" | "LOCALNAMESPACEPATH" => Frame::NamespacePath {
            host: None,
            namespace: Vec::new(),
        },
        "NAMESPACE" => Frame::Namespace(required(start, "NAME")?.to_string()),
        "HOST" | "VALUE" => Frame::Text(String::new()),
        "CLASSPATH" | "LOCALCLASSPATH" | "INSTANCEPATH" | "LOCALINSTANCEPATH" | "OBJECTPATH" => {
            Frame::Path(ObjectPath::default())
        }
        "CLASSNAME" => Frame::Path(ObjectPath::class(required(start, "NAME")?)),
        "INSTANCENAME" => Frame::Path(ObjectPath::class(required(start, "CLASSNAME")?)),
        "KEYBINDING" => Frame::KeyBinding {
            name: required(start, "NAME")?.to_string(),
            value: None,
        },
        "KEYVALUE" => Frame::KeyValue {
            value_type: owned(start, "VALUETYPE").unwrap_or_else(|| "string".to_string()),
            type_name: owned(start, "TYPE"),
            text: String::new(),
        },
        "VALUE.ARRAY" => Frame::ValueArray(Vec::new()),
        "VALUE.REFARRAY" => Frame::RefArray(Vec::new()),
        "VALUE.REFERENCE" => Frame::Reference(None),
        "VALUE.NULL" => Frame::Null,
        "VALUE.OBJECT"
        | "VALUE.NAMEDINSTANCE"
        | "VALUE.NAMEDOBJECT"
        | "VALUE.OBJECTWITHPATH"
        | "VALUE.OBJECTWITHLOCALPATH"
        | "VALUE.INSTANCEWITHPATH" => Frame::Wrapper {
            path: None,
            object: None,
        },
        "CLASS" => {
            let mut class = CimClass::new(required(start, "NAME")?);
            class.superclass = owned(start, "SUPERCLASS");
            Frame::Class(class)
        }
        "INSTANCE" => Frame::Instance(CimInstance::new(required(start, "CLASSNAME")?)),
        "QUALIFIER" => {
            let data_type = DataType::scalar(type_tag(start, "TYPE"));
            let mut qualifier = Qualifier::new(required(start, "NAME")?, Value::null(data_type));
            qualifier.propagated = flag(start, "PROPAGATED");
            qualifier.flavor = flavor(start);
            Frame::Qualifier { qualifier, raw: None }
        }
        "QUALIFIER.DECLARATION" => {
            let mut data_type = DataType::scalar(type_tag(start, "TYPE"));
            if flag(start, "ISARRAY") {
                data_type = data_type.with_array(array_size(start)?);
            }
            let mut decl = QualifierType::new(required(start, "NAME")?, data_type);
            decl.flavor = flavor(start);
            Frame::QualifierDecl { decl, raw: None }
        }
        "SCOPE" => {
            let mut scope = Scope::default();
            for attribute in &start.attributes {
                scope.set(&attribute.name, attribute.value.trim().eq_ignore_ascii_case("true"));
            }
            Frame::Scope(scope)
        }
        "PROPERTY" => property_frame(start, DataType::scalar(type_tag(start, "TYPE")))?,
        "PROPERTY.ARRAY" => property_frame(
            start,
            DataType::scalar(type_tag(start, "TYPE")).with_array(array_size(start)?),
        )?,
        "PROPERTY.REFERENCE" => property_frame(start, reference_type(start))?,
        "METHOD" => {
            let mut method = Method::new(
                required(start, "NAME")?,
                DataType::scalar(type_tag(start, "TYPE")),
            );
            method.class_origin = owned(start, "CLASSORIGIN");
            method.propagated = flag(start, "PROPAGATED");
            Frame::Method(method)
        }
        "PARAMETER" => Frame::Parameter(Parameter::new(
            required(start, "NAME")?,
            DataType::scalar(type_tag(start, "TYPE")),
        )),
        "PARAMETER.REFERENCE" => {
            Frame::Parameter(Parameter::new(required(start, "NAME")?, reference_type(start)))
        }
        "PARAMETER.ARRAY" => Frame::Parameter(Parameter::new(
            required(start, "NAME")?,
            DataType::scalar(type_tag(start, "TYPE")).with_array(array_size(start)?),
        )),
        "PARAMETER.REFARRAY" => Frame::Parameter(Parameter::new(
            required(start, "NAME")?,
            reference_type(start).with_array(array_size(start)?),
        )),
        _ => return Err(CodecError::inconsistent(element, "unknown element")),
    };
    Ok(frame)
}

/// Convert raw value text to `data_type`; `None` is a null value
fn type_raw(data_type: &DataType, raw: Option<Raw>, element: &str) -> Result<Value> {
    let mismatch = |what: &str| {
        CodecError::inconsistent(element, format!("{} given for declared type {}", what, data_type))
    };
    let element_type = data_type.element();
    let data = match raw {
        None => ValueData::Null,
        Some(Raw::Text(text)) => {
            if data_type.is_array {
                return Err(mismatch("scalar VALUE"));
            }
            ValueData::Scalar(parse_typed(data_type.tag, &text)?)
        }
        Some(Raw::Array(items)) => {
            if !data_type.is_array {
                return Err(mismatch("VALUE.ARRAY"));
            }
            ValueData::Array(
                items
                    .into_iter()
                    .map(|item| item.map(|text| parse_typed(element_type.tag, &text)).transpose())
                    .collect::<Result<_>>()?,
            )
        }
        Some(Raw::Reference(path)) => {
            if data_type.is_array || !data_type.is_reference() {
                return Err(mismatch("VALUE.REFERENCE"));
            }
            ValueData::Scalar(Scalar::Reference(path))
        }
        Some(Raw::RefArray(items)) => {
            if !data_type.is_array || !data_type.is_reference() {
                return Err(mismatch("VALUE.REFARRAY"));
            }
            ValueData::Array(items.into_iter().map(|p| p.map(Scalar::Reference)).collect())
        }
    };
    Ok(Value::new(data_type.clone(), data))
}

fn has_embedded_qualifier(qualifiers: &[Qualifier]) -> bool {
    find_qualifier(qualifiers, "EmbeddedInstance").is_some()
        || find_qualifier(qualifiers, "EmbeddedObject")
            .and_then(|q| q.value.as_scalar())
            .and_then(Scalar::as_bool)
            .unwrap_or(false)
}

/// Decode string values that carry embedded objects.
///
/// On any decode failure the string value is returned unchanged.
fn embed(value: Value, element: &str, options: &ParseOptions) -> Value {
    if !options.embedded_objects || value.data_type.tag != TypeTag::String {
        return value;
    }
    if options.max_embedding == 0 && !value.is_null() {
        tracing::warn!(element, "embedded objects nested too deeply, kept as string");
        return value;
    }
    // Objects inside this one get one level less
    let nested = ParseOptions {
        max_embedding: options.max_embedding.saturating_sub(1),
        ..options.clone()
    };
    let decode = |text: &str| {
        super::parse_object_with(text, &nested).map(|object| Scalar::Object(Box::new(object)))
    };
    let decoded = match &value.data {
        ValueData::Null => Some(Ok(ValueData::Null)),
        ValueData::Scalar(Scalar::String(text)) => Some(decode(text).map(ValueData::Scalar)),
        ValueData::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Some(Scalar::String(text)) => decode(text).map(Some),
                    _ => Ok(None),
                })
                .collect::<Result<Vec<_>>>()
                .map(ValueData::Array),
        ),
        ValueData::Scalar(_) => None,
    };
    let Some(decoded) = decoded else {
        return value;
    };
    match decoded {
        Ok(data) => {
            let data_type = DataType {
                tag: TypeTag::Object,
                ..value.data_type
            };
            Value::new(data_type, data)
        }
        Err(err) => {
            tracing::warn!(element, error = %err, "embedded object kept as string");
            value
        }
    }
}

fn object_data(object: CimObject) -> CimData {
    match object {
        CimObject::Class(class) => CimData::Class(class),
        CimObject::Instance(instance) => CimData::Instance(instance),
    }
}

/// Type the payload of a parameter or return value
fn content_data(
    content: Content,
    param_type: Option<&DataType>,
    embedded: bool,
    element: &str,
    options: &ParseOptions,
) -> Result<CimData> {
    let raw = match content {
        Content::Data(data) => return Ok(data),
        Content::Raw(raw) => raw,
    };
    let declared = param_type.map(DataType::element);
    let data_type = match (&raw, declared) {
        (Raw::Text(_), Some(dt)) => dt,
        (Raw::Text(_), None) => DataType::scalar(TypeTag::String),
        (Raw::Array(_), Some(dt)) => dt.with_array(None),
        (Raw::Array(_), None) => DataType::array(TypeTag::String),
        (Raw::Reference(_), _) => DataType::reference(""),
        (Raw::RefArray(_), _) => DataType::reference("").with_array(None),
    };
    let value = type_raw(&data_type, Some(raw), element)?;
    Ok(CimData::Value(if embedded {
        embed(value, element, options)
    } else {
        value
    }))
}

fn key_value(value_type: &str, type_name: Option<&str>, text: &str) -> Result<Value> {
    let tag = match type_name {
        Some(name) => wire_name_to_type_tag(name),
        None => match value_type.trim().to_ascii_lowercase().as_str() {
            "boolean" => TypeTag::Boolean,
            "numeric" => TypeTag::Numeric,
            _ => TypeTag::String,
        },
    };
    let data_type = if tag == TypeTag::Reference {
        DataType::reference("")
    } else {
        DataType::scalar(tag)
    };
    Ok(Value::scalar(data_type, parse_typed(tag, text)?))
}

/// Completed item for a frame whose element just ended
pub(crate) fn finish(element: &str, frame: Frame, options: &ParseOptions) -> Result<Item> {
    let missing = |what: &str| CodecError::inconsistent(element, format!("missing {}", what));

    let item = match frame {
        Frame::Cim {
            cim_version,
            dtd_version,
            message,
        } => {
            let (message_id, protocol_version, body) = message.ok_or_else(|| missing("MESSAGE"))?;
            Item::Envelope(Envelope {
                cim_version,
                dtd_version,
                message_id,
                protocol_version,
                body,
            })
        }
        Frame::Message {
            id,
            protocol_version,
            body,
        } => Item::Message {
            id,
            protocol_version,
            body: body.ok_or_else(|| missing("request or response"))?,
        },
        Frame::Requests(mut calls) => {
            if element.starts_with("SIMPLE") {
                match (calls.pop(), calls.is_empty()) {
                    (Some(call), true) => Item::Request(call),
                    _ => return Err(missing("exactly one method call")),
                }
            } else if calls.is_empty() {
                return Err(missing("method calls"));
            } else {
                Item::BatchRequest(calls)
            }
        }
        Frame::Responses(mut responses) => {
            if element.starts_with("SIMPLE") {
                match (responses.pop(), responses.is_empty()) {
                    (Some(response), true) => Item::Response(response),
                    _ => return Err(missing("exactly one method response")),
                }
            } else if responses.is_empty() {
                return Err(missing("method responses"));
            } else {
                Item::BatchResponse(responses)
            }
        }
        Frame::Call {
            name,
            kind,
            target,
            params,
        } => {
            let target = match (kind, target) {
                (MethodKind::Export, None) => CallTarget::Export,
                (MethodKind::Intrinsic, Some(t @ CallTarget::Namespace(_))) => t,
                (MethodKind::Extrinsic, Some(t @ CallTarget::Object(_))) => t,
                _ => return Err(missing("call target")),
            };
            Item::Call(MethodCall {
                name,
                target,
                params,
            })
        }
        Frame::Response {
            name,
            kind,
            error,
            returned,
            params,
        } => {
            let reply = match error {
                Some(error) => Reply::Error(error),
                None => Reply::Success { returned, params },
            };
            Item::MethodResponse(MethodResponse { name, kind, reply })
        }
        Frame::Param {
            name,
            param_type,
            embedded,
            content,
        } => {
            let value = match content {
                Some(content) => Some(content_data(content, param_type.as_ref(), embedded, element, options)?),
                None => param_type.map(|data_type| {
                    let null = Value::null(data_type);
                    CimData::Value(if embedded { embed(null, element, options) } else { null })
                }),
            };
            Item::Param(ParamValue { name, value })
        }
        Frame::Return {
            param_type,
            embedded,
            contents,
        } => Item::Return(
            contents
                .into_iter()
                .map(|c| content_data(c, param_type.as_ref(), embedded, element, options))
                .collect::<Result<_>>()?,
        ),
        Frame::Error(error) => Item::Error(error),
        Frame::NamespacePath { host, namespace } => Item::NamespacePath { host, namespace },
        Frame::Namespace(name) => Item::Namespace(name),
        Frame::Text(text) if element == "HOST" => Item::Host(text),
        Frame::Text(text) => Item::Raw(Raw::Text(text)),
        Frame::Path(path) => {
            if path.class_name.is_empty() {
                return Err(missing("class name"));
            }
            Item::Path(path)
        }
        Frame::KeyBinding { name, value } => {
            Item::KeyBinding(KeyBinding::new(name, value.ok_or_else(|| missing("key value"))?))
        }
        Frame::KeyValue {
            value_type,
            type_name,
            text,
        } => Item::KeyValue(key_value(&value_type, type_name.as_deref(), &text)?),
        Frame::ValueArray(items) => Item::Raw(Raw::Array(items)),
        Frame::RefArray(items) => Item::Raw(Raw::RefArray(items)),
        Frame::Reference(path) => Item::Raw(Raw::Reference(path.ok_or_else(|| missing("path"))?)),
        Frame::Null => Item::Null,
        Frame::Wrapper { path, object } => {
            let mut object = object.ok_or_else(|| missing("CLASS or INSTANCE"))?;
            if let Some(path) = path {
                match &mut object {
                    CimObject::Class(class) => class.path = path,
                    CimObject::Instance(instance) => instance.path = path,
                }
            }
            Item::Object(object)
        }
        Frame::Class(class) => Item::Object(CimObject::Class(class)),
        Frame::Instance(instance) => Item::Object(CimObject::Instance(instance)),
        Frame::Qualifier { mut qualifier, raw } => {
            let mut data_type = qualifier.value.data_type.clone();
            if matches!(raw, Some(Raw::Array(_))) {
                data_type = data_type.with_array(None);
            }
            qualifier.value = type_raw(&data_type, raw, element)?;
            Item::Qualifier(qualifier)
        }
        Frame::QualifierDecl { mut decl, raw } => {
            let mut data_type = decl.default.data_type.clone();
            if matches!(raw, Some(Raw::Array(_))) && !data_type.is_array {
                data_type = data_type.with_array(None);
            }
            decl.default = type_raw(&data_type, raw, element)?;
            Item::QualifierType(decl)
        }
        Frame::Scope(scope) => Item::Scope(scope),
        Frame::Property {
            mut property,
            embedded,
            raw,
        } => {
            let value = type_raw(&property.value.data_type, raw, element)?;
            property.value = if embedded || has_embedded_qualifier(&property.qualifiers) {
                embed(value, element, options)
            } else {
                value
            };
            Item::Property(property)
        }
        Frame::Method(method) => Item::Method(method),
        Frame::Parameter(parameter) => Item::Parameter(parameter),
        Frame::Root(_) => return Err(CodecError::inconsistent(element, "document already complete")),
    };
    Ok(item)
}

fn set_once<T>(slot: &mut Option<T>, value: T, element: &str) -> Result<()> {
    if slot.is_some() {
        return Err(CodecError::inconsistent(element, "element may appear only once here"));
    }
    *slot = Some(value);
    Ok(())
}

/// Take the child's class, keys and (when present) host and namespace
fn merge_path(path: &mut ObjectPath, child: ObjectPath) {
    if child.host.is_some() {
        path.host = child.host;
    }
    if !child.namespace.is_empty() {
        path.namespace = child.namespace;
    }
    path.class_name = child.class_name;
    path.keys = child.keys;
}

/// Fold a completed item into its parent frame
pub(crate) fn attach(parent: &mut Frame, item: Item, element: &str) -> Result<()> {
    match (parent, item) {
        (
            Frame::Cim { message, .. },
            Item::Message {
                id,
                protocol_version,
                body,
            },
        ) => set_once(message, (id, protocol_version, body), element)?,

        (Frame::Message { body, .. }, Item::Request(call)) => {
            set_once(body, MessageBody::Request(call), element)?
        }
        (Frame::Message { body, .. }, Item::BatchRequest(calls)) => {
            set_once(body, MessageBody::BatchRequest(calls), element)?
        }
        (Frame::Message { body, .. }, Item::Response(response)) => {
            set_once(body, MessageBody::Response(response), element)?
        }
        (Frame::Message { body, .. }, Item::BatchResponse(responses)) => {
            set_once(body, MessageBody::BatchResponse(responses), element)?
        }

        (Frame::Requests(calls), Item::Call(call) | Item::Request(call)) => calls.push(call),
        (Frame::Responses(responses), Item::MethodResponse(r) | Item::Response(r)) => {
            responses.push(r)
        }

        (
            Frame::Call {
                kind: MethodKind::Intrinsic,
                target,
                ..
            },
            Item::NamespacePath {
                host: None,
                namespace,
            },
        ) => set_once(target, CallTarget::Namespace(namespace), element)?,
        (
            Frame::Call {
                kind: MethodKind::Extrinsic,
                target,
                ..
            },
            Item::Path(path),
        ) => set_once(target, CallTarget::Object(path), element)?,
        (Frame::Call { params, .. }, Item::Param(param)) => params.push(param),

        (Frame::Response { error, .. }, Item::Error(e)) => set_once(error, e, element)?,
        (Frame::Response { returned, .. }, Item::Return(items)) => set_once(returned, items, element)?,
        (Frame::Response { params, .. }, Item::Param(param)) => params.push(param),

        (Frame::Param { content, .. }, Item::Raw(raw)) => set_once(content, Content::Raw(raw), element)?,
        (Frame::Param { content, .. }, Item::Path(path)) => {
            set_once(content, Content::Data(CimData::Path(path)), element)?
        }
        (Frame::Param { content, .. }, Item::Object(object)) => {
            set_once(content, Content::Data(object_data(object)), element)?
        }
        (Frame::Param { content, .. }, Item::QualifierType(decl)) => {
            set_once(content, Content::Data(CimData::QualifierType(decl)), element)?
        }

        (Frame::Return { contents, .. }, Item::Raw(raw)) => contents.push(Content::Raw(raw)),
        (Frame::Return { contents, .. }, Item::Path(path)) => {
            contents.push(Content::Data(CimData::Path(path)))
        }
        (Frame::Return { contents, .. }, Item::Object(object)) => {
            contents.push(Content::Data(object_data(object)))
        }
        (Frame::Return { contents, .. }, Item::QualifierType(decl)) => {
            contents.push(Content::Data(CimData::QualifierType(decl)))
        }
        (Frame::Return { contents, param_type, .. }, Item::Null) => {
            let data_type = param_type.clone().unwrap_or(DataType::scalar(TypeTag::String));
            contents.push(Content::Data(CimData::Value(Value::null(data_type))))
        }

        (Frame::Error(error), Item::Object(CimObject::Instance(instance))) => {
            error.instances.push(instance)
        }

        (Frame::NamespacePath { host, .. }, Item::Host(name)) => set_once(host, name, element)?,
        (
            Frame::NamespacePath { namespace, .. },
            Item::NamespacePath {
                host: None,
                namespace: local,
            },
        ) => *namespace = local,
        (Frame::NamespacePath { namespace, .. }, Item::Namespace(segment)) => namespace.push(segment),

        (Frame::Path(path), Item::NamespacePath { host, namespace }) => {
            path.host = host;
            path.namespace = namespace;
        }
        (Frame::Path(path), Item::Path(child)) => merge_path(path, child),
        (Frame::Path(path), Item::KeyBinding(binding)) => path.keys.push(binding),
        // Keyless forms: a lone KEYVALUE or VALUE.REFERENCE
        (Frame::Path(path), Item::KeyValue(value)) => path.keys.push(KeyBinding::new("", value)),
        (Frame::Path(path), Item::Raw(Raw::Reference(target))) => {
            path.keys.push(KeyBinding::new("", Value::reference(target)))
        }

        (Frame::KeyBinding { value, .. }, Item::KeyValue(v)) => set_once(value, v, element)?,
        (Frame::KeyBinding { value, .. }, Item::Raw(Raw::Reference(target))) => {
            set_once(value, Value::reference(target), element)?
        }

        (Frame::ValueArray(items), Item::Raw(Raw::Text(text))) => items.push(Some(text)),
        (Frame::ValueArray(items), Item::Null) => items.push(None),
        (Frame::RefArray(items), Item::Raw(Raw::Reference(path))) => items.push(Some(path)),
        (Frame::RefArray(items), Item::Null) => items.push(None),
        (Frame::Reference(slot), Item::Path(path)) => set_once(slot, path, element)?,

        (Frame::Wrapper { path, .. }, Item::Path(p)) => set_once(path, p, element)?,
        (Frame::Wrapper { object, .. }, Item::Object(o)) => set_once(object, o, element)?,

        (Frame::Class(class), Item::Qualifier(q)) => class.qualifiers.push(q),
        (Frame::Class(class), Item::Property(p)) => class.properties.push(p),
        (Frame::Class(class), Item::Method(m)) => class.methods.push(m),
        (Frame::Instance(instance), Item::Qualifier(q)) => instance.qualifiers.push(q),
        (Frame::Instance(instance), Item::Property(p)) => instance.properties.push(p),

        (Frame::Qualifier { raw, .. }, Item::Raw(r)) => set_once(raw, r, element)?,
        (Frame::QualifierDecl { decl, .. }, Item::Scope(scope)) => decl.scope = scope,
        (Frame::QualifierDecl { raw, .. }, Item::Raw(r)) => set_once(raw, r, element)?,

        (Frame::Property { property, .. }, Item::Qualifier(q)) => property.qualifiers.push(q),
        (Frame::Property { raw, .. }, Item::Raw(r)) => set_once(raw, r, element)?,

        (Frame::Method(method), Item::Qualifier(q)) => method.qualifiers.push(q),
        (Frame::Method(method), Item::Parameter(p)) => method.parameters.push(p),
        (Frame::Parameter(parameter), Item::Qualifier(q)) => parameter.qualifiers.push(q),

        (parent, item) => {
            return Err(CodecError::inconsistent(
                element,
                format!("{} cannot appear in {}", item.kind(), parent.kind()),
            ))
        }
    }
    Ok(())
}

/// An item with nothing beneath it must be a whole document
pub(crate) fn root(item: Item, element: &str) -> Result<Document> {
    match item {
        Item::Envelope(envelope) => Ok(Document::Envelope(envelope)),
        Item::Object(object) => Ok(Document::Object(object)),
        other => Err(CodecError::inconsistent(
            element,
            format!("{} has no enclosing element", other.kind()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::events::{Attribute, StartElement};

    fn start(name: &str, attributes: &[(&str, &str)]) -> StartElement {
        StartElement::new(
            name,
            attributes.iter().map(|(k, v)| Attribute::new(*k, *v)).collect(),
        )
    }

    #[test]
    fn test_embedded_attribute_values() {
        assert!(is_embedded(&start("PROPERTY", &[("EmbeddedObject", "object")])));
        assert!(is_embedded(&start("PROPERTY", &[("EMBEDDEDOBJECT", "Instance")])));
        assert!(!is_embedded(&start("PROPERTY", &[("EmbeddedObject", "yes")])));
        assert!(!is_embedded(&start("PROPERTY", &[("EmbeddedObject", "")])));
        assert!(!is_embedded(&start("PROPERTY", &[])));
    }

    #[test]
    fn test_method_kind_from_element() {
        assert_eq!(method_kind("IMETHODCALL"), MethodKind::Intrinsic);
        assert_eq!(method_kind("METHODRESPONSE"), MethodKind::Extrinsic);
        assert_eq!(method_kind("EXPMETHODRESPONSE"), MethodKind::Export);
    }

    #[test]
    fn test_flavor_attributes() {
        let f = flavor(&start(
            "QUALIFIER",
            &[("OVERRIDABLE", "false"), ("TOSUBCLASS", "true"), ("TRANSLATABLE", "TRUE")],
        ));
        assert!(f.disable_override && !f.overridable);
        assert!(f.to_subclass && !f.restricted);
        assert!(f.translatable);
        assert!(flavor(&start("QUALIFIER", &[])).is_empty());
    }

    #[test]
    fn test_open_property_array() {
        let frame = open(&start(
            "PROPERTY.ARRAY",
            &[("NAME", "Codes"), ("TYPE", "uint16"), ("ARRAYSIZE", "4")],
        ))
        .unwrap();
        match frame {
            Frame::Property { property, .. } => {
                assert_eq!(property.data_type().to_string(), "uint16[4]");
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn test_open_rejects_unknown_and_missing_name() {
        assert!(matches!(
            open(&start("BOGUS", &[])),
            Err(CodecError::InconsistentStructure { .. })
        ));
        assert!(matches!(
            open(&start("PROPERTY", &[("TYPE", "string")])),
            Err(CodecError::InconsistentStructure { .. })
        ));
        assert!(matches!(
            open(&start("PROPERTY.ARRAY", &[("NAME", "x"), ("ARRAYSIZE", "many")])),
            Err(CodecError::MalformedValue { .. })
        ));
    }

    #[test]
    fn test_type_raw_checks_shape() {
        let scalar = DataType::scalar(TypeTag::Uint8);
        assert!(type_raw(&scalar, Some(Raw::Array(vec![])), "PROPERTY").is_err());
        let array = DataType::array(TypeTag::Uint8);
        let value = type_raw(
            &array,
            Some(Raw::Array(vec![Some("1".into()), None, Some("0x10".into())])),
            "PROPERTY.ARRAY",
        )
        .unwrap();
        assert_eq!(
            value.as_array().unwrap(),
            &[Some(Scalar::Uint(1)), None, Some(Scalar::Uint(16))]
        );
        assert!(type_raw(&scalar, None, "PROPERTY").unwrap().is_null());
    }

    #[test]
    fn test_key_value_types() {
        assert_eq!(key_value("string", None, "abc").unwrap(), Value::string("abc"));
        assert_eq!(key_value("boolean", None, "TRUE").unwrap(), Value::boolean(true));
        assert_eq!(
            key_value("numeric", Some("uint16"), "7").unwrap(),
            Value::uint(TypeTag::Uint16, 7)
        );
        assert_eq!(
            key_value("numeric", None, "-7").unwrap(),
            Value::scalar(DataType::scalar(TypeTag::Numeric), Scalar::Sint(-7))
        );
        assert!(key_value("numeric", None, "x").is_err());
    }

    #[test]
    fn test_attach_is_decided_by_parent() {
        let mut class = Frame::Class(CimClass::new("X"));
        let property = Item::Property(Property::new("P", Value::string("v")));
        attach(&mut class, property, "PROPERTY").unwrap();

        let mut call = Frame::Call {
            name: "M".into(),
            kind: MethodKind::Intrinsic,
            target: None,
            params: Vec::new(),
        };
        let property = Item::Property(Property::new("P", Value::string("v")));
        let err = attach(&mut call, property, "PROPERTY").unwrap_err();
        assert!(matches!(err, CodecError::InconsistentStructure { ref element, .. } if element == "PROPERTY"));
    }

    #[test]
    fn test_merge_path_keeps_outer_namespace() {
        let mut path = ObjectPath::default();
        attach(
            &mut Frame::Path(ObjectPath::default()),
            Item::Host("h".into()),
            "HOST",
        )
        .unwrap_err();
        merge_path(&mut path, ObjectPath::class("CIM_Foo").with_namespace("root"));
        merge_path(&mut path, ObjectPath::instance("CIM_Foo", vec![KeyBinding::new("Id", Value::string("1"))]));
        assert_eq!(path.namespace, vec!["root"]);
        assert!(path.is_instance());
    }
}
