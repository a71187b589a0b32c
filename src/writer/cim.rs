//! CIM domain objects to element trees
//!
//! Element choice is canonical: every object maps to exactly one element
//! shape, picked so that the builder reads back an equal object.

use crate::codec::literal::format_literal;
use crate::error::{CodecError, Result};
use crate::model::{
    CallTarget, CimClass, CimData, CimError, CimInstance, CimObject, DataType, Envelope, Flavor,
    KeyBinding, MessageBody, Method, MethodCall, MethodKind, MethodResponse, ObjectPath, ParamValue,
    Parameter, Property, Qualifier, QualifierType, Reply, Scalar, TypeTag, Value, ValueData,
};

use super::tree::XmlElement;

/// `CIM` element for a whole message
pub fn envelope_element(envelope: &Envelope) -> Result<XmlElement> {
    let message = XmlElement::new("MESSAGE")
        .attr("ID", envelope.message_id.as_str())
        .attr("PROTOCOLVERSION", envelope.protocol_version.as_str())
        .child(body_element(&envelope.body)?);
    Ok(XmlElement::new("CIM")
        .attr("CIMVERSION", envelope.cim_version.as_str())
        .attr("DTDVERSION", envelope.dtd_version.as_str())
        .child(message))
}

fn body_element(body: &MessageBody) -> Result<XmlElement> {
    let element = match body {
        MessageBody::Request(call) => simple_request(call)?,
        MessageBody::Response(response) => simple_response(response)?,
        MessageBody::BatchRequest(calls) => {
            let export = calls.first().map_or(false, MethodCall::is_export);
            let name = if export { "MULTIEXPREQ" } else { "MULTIREQ" };
            let mut element = XmlElement::new(name);
            for call in calls {
                element.push(simple_request(call)?);
            }
            element
        }
        MessageBody::BatchResponse(responses) => {
            let export = responses.first().map_or(false, MethodResponse::is_export);
            let name = if export { "MULTIEXPRSP" } else { "MULTIRSP" };
            let mut element = XmlElement::new(name);
            for response in responses {
                element.push(simple_response(response)?);
            }
            element
        }
    };
    Ok(element)
}

fn simple_request(call: &MethodCall) -> Result<XmlElement> {
    let name = if call.is_export() { "SIMPLEEXPREQ" } else { "SIMPLEREQ" };
    Ok(XmlElement::new(name).child(call_element(call)?))
}

fn simple_response(response: &MethodResponse) -> Result<XmlElement> {
    let name = if response.is_export() { "SIMPLEEXPRSP" } else { "SIMPLERSP" };
    Ok(XmlElement::new(name).child(response_element(response)?))
}

fn call_element(call: &MethodCall) -> Result<XmlElement> {
    let (name, param) = match call.kind() {
        MethodKind::Intrinsic => ("IMETHODCALL", "IPARAMVALUE"),
        MethodKind::Extrinsic => ("METHODCALL", "PARAMVALUE"),
        MethodKind::Export => ("EXPMETHODCALL", "EXPPARAMVALUE"),
    };
    let mut element = XmlElement::new(name).attr("NAME", call.name.as_str());
    match &call.target {
        CallTarget::Namespace(namespace) => element.push(local_namespace(namespace)),
        CallTarget::Object(path) => element.push(path_element(path)?),
        CallTarget::Export => {}
    }
    for p in &call.params {
        element.push(param_element(param, p)?);
    }
    Ok(element)
}

fn response_element(response: &MethodResponse) -> Result<XmlElement> {
    let name = match response.kind {
        MethodKind::Intrinsic => "IMETHODRESPONSE",
        MethodKind::Extrinsic => "METHODRESPONSE",
        MethodKind::Export => "EXPMETHODRESPONSE",
    };
    let mut element = XmlElement::new(name).attr("NAME", response.name.as_str());
    match &response.reply {
        Reply::Error(error) => element.push(error_element(error)?),
        Reply::Success { returned, params } => {
            if let Some(items) = returned {
                element.push(return_element(response.kind, items)?);
            }
            for p in params {
                element.push(param_element("PARAMVALUE", p)?);
            }
        }
    }
    Ok(element)
}

fn error_element(error: &CimError) -> Result<XmlElement> {
    let mut element = XmlElement::new("ERROR")
        .attr("CODE", error.status.code().to_string())
        .attr_opt("DESCRIPTION", error.description.as_deref());
    for instance in &error.instances {
        element.push(instance_object(instance)?);
    }
    Ok(element)
}

/// `PARAMTYPE` and `EmbeddedObject` attributes for a value
fn typed_value_attrs(element: XmlElement, value: &Value) -> XmlElement {
    let data_type = &value.data_type;
    match data_type.tag {
        TypeTag::Object => element
            .attr("PARAMTYPE", "string")
            .attr("EmbeddedObject", embedded_kind(value)),
        tag => element.attr("PARAMTYPE", tag.wire_name()),
    }
}

fn embedded_kind(value: &Value) -> &'static str {
    let first = match &value.data {
        ValueData::Scalar(s) => Some(s),
        ValueData::Array(items) => items.iter().flatten().next(),
        ValueData::Null => None,
    };
    match first.and_then(Scalar::as_object) {
        Some(CimObject::Instance(_)) => "instance",
        _ => "object",
    }
}

fn param_element(name: &str, param: &ParamValue) -> Result<XmlElement> {
    let mut element = XmlElement::new(name).attr("NAME", param.name.as_str());
    match &param.value {
        None => {}
        Some(CimData::Value(value)) => {
            // Untyped IPARAMVALUE reads back as a string
            let plain_string = value.data_type.tag == TypeTag::String && !value.is_null();
            if name != "IPARAMVALUE" || !plain_string {
                element = typed_value_attrs(element, value);
            }
            if let Some(child) = value_element(value)? {
                element.push(child);
            }
        }
        Some(data) => element.push(data_element(data)?),
    }
    Ok(element)
}

fn return_element(kind: MethodKind, items: &[CimData]) -> Result<XmlElement> {
    let name = match kind {
        MethodKind::Extrinsic => "RETURNVALUE",
        MethodKind::Intrinsic | MethodKind::Export => "IRETURNVALUE",
    };
    let mut element = XmlElement::new(name);
    let mut values = items.iter().filter_map(CimData::as_value);
    let first_value = values.next();
    if let Some(value) = first_value {
        // One PARAMTYPE types every value in the list
        let tag = value.data_type.tag;
        if let Some(other) = values.find(|v| v.data_type.tag != tag) {
            return Err(CodecError::serialize(format!(
                "{} mixes {} and {} values",
                name,
                tag.wire_name(),
                other.data_type.tag.wire_name()
            )));
        }
        let plain_string = value.data_type.tag == TypeTag::String;
        if name == "RETURNVALUE" || !plain_string {
            element = typed_value_attrs(element, value);
        }
    }
    for item in items {
        match item {
            CimData::Value(value) => {
                element.push(value_element(value)?.unwrap_or_else(|| XmlElement::new("VALUE.NULL")))
            }
            data => element.push(data_element(data)?),
        }
    }
    Ok(element)
}

/// Non-value payloads of parameters and return values
fn data_element(data: &CimData) -> Result<XmlElement> {
    match data {
        CimData::Value(value) => value_element(value)?
            .ok_or_else(|| CodecError::serialize("null value has no element form")),
        CimData::Path(path) => path_element(path),
        CimData::Class(class) => class_object(class),
        CimData::Instance(instance) => instance_object(instance),
        CimData::QualifierType(decl) => qualifier_declaration(decl),
    }
}

/// `VALUE`, `VALUE.ARRAY`, `VALUE.REFERENCE` or `VALUE.REFARRAY`; `None` for null
fn value_element(value: &Value) -> Result<Option<XmlElement>> {
    let element = match &value.data {
        ValueData::Null => return Ok(None),
        ValueData::Scalar(scalar) => scalar_element(scalar)?,
        ValueData::Array(items) => {
            let references = value.data_type.is_reference()
                || items.iter().flatten().any(|s| matches!(s, Scalar::Reference(_)));
            let mut element = XmlElement::new(if references { "VALUE.REFARRAY" } else { "VALUE.ARRAY" });
            for item in items {
                element.push(match item {
                    Some(scalar) => scalar_element(scalar)?,
                    None => XmlElement::new("VALUE.NULL"),
                });
            }
            element
        }
    };
    Ok(Some(element))
}

fn scalar_element(scalar: &Scalar) -> Result<XmlElement> {
    Ok(match scalar {
        Scalar::Reference(path) => XmlElement::new("VALUE.REFERENCE").child(path_element(path)?),
        Scalar::Object(object) => XmlElement::new("VALUE").text(embedded_text(object)?),
        other => XmlElement::new("VALUE").text(format_literal(other)),
    })
}

/// Serialized form of an embedded object, carried as escaped string text
fn embedded_text(object: &CimObject) -> Result<String> {
    super::serialize_object(object)
}

fn local_namespace(namespace: &[String]) -> XmlElement {
    XmlElement::new("LOCALNAMESPACEPATH").children(
        namespace
            .iter()
            .map(|segment| XmlElement::new("NAMESPACE").attr("NAME", segment.as_str())),
    )
}

fn namespace_path(host: &str, namespace: &[String]) -> XmlElement {
    XmlElement::new("NAMESPACEPATH")
        .child(XmlElement::new("HOST").text(host))
        .child(local_namespace(namespace))
}

/// Path element picked by which parts of the path are present
pub fn path_element(path: &ObjectPath) -> Result<XmlElement> {
    if path.class_name.is_empty() {
        return Err(CodecError::serialize("object path without a class name"));
    }
    let keyed = !path.keys.is_empty();
    let name = if keyed {
        instance_name(path)?
    } else {
        XmlElement::new("CLASSNAME").attr("NAME", path.class_name.as_str())
    };
    let element = match (&path.host, path.namespace.is_empty(), keyed) {
        (Some(host), _, true) => XmlElement::new("INSTANCEPATH").child(namespace_path(host, &path.namespace)),
        (Some(host), _, false) => XmlElement::new("CLASSPATH").child(namespace_path(host, &path.namespace)),
        (None, false, true) => XmlElement::new("LOCALINSTANCEPATH").child(local_namespace(&path.namespace)),
        (None, false, false) => XmlElement::new("LOCALCLASSPATH").child(local_namespace(&path.namespace)),
        (None, true, _) => return Ok(name),
    };
    Ok(element.child(name))
}

fn instance_name(path: &ObjectPath) -> Result<XmlElement> {
    let element = XmlElement::new("INSTANCENAME").attr("CLASSNAME", path.class_name.as_str());
    match path.keys.as_slice() {
        [single] if single.name.is_empty() => Ok(element.child(key_value(&single.value)?)),
        keys => {
            let mut element = element;
            for key in keys {
                element.push(key_binding(key)?);
            }
            Ok(element)
        }
    }
}

fn key_binding(key: &KeyBinding) -> Result<XmlElement> {
    if key.name.is_empty() {
        return Err(CodecError::serialize("unnamed key binding beside other keys"));
    }
    Ok(XmlElement::new("KEYBINDING")
        .attr("NAME", key.name.as_str())
        .child(key_value(&key.value)?))
}

/// `KEYVALUE` or `VALUE.REFERENCE` for a key
fn key_value(value: &Value) -> Result<XmlElement> {
    let scalar = match &value.data {
        ValueData::Scalar(scalar) => scalar,
        ValueData::Null => return Err(CodecError::serialize("null key value")),
        ValueData::Array(_) => return Err(CodecError::serialize("array key value")),
    };
    let tag = value.data_type.tag;
    let value_type = match scalar {
        Scalar::Reference(path) => {
            return Ok(XmlElement::new("VALUE.REFERENCE").child(path_element(path)?));
        }
        Scalar::Object(_) => return Err(CodecError::serialize("embedded object as key value")),
        Scalar::Boolean(_) => "boolean",
        Scalar::Uint(_) | Scalar::Sint(_) | Scalar::Real32(_) | Scalar::Real64(_) => "numeric",
        Scalar::String(_) | Scalar::Char16(_) | Scalar::DateTime(_) => "string",
    };
    let element = XmlElement::new("KEYVALUE").attr("VALUETYPE", value_type);
    let element = if tag == TypeTag::Numeric {
        element
    } else {
        element.attr("TYPE", tag.wire_name())
    };
    Ok(element.text(format_literal(scalar)))
}

fn flavor_attrs(element: XmlElement, flavor: &Flavor) -> XmlElement {
    let element = if flavor.overridable {
        element.attr("OVERRIDABLE", "true")
    } else if flavor.disable_override {
        element.attr("OVERRIDABLE", "false")
    } else {
        element
    };
    let element = if flavor.to_subclass {
        element.attr("TOSUBCLASS", "true")
    } else if flavor.restricted {
        element.attr("TOSUBCLASS", "false")
    } else {
        element
    };
    element.flag("TRANSLATABLE", flavor.translatable)
}

fn qualifier_element(qualifier: &Qualifier) -> Result<XmlElement> {
    let element = XmlElement::new("QUALIFIER")
        .attr("NAME", qualifier.name.as_str())
        .attr("TYPE", qualifier.value.data_type.tag.wire_name())
        .flag("PROPAGATED", qualifier.propagated);
    let mut element = flavor_attrs(element, &qualifier.flavor);
    if let Some(value) = value_element(&qualifier.value)? {
        element.push(value);
    }
    Ok(element)
}

fn qualifier_declaration(decl: &QualifierType) -> Result<XmlElement> {
    let data_type = &decl.default.data_type;
    let mut element = XmlElement::new("QUALIFIER.DECLARATION")
        .attr("NAME", decl.name.as_str())
        .attr("TYPE", data_type.tag.wire_name())
        .flag("ISARRAY", data_type.is_array);
    if let Some(size) = data_type.array_size {
        element = element.attr("ARRAYSIZE", size.to_string());
    }
    let mut element = flavor_attrs(element, &decl.flavor);
    if !decl.scope.is_empty() {
        let mut scope = XmlElement::new("SCOPE");
        for (name, on) in decl.scope.flags() {
            scope = scope.flag(name, on);
        }
        element.push(scope);
    }
    if let Some(value) = value_element(&decl.default)? {
        element.push(value);
    }
    Ok(element)
}

fn type_attrs(element: XmlElement, data_type: &DataType) -> XmlElement {
    let element = if data_type.is_reference() {
        let class = Some(data_type.reference_class.as_str()).filter(|c| !c.is_empty());
        element.attr_opt("REFERENCECLASS", class)
    } else {
        element.attr("TYPE", data_type.tag.wire_name())
    };
    match data_type.array_size {
        Some(size) if data_type.is_array => element.attr("ARRAYSIZE", size.to_string()),
        _ => element,
    }
}

fn property_element(property: &Property) -> Result<XmlElement> {
    let data_type = property.data_type();
    let name = match (data_type.is_array, data_type.is_reference()) {
        (false, true) => "PROPERTY.REFERENCE",
        (true, _) => "PROPERTY.ARRAY",
        (false, false) => "PROPERTY",
    };
    let element = XmlElement::new(name).attr("NAME", property.name.as_str());
    let element = match data_type.tag {
        TypeTag::Object => {
            let element = element.attr("TYPE", "string");
            let element = match data_type.array_size {
                Some(size) => element.attr("ARRAYSIZE", size.to_string()),
                None => element,
            };
            element.attr("EmbeddedObject", embedded_kind(&property.value))
        }
        // Reference arrays have no element of their own
        TypeTag::Reference if data_type.is_array => {
            let element = element.attr("TYPE", "reference");
            match data_type.array_size {
                Some(size) => element.attr("ARRAYSIZE", size.to_string()),
                None => element,
            }
        }
        _ => type_attrs(element, data_type),
    };
    let mut element = element
        .attr_opt("CLASSORIGIN", property.class_origin.as_deref())
        .flag("PROPAGATED", property.propagated);
    for qualifier in &property.qualifiers {
        element.push(qualifier_element(qualifier)?);
    }
    if let Some(value) = value_element(&property.value)? {
        element.push(value);
    }
    Ok(element)
}

fn parameter_element(parameter: &Parameter) -> Result<XmlElement> {
    let data_type = &parameter.data_type;
    let name = match (data_type.is_reference(), data_type.is_array) {
        (false, false) => "PARAMETER",
        (false, true) => "PARAMETER.ARRAY",
        (true, false) => "PARAMETER.REFERENCE",
        (true, true) => "PARAMETER.REFARRAY",
    };
    let mut element = type_attrs(
        XmlElement::new(name).attr("NAME", parameter.name.as_str()),
        data_type,
    );
    for qualifier in &parameter.qualifiers {
        element.push(qualifier_element(qualifier)?);
    }
    Ok(element)
}

fn method_element(method: &Method) -> Result<XmlElement> {
    let mut element = XmlElement::new("METHOD")
        .attr("NAME", method.name.as_str())
        .attr("TYPE", method.return_type.tag.wire_name())
        .attr_opt("CLASSORIGIN", method.class_origin.as_deref())
        .flag("PROPAGATED", method.propagated);
    for qualifier in &method.qualifiers {
        element.push(qualifier_element(qualifier)?);
    }
    for parameter in &method.parameters {
        element.push(parameter_element(parameter)?);
    }
    Ok(element)
}

/// `CLASS` element, without its path
pub fn class_element(class: &CimClass) -> Result<XmlElement> {
    let mut element = XmlElement::new("CLASS")
        .attr("NAME", class.name())
        .attr_opt("SUPERCLASS", class.superclass.as_deref());
    for qualifier in &class.qualifiers {
        element.push(qualifier_element(qualifier)?);
    }
    for property in &class.properties {
        element.push(property_element(property)?);
    }
    for method in &class.methods {
        element.push(method_element(method)?);
    }
    Ok(element)
}

/// `INSTANCE` element, without its path
pub fn instance_element(instance: &CimInstance) -> Result<XmlElement> {
    let mut element = XmlElement::new("INSTANCE").attr("CLASSNAME", instance.class_name());
    for qualifier in &instance.qualifiers {
        element.push(qualifier_element(qualifier)?);
    }
    for property in &instance.properties {
        element.push(property_element(property)?);
    }
    Ok(element)
}

/// A class together with as much of its path as it carries
fn class_object(class: &CimClass) -> Result<XmlElement> {
    let path = &class.path;
    let element = class_element(class)?;
    if path.host.is_some() {
        Ok(XmlElement::new("VALUE.OBJECTWITHPATH")
            .child(path_element(path)?)
            .child(element))
    } else if !path.namespace.is_empty() {
        Ok(XmlElement::new("VALUE.OBJECTWITHLOCALPATH")
            .child(path_element(path)?)
            .child(element))
    } else {
        Ok(element)
    }
}

/// An instance together with as much of its path as it carries
fn instance_object(instance: &CimInstance) -> Result<XmlElement> {
    let path = &instance.path;
    let element = instance_element(instance)?;
    let wrapper = if path.host.is_some() {
        "VALUE.OBJECTWITHPATH"
    } else if !path.namespace.is_empty() {
        "VALUE.OBJECTWITHLOCALPATH"
    } else if !path.keys.is_empty() {
        "VALUE.NAMEDINSTANCE"
    } else {
        return Ok(element);
    };
    Ok(XmlElement::new(wrapper).child(path_element(path)?).child(element))
}

/// Canonical element for a class or instance
pub fn object_element(object: &CimObject) -> Result<XmlElement> {
    match object {
        CimObject::Class(class) => class_object(class),
        CimObject::Instance(instance) => instance_object(instance),
    }
}
