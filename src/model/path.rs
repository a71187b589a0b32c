//! Object paths: host, namespace, class and key bindings
//!
//! The literal form is `[//host/]ns1/ns2:Class[.key=value,...]`. Key values
//! are either `"quoted"` (backslash escapes) strings, `true`/`false`, or
//! numeric literals.

use std::fmt;
use std::str::FromStr;

use super::types::{DataType, TypeTag};
use super::value::{Scalar, Value, ValueData};
use crate::codec::literal::{format_literal, parse_literal};
use crate::error::CodecError;

/// A named key value on an instance path
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBinding {
    pub name: String,
    pub value: Value,
}

impl KeyBinding {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        KeyBinding {
            name: name.into(),
            value,
        }
    }
}

/// Address of a class (no keys) or an instance (keys)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectPath {
    pub host: Option<String>,
    /// Namespace segments, e.g. `["root", "cimv2"]`
    pub namespace: Vec<String>,
    pub class_name: String,
    pub keys: Vec<KeyBinding>,
}

impl ObjectPath {
    /// Path of a class
    pub fn class(class_name: impl Into<String>) -> Self {
        ObjectPath {
            class_name: class_name.into(),
            ..Default::default()
        }
    }

    /// Path of an instance
    pub fn instance(class_name: impl Into<String>, keys: Vec<KeyBinding>) -> Self {
        ObjectPath {
            class_name: class_name.into(),
            keys,
            ..Default::default()
        }
    }

    /// Set the namespace from `a/b/c` form
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = split_namespace(namespace);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_key(mut self, name: impl Into<String>, value: Value) -> Self {
        self.keys.push(KeyBinding::new(name, value));
        self
    }

    /// Namespace in `a/b/c` form
    pub fn namespace_str(&self) -> String {
        self.namespace.join("/")
    }

    pub fn is_instance(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn is_class(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key(&self, name: &str) -> Option<&Value> {
        self.keys
            .iter()
            .find(|k| k.name.eq_ignore_ascii_case(name))
            .map(|k| &k.value)
    }

    /// The same path without host and namespace
    pub fn local(&self) -> ObjectPath {
        ObjectPath {
            host: None,
            namespace: Vec::new(),
            ..self.clone()
        }
    }
}

/// Split `a/b/c` into segments, dropping empty ones
pub fn split_namespace(namespace: &str) -> Vec<String> {
    namespace
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn path_error(literal: &str, reason: impl Into<String>) -> CodecError {
    CodecError::malformed_value("reference", literal, reason)
}

impl FromStr for ObjectPath {
    type Err = CodecError;

    fn from_str(literal: &str) -> Result<Self, Self::Err> {
        let mut rest = literal.trim();
        let mut path = ObjectPath::default();

        if let Some(after) = rest.strip_prefix("//") {
            let (host, tail) = after.split_once('/').unwrap_or((after, ""));
            if host.is_empty() {
                return Err(path_error(literal, "empty host"));
            }
            path.host = Some(host.to_string());
            rest = tail;
        }

        let (head, keys) = match rest.find('.') {
            Some(i) => (&rest[..i], Some(&rest[i + 1..])),
            None => (rest, None),
        };
        let class = match head.rfind(':') {
            Some(i) => {
                path.namespace = split_namespace(&head[..i]);
                &head[i + 1..]
            }
            None => head,
        };
        if class.is_empty() {
            return Err(path_error(literal, "missing class name"));
        }
        path.class_name = class.to_string();

        if let Some(keys) = keys {
            path.keys = parse_keys(literal, keys)?;
            if path.keys.is_empty() {
                return Err(path_error(literal, "'.' without key bindings"));
            }
        }
        Ok(path)
    }
}

/// Parse `k1=v1,k2="v,2"`
fn parse_keys(literal: &str, input: &str) -> Result<Vec<KeyBinding>, CodecError> {
    let mut keys = Vec::new();
    let mut chars = input.char_indices().peekable();

    while chars.peek().is_some() {
        let mut name = String::new();
        for (_, c) in chars.by_ref() {
            if c == '=' {
                break;
            }
            name.push(c);
        }
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(path_error(literal, "key binding without a name"));
        }

        let value = if matches!(chars.peek(), Some((_, '"'))) {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            while let Some((_, c)) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some((_, escaped)) => text.push(escaped),
                        None => break,
                    },
                    '"' => {
                        closed = true;
                        break;
                    }
                    c => text.push(c),
                }
            }
            if !closed {
                return Err(path_error(literal, format!("unterminated string for key {}", name)));
            }
            Value::string(text)
        } else {
            let mut text = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if c == ',' {
                    break;
                }
                text.push(c);
                chars.next();
            }
            let text = text.trim();
            if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false") {
                Value::boolean(text.eq_ignore_ascii_case("true"))
            } else {
                let scalar = parse_literal(TypeTag::Numeric.wire_name(), text)
                    .map_err(|_| path_error(literal, format!("bad value for key {}", name)))?;
                Value::scalar(DataType::scalar(TypeTag::Numeric), scalar)
            }
        };
        keys.push(KeyBinding::new(name, value));

        match chars.next() {
            None => break,
            Some((_, ',')) => {}
            Some((i, c)) => {
                return Err(path_error(literal, format!("unexpected {:?} at offset {}", c, i)));
            }
        }
    }
    Ok(keys)
}

/// Key value in literal form
fn write_key_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    let scalar = match &value.data {
        ValueData::Scalar(s) => s,
        _ => return f.write_str("\"\""),
    };
    match scalar {
        Scalar::Boolean(b) => write!(f, "{}", b),
        Scalar::Uint(_) | Scalar::Sint(_) | Scalar::Real32(_) | Scalar::Real64(_) => {
            f.write_str(&format_literal(scalar))
        }
        other => {
            f.write_str("\"")?;
            for c in format_literal(other).chars() {
                if c == '"' || c == '\\' {
                    f.write_str("\\")?;
                }
                write!(f, "{}", c)?;
            }
            f.write_str("\"")
        }
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(host) = &self.host {
            write!(f, "//{}/", host)?;
        }
        if !self.namespace.is_empty() || self.host.is_some() {
            write!(f, "{}:", self.namespace.join("/"))?;
        }
        f.write_str(&self.class_name)?;
        for (i, key) in self.keys.iter().enumerate() {
            f.write_str(if i == 0 { "." } else { "," })?;
            write!(f, "{}=", key.name)?;
            write_key_value(f, &key.value)?;
        }
        Ok(())
    }
}
