//! Properties, methods and parameters

use super::qualifier::Qualifier;
use super::types::DataType;
use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    /// Value and its declared type (reference class and array size included)
    pub value: Value,
    pub class_origin: Option<String>,
    pub propagated: bool,
    pub qualifiers: Vec<Qualifier>,
}

impl Property {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Property {
            name: name.into(),
            value,
            class_origin: None,
            propagated: false,
            qualifiers: Vec::new(),
        }
    }

    pub fn data_type(&self) -> &DataType {
        &self.value.data_type
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }
}

/// A method parameter (no value)
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub data_type: DataType,
    pub qualifiers: Vec<Qualifier>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Parameter {
            name: name.into(),
            data_type,
            qualifiers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub return_type: DataType,
    pub class_origin: Option<String>,
    pub propagated: bool,
    pub qualifiers: Vec<Qualifier>,
    pub parameters: Vec<Parameter>,
}

impl Method {
    pub fn new(name: impl Into<String>, return_type: DataType) -> Self {
        Method {
            name: name.into(),
            return_type,
            class_origin: None,
            propagated: false,
            qualifiers: Vec::new(),
            parameters: Vec::new(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}
