//! Classes and instances

use super::feature::{Method, Property};
use super::path::ObjectPath;
use super::qualifier::Qualifier;

/// A class definition.
///
/// `path` carries the class name and, when known, the host and namespace the
/// class came from. Its keys are always empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CimClass {
    pub path: ObjectPath,
    pub superclass: Option<String>,
    pub qualifiers: Vec<Qualifier>,
    pub properties: Vec<Property>,
    pub methods: Vec<Method>,
}

impl CimClass {
    pub fn new(name: impl Into<String>) -> Self {
        CimClass {
            path: ObjectPath::class(name),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.path.class_name
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        find_property(&self.properties, name)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

/// An instance of a class.
///
/// Key bindings in `path` are not checked against the key properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CimInstance {
    pub path: ObjectPath,
    pub qualifiers: Vec<Qualifier>,
    pub properties: Vec<Property>,
}

impl CimInstance {
    pub fn new(class_name: impl Into<String>) -> Self {
        CimInstance {
            path: ObjectPath::class(class_name),
            ..Default::default()
        }
    }

    pub fn with_path(path: ObjectPath) -> Self {
        CimInstance {
            path,
            ..Default::default()
        }
    }

    pub fn class_name(&self) -> &str {
        &self.path.class_name
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        find_property(&self.properties, name)
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }
}

/// A class or instance, as carried by embedded object values
#[derive(Debug, Clone, PartialEq)]
pub enum CimObject {
    Class(CimClass),
    Instance(CimInstance),
}

impl CimObject {
    pub fn name(&self) -> &str {
        match self {
            CimObject::Class(c) => c.name(),
            CimObject::Instance(i) => i.class_name(),
        }
    }

    pub fn path(&self) -> &ObjectPath {
        match self {
            CimObject::Class(c) => &c.path,
            CimObject::Instance(i) => &i.path,
        }
    }
}

fn find_property<'a>(properties: &'a [Property], name: &str) -> Option<&'a Property> {
    properties.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    #[test]
    fn test_property_lookup_ignores_case() {
        let instance = CimInstance::new("CIM_Foo").with_property(Property::new("Name", Value::string("x")));
        assert!(instance.property("NAME").is_some());
        assert_eq!(CimObject::Instance(instance).name(), "CIM_Foo");
    }
}
