//! Qualifiers and qualifier declarations

use super::types::DataType;
use super::value::Value;

/// Flavor markers of a qualifier
///
/// Each marker is present or absent on its own. `OVERRIDABLE="false"` on the
/// wire sets `disable_override`, `TOSUBCLASS="false"` sets `restricted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Flavor {
    pub overridable: bool,
    pub disable_override: bool,
    pub to_subclass: bool,
    pub restricted: bool,
    pub translatable: bool,
}

impl Flavor {
    /// The DSP0201 defaults: overridable, to subclass
    pub fn protocol_default() -> Self {
        Flavor {
            overridable: true,
            to_subclass: true,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Flavor::default()
    }
}

/// Element kinds a qualifier declaration applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Scope {
    pub class: bool,
    pub association: bool,
    pub reference: bool,
    pub property: bool,
    pub method: bool,
    pub parameter: bool,
    pub indication: bool,
}

impl Scope {
    pub fn any() -> Self {
        Scope {
            class: true,
            association: true,
            reference: true,
            property: true,
            method: true,
            parameter: true,
            indication: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Scope::default()
    }

    /// Wire attribute names paired with their flag
    pub fn flags(&self) -> [(&'static str, bool); 7] {
        [
            ("CLASS", self.class),
            ("ASSOCIATION", self.association),
            ("REFERENCE", self.reference),
            ("PROPERTY", self.property),
            ("METHOD", self.method),
            ("PARAMETER", self.parameter),
            ("INDICATION", self.indication),
        ]
    }

    /// Set the flag for a wire attribute name; unknown names are ignored
    pub fn set(&mut self, name: &str, on: bool) -> bool {
        let slot = match name {
            "CLASS" => &mut self.class,
            "ASSOCIATION" => &mut self.association,
            "REFERENCE" => &mut self.reference,
            "PROPERTY" => &mut self.property,
            "METHOD" => &mut self.method,
            "PARAMETER" => &mut self.parameter,
            "INDICATION" => &mut self.indication,
            _ => return false,
        };
        *slot = on;
        true
    }
}

/// A qualifier attached to a class, property, method or parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Qualifier {
    pub name: String,
    pub value: Value,
    pub propagated: bool,
    pub flavor: Flavor,
}

impl Qualifier {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Qualifier {
            name: name.into(),
            value,
            propagated: false,
            flavor: Flavor::default(),
        }
    }

    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn data_type(&self) -> &DataType {
        &self.value.data_type
    }
}

/// Declaration of a qualifier (`QUALIFIER.DECLARATION`)
#[derive(Debug, Clone, PartialEq)]
pub struct QualifierType {
    pub name: String,
    /// Default value; a null payload when none is declared
    pub default: Value,
    pub scope: Scope,
    pub flavor: Flavor,
}

impl QualifierType {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        QualifierType {
            name: name.into(),
            default: Value::null(data_type),
            scope: Scope::default(),
            flavor: Flavor::default(),
        }
    }

    pub fn data_type(&self) -> &DataType {
        &self.default.data_type
    }
}

/// Find a qualifier by name, ignoring case
pub fn find_qualifier<'a>(qualifiers: &'a [Qualifier], name: &str) -> Option<&'a Qualifier> {
    qualifiers.iter().find(|q| q.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeTag;

    #[test]
    fn test_scope_set_by_wire_name() {
        let mut scope = Scope::default();
        assert!(scope.set("PROPERTY", true));
        assert!(!scope.set("BOGUS", true));
        assert!(scope.property);
        assert_eq!(scope.flags().iter().filter(|(_, on)| *on).count(), 1);
        assert!(!Scope::any().is_empty());
    }

    #[test]
    fn test_find_qualifier_ignores_case() {
        let qualifiers = vec![Qualifier::new("Key", Value::boolean(true))];
        assert!(find_qualifier(&qualifiers, "KEY").is_some());
        assert!(find_qualifier(&qualifiers, "Description").is_none());
    }

    #[test]
    fn test_declaration_defaults_to_null() {
        let decl = QualifierType::new("Description", DataType::scalar(TypeTag::String));
        assert!(decl.default.is_null());
        assert_eq!(decl.data_type().tag, TypeTag::String);
        assert!(Flavor::default().is_empty());
        assert!(!Flavor::protocol_default().is_empty());
    }
}
