//! XML Event Types
//!
//! Owned event types for pull-parser style XML processing. Input arrives
//! from a stream, so events own their data rather than borrowing spans.

/// XML parsing event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Emitted once, before anything else
    StartDocument,
    /// Start of an element: <name attrs...>
    StartElement(StartElement),
    /// End of an element: </name>, also synthesized after <name/>
    EndElement(EndElement),
    /// Character data with references decoded (text or CDATA)
    Characters(String),
    /// End of document
    EndDocument,
}

/// A parsed XML attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Attribute value (entities decoded)
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Start element event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    pub name: String,
    /// Element attributes in document order
    pub attributes: Vec<Attribute>,
}

impl StartElement {
    pub fn new(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        StartElement {
            name: name.into(),
            attributes,
        }
    }

    /// Get an attribute value by name
    pub fn get_attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Get an attribute value by name, ignoring ASCII case
    pub fn get_attribute_value_ci(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }
}

/// End element event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndElement {
    pub name: String,
}

impl EndElement {
    pub fn new(name: impl Into<String>) -> Self {
        EndElement { name: name.into() }
    }
}

impl XmlEvent {
    /// Check if this is a start element event
    pub fn is_start_element(&self) -> bool {
        matches!(self, XmlEvent::StartElement(_))
    }

    /// Check if this is an end element event
    pub fn is_end_element(&self) -> bool {
        matches!(self, XmlEvent::EndElement(_))
    }

    /// Get as start element if applicable
    pub fn as_start_element(&self) -> Option<&StartElement> {
        match self {
            XmlEvent::StartElement(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if applicable
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlEvent::Characters(t) => Some(t),
            _ => None,
        }
    }

    /// Shorthand used by tests and hand-built event streams
    pub fn start(name: &str, attributes: &[(&str, &str)]) -> Self {
        XmlEvent::StartElement(StartElement::new(
            name,
            attributes
                .iter()
                .map(|(n, v)| Attribute::new(*n, *v))
                .collect(),
        ))
    }

    /// Shorthand for an end element event
    pub fn end(name: &str) -> Self {
        XmlEvent::EndElement(EndElement::new(name))
    }

    /// Shorthand for a text event
    pub fn text(text: &str) -> Self {
        XmlEvent::Characters(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_element_attributes() {
        let elem = StartElement::new(
            "PROPERTY",
            vec![Attribute::new("NAME", "Caption"), Attribute::new("TYPE", "string")],
        );
        assert_eq!(elem.get_attribute_value("TYPE"), Some("string"));
        assert_eq!(elem.get_attribute_value("type"), None);
        assert_eq!(elem.get_attribute_value_ci("type"), Some("string"));
    }

    #[test]
    fn test_shorthands() {
        let ev = XmlEvent::start("VALUE", &[]);
        assert!(ev.is_start_element());
        assert_eq!(ev.as_start_element().map(|e| e.name.as_str()), Some("VALUE"));
        assert!(XmlEvent::end("VALUE").is_end_element());
        assert_eq!(XmlEvent::text("x").as_text(), Some("x"));
    }
}
