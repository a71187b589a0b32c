//! Generic element tree and its text form

use crate::core::entities::escape_into;
use crate::trace::{TraceSink, TraceStage};

use super::WriterOptions;

/// Child of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with ordered attributes and ordered children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn attr_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    /// Add `name="true"` when `on`
    pub fn flag(self, name: &str, on: bool) -> Self {
        if on {
            self.attr(name, "true")
        } else {
            self
        }
    }

    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = XmlElement>) -> Self {
        self.children.extend(children.into_iter().map(XmlNode::Element));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text-bearing elements are never indented internally
    pub fn has_text(&self) -> bool {
        self.children.iter().any(|c| matches!(c, XmlNode::Text(_)))
    }

    /// Child elements, skipping text
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }
}

fn indent(out: &mut String, options: &WriterOptions, depth: usize) {
    out.push('\n');
    out.extend(std::iter::repeat(' ').take(options.indent * depth));
}

/// Append `element` to `out`; returns the number of elements written
pub(crate) fn write_element(
    out: &mut String,
    element: &XmlElement,
    options: &WriterOptions,
    depth: usize,
    pretty: bool,
    trace: &mut dyn TraceSink,
) -> usize {
    if trace.enabled() {
        trace.record(TraceStage::Write, format_args!("<{}> depth {}", element.name, depth));
    }
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(out, value);
        out.push('"');
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return 1;
    }
    out.push('>');

    let block = pretty && !element.has_text();
    let mut written = 1;
    for child in &element.children {
        if block {
            indent(out, options, depth + 1);
        }
        match child {
            XmlNode::Element(e) => written += write_element(out, e, options, depth + 1, block, trace),
            XmlNode::Text(text) => escape_into(out, text),
        }
    }
    if block {
        indent(out, options, depth);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
    written
}
