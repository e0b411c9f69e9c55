//! Owned element tree built from `quick-xml` pull events.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::{MarkupNode, EDGE_TAG, NODE_TAG};
use crate::error::GraphError;

/// An element with its attributes and child elements. Text content is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag name as written, including any prefix.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<Element>,
}

impl Element {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Append a child element.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append several child elements.
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Children with the given tag name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Number of elements in this subtree with the given tag name.
    pub fn count_named(&self, name: &str) -> usize {
        let own = usize::from(self.name == name);
        own + self.children.iter().map(|c| c.count_named(name)).sum::<usize>()
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, GraphError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut element = Element::new(name);
        for attribute in start.attributes() {
            let attribute = attribute
                .map_err(|e| GraphError::malformed(format!("bad attribute on <{}>: {}", element.name, e)))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| GraphError::malformed(format!("bad value for attribute {}: {}", key, e)))?
                .into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }
}

impl MarkupNode for Element {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn child_nodes(&self) -> Vec<&Self> {
        self.children_named(NODE_TAG).collect()
    }

    fn edge_wrapper(&self) -> Option<&Self> {
        self.children_named(EDGE_TAG).next()
    }
}

/// Parse markup text into an element tree.
///
/// Fails on XML syntax errors, mismatched or unclosed tags, empty input,
/// and more than one top-level element.
pub fn parse_element_tree(xml: &str) -> Result<Element, GraphError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            GraphError::malformed(format!("XML error at byte {}: {}", reader.buffer_position(), e))
        })?;

        match event {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| GraphError::malformed("closing tag without matching opening tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(GraphError::malformed(format!("unclosed element <{}>", open.name)));
    }

    root.ok_or_else(|| GraphError::malformed("document contains no elements"))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), GraphError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(GraphError::malformed(format!(
            "second top-level element <{}>",
            element.name
        ))),
    }
}
