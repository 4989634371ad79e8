//! Plain element tree between markup text and boxes.
//!
//! Parsing goes through `roxmltree`; writing is a compact serializer with
//! no formatting options.
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::boxes::{KeyedBox, SimpleBox, XmlBox};
use crate::error::{CodingPath, Error, Result};
use crate::placement::VALUE_KEY;

static XML_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}_:][\p{L}\p{N}_.:\-]*$").expect("XML name pattern compiles")
});

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Content>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Element(Element),
}

// ————————————————————————————————————————————————————————————————————————————
// PARSING
// ————————————————————————————————————————————————————————————————————————————

/// Parse markup into its root element. Whitespace-only text is dropped and
/// other text is trimmed.
pub fn parse(markup: &str) -> Result<Element> {
    let document = roxmltree::Document::parse(markup)?;
    Ok(element_of(document.root_element()))
}

/// Parse markup straight into the box tree of its root element.
pub fn parse_box(markup: &str) -> Result<XmlBox> {
    Ok(parse(markup)?.to_box())
}

fn element_of(node: roxmltree::Node<'_, '_>) -> Element {
    let mut element = Element::new(node.tag_name().name());
    for attribute in node.attributes() {
        // `xml:lang` and `lang` share a local name; the first one kept
        element.attributes.entry(attribute.name().to_owned()).or_insert_with(|| attribute.value().to_owned());
    }
    for child in node.children() {
        if child.is_element() {
            element.children.push(Content::Element(element_of(child)));
        } else if child.is_text() {
            let text = child.text().unwrap_or_default().trim();
            if !text.is_empty() {
                element.children.push(Content::Text(text.to_owned()));
            }
        }
    }
    element
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element { name: name.into(), attributes: IndexMap::new(), children: Vec::new() }
    }

    /// Box tree of this element's content: Null when empty, Simple when
    /// text-only, otherwise Keyed with any text under `$value`.
    pub fn to_box(&self) -> XmlBox {
        if self.attributes.is_empty() {
            if self.children.is_empty() {
                return XmlBox::Null;
            }
            if let Some(text) = self.text_only() {
                return XmlBox::Simple(SimpleBox::Str(text));
            }
        }
        let mut keyed = KeyedBox::new();
        for (name, value) in &self.attributes {
            keyed.insert_attribute(name.clone(), SimpleBox::from(value.as_str()));
        }
        for child in &self.children {
            match child {
                Content::Text(text) => keyed.push_element(VALUE_KEY, XmlBox::Simple(SimpleBox::from(text.as_str()))),
                Content::Element(element) => keyed.push_element(element.name.clone(), element.to_box()),
            }
        }
        XmlBox::Keyed(keyed)
    }

    fn text_only(&self) -> Option<String> {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Content::Text(text) => out.push_str(text),
                Content::Element(_) => return None,
            }
        }
        Some(out)
    }

    /// Render `value` as the content of an element named `name`.
    pub fn from_box(name: &str, value: &XmlBox) -> Result<Element> {
        render(name, value, &CodingPath::root())
    }

    /// Compact markup, no declaration.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_into(out, value, true);
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Content::Text(text) => escape_into(out, text, false),
                Content::Element(element) => element.write(out),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn check_name(name: &str, path: &CodingPath) -> Result<()> {
    if XML_NAME.is_match(name) {
        return Ok(());
    }
    Err(Error::invalid_value(path, format!("`{name}` is not a valid XML name")))
}

fn render(name: &str, value: &XmlBox, path: &CodingPath) -> Result<Element> {
    check_name(name, path)?;
    let mut element = Element::new(name);
    match value {
        XmlBox::Null => {}
        XmlBox::Simple(simple) => element.children.push(Content::Text(simple.xml_string().into_owned())),
        XmlBox::Keyed(keyed) => {
            write_attributes(&mut element, keyed.attributes.iter(), path)?;
            for (key, child) in &keyed.elements {
                append(&mut element, key, child, &path.child_key(key.as_str()))?;
            }
        }
        // items carry no names of their own; they repeat the enclosing one
        XmlBox::Unkeyed(items) => {
            for (index, item) in items.iter().enumerate() {
                element.children.push(Content::Element(render(name, item, &path.child_index(index))?));
            }
        }
        XmlBox::SingleElement(single) => {
            write_attributes(&mut element, single.attributes.iter(), path)?;
            append(&mut element, &single.key, &single.element, &path.child_key(single.key.as_str()))?;
        }
        XmlBox::Choice(choice) => {
            append(&mut element, &choice.key, &choice.element, &path.child_key(choice.key.as_str()))?;
        }
    }
    Ok(element)
}

fn write_attributes<'a>(
    element: &mut Element,
    attributes: impl Iterator<Item = (&'a String, &'a SimpleBox)>,
    path: &CodingPath,
) -> Result<()> {
    for (name, value) in attributes {
        check_name(name, path)?;
        element.attributes.insert(name.clone(), value.xml_string().into_owned());
    }
    Ok(())
}

/// Attach the child stored under `key`. An unkeyed child repeats `key`;
/// `$value` content is spliced into the parent.
fn append(parent: &mut Element, key: &str, child: &XmlBox, path: &CodingPath) -> Result<()> {
    if key == VALUE_KEY {
        return splice(parent, child, path);
    }
    match child {
        XmlBox::Unkeyed(items) => {
            for (index, item) in items.iter().enumerate() {
                parent.children.push(Content::Element(render(key, item, &path.child_index(index))?));
            }
        }
        other => parent.children.push(Content::Element(render(key, other, path)?)),
    }
    Ok(())
}

fn splice(parent: &mut Element, content: &XmlBox, path: &CodingPath) -> Result<()> {
    match content {
        XmlBox::Null => {}
        XmlBox::Simple(simple) => parent.children.push(Content::Text(simple.xml_string().into_owned())),
        XmlBox::Unkeyed(items) => {
            for (index, item) in items.iter().enumerate() {
                splice(parent, item, &path.child_index(index))?;
            }
        }
        other => {
            let Element { attributes, children, .. } = render(&parent.name, other, path)?;
            for (name, value) in attributes {
                parent.attributes.entry(name).or_insert(value);
            }
            parent.children.extend(children);
        }
    }
    Ok(())
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}
