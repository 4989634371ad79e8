//! Intermediate tree representation of a markup fragment.
//!
//! A box captures structural shape only: ordered children, attribute sets,
//! scalar leaves, null, and tagged single-child / choice elements. Text,
//! escaping and formatting belong to the markup layer.
pub mod simple;
pub mod keyed;

use std::borrow::Cow;
use indexmap::IndexMap;
use serde::Serialize;

pub use simple::SimpleBox;
pub use keyed::KeyedBox;

/// Attribute set shared by keyed and single-element boxes.
///
/// Names are unique; the first write for a name wins.
pub type Attributes = IndexMap<String, SimpleBox>;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum XmlBox {
    /// Explicit empty / nil value.
    Null,
    Simple(SimpleBox),
    Keyed(KeyedBox),
    /// Untagged ordered items; the enclosing key (if any) names each one.
    Unkeyed(Vec<XmlBox>),
    SingleElement(SingleElementBox),
    Choice(ChoiceBox),
}

/// Exactly one (name, child, attributes) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleElementBox {
    pub key: String,
    pub element: Box<XmlBox>,
    pub attributes: Attributes,
}

/// "This value is the alternative named `key`, with payload `element`."
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceBox {
    pub key: String,
    pub element: Box<XmlBox>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl XmlBox {
    pub fn is_null(&self) -> bool {
        matches!(self, XmlBox::Null)
    }

    /// Textual rendering of a scalar leaf; `None` for null and containers.
    pub fn xml_string(&self) -> Option<Cow<'_, str>> {
        match self {
            XmlBox::Simple(simple) => Some(simple.xml_string()),
            _ => None,
        }
    }

    pub fn as_keyed(&self) -> Option<&KeyedBox> {
        match self {
            XmlBox::Keyed(keyed) => Some(keyed),
            _ => None,
        }
    }

    pub fn as_unkeyed(&self) -> Option<&[XmlBox]> {
        match self {
            XmlBox::Unkeyed(items) => Some(items),
            _ => None,
        }
    }

    /// Short shape name used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            XmlBox::Null => "null",
            XmlBox::Simple(_) => "a simple value",
            XmlBox::Keyed(_) => "a keyed element",
            XmlBox::Unkeyed(_) => "an unkeyed sequence",
            XmlBox::SingleElement(_) => "a single-element container",
            XmlBox::Choice(_) => "a choice element",
        }
    }
}

impl From<SimpleBox> for XmlBox {
    fn from(simple: SimpleBox) -> Self {
        XmlBox::Simple(simple)
    }
}

impl From<KeyedBox> for XmlBox {
    fn from(keyed: KeyedBox) -> Self {
        XmlBox::Keyed(keyed)
    }
}

impl SingleElementBox {
    pub fn new(key: impl Into<String>, element: XmlBox) -> Self {
        SingleElementBox { key: key.into(), element: Box::new(element), attributes: Attributes::new() }
    }
}

impl ChoiceBox {
    pub fn new(key: impl Into<String>, element: XmlBox) -> Self {
        ChoiceBox { key: key.into(), element: Box::new(element) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_null_is_null() {
        assert!(XmlBox::Null.is_null());
        assert!(!XmlBox::Keyed(KeyedBox::new()).is_null());
        assert!(!XmlBox::Unkeyed(Vec::new()).is_null());
        assert!(!XmlBox::Simple(SimpleBox::from("")).is_null());
    }

    #[test]
    fn xml_string_is_scalar_only() {
        assert_eq!(XmlBox::Simple(SimpleBox::Int(-4)).xml_string().as_deref(), Some("-4"));
        assert_eq!(XmlBox::Null.xml_string(), None);
        let choice = XmlBox::Choice(ChoiceBox::new("int", XmlBox::Simple(SimpleBox::Int(1))));
        assert_eq!(choice.xml_string(), None);
    }
}
