use std::borrow::Cow;

use crate::boxes::{SimpleBox, XmlBox};
use crate::error::{Error, Result};
use crate::placement::VALUE_KEY;
use super::DecodeContext;
use super::keyed::KeyedView;

/// Content of an element that has none.
pub(crate) static NULL: XmlBox = XmlBox::Null;

/// Read-only view of the part of the tree a decode step is looking at.
///
/// Keys carried by `Mixed`, `Named` and `Choice` are already in field form.
#[derive(Debug, Clone)]
pub(crate) enum Node<'de> {
    Box(&'de XmlBox),
    /// An attribute value.
    Scalar(&'de SimpleBox),
    /// Map keys and variant names.
    Text(Cow<'de, str>),
    /// Every element matching one field name, in document order.
    Candidates(Vec<&'de XmlBox>),
    /// Named children in document order.
    Mixed(Vec<(Cow<'de, str>, &'de XmlBox)>),
    /// Sequence item that remembers its element name. An enum whose
    /// variants include the name resolves against it, anything else sees
    /// the element.
    Named { key: Cow<'de, str>, element: &'de XmlBox },
    /// Item re-wrapped as the alternative named `key`.
    Choice { key: Cow<'de, str>, element: &'de XmlBox },
    Absent,
}

impl<'de> Node<'de> {
    pub fn shape(&self) -> String {
        match self {
            Node::Box(value) => value.shape().to_owned(),
            Node::Scalar(_) => "an attribute value".to_owned(),
            Node::Text(_) => "a name".to_owned(),
            Node::Candidates(items) => format!("{} repeated elements", items.len()),
            Node::Mixed(_) => "mixed content".to_owned(),
            Node::Named { element, .. } => element.shape().to_owned(),
            Node::Choice { key, .. } => format!("the alternative `{key}`"),
            Node::Absent => "nothing".to_owned(),
        }
    }

    /// Absent, or one empty element.
    pub fn is_nil(&self) -> bool {
        match self {
            Node::Absent => true,
            Node::Box(value) => value.is_null(),
            Node::Candidates(items) => items.is_empty() || (items.len() == 1 && items[0].is_null()),
            Node::Named { element, .. } => element.is_null(),
            Node::Mixed(entries) => entries.is_empty(),
            Node::Scalar(_) | Node::Text(_) | Node::Choice { .. } => false,
        }
    }

    /// Collapse what stands for at most one value: a run of one element,
    /// a named item, a length-1 unkeyed wrapper.
    pub fn settle(self) -> Node<'de> {
        match self {
            Node::Candidates(items) => match items.len() {
                0 => Node::Absent,
                1 => Node::Box(items[0]).settle(),
                _ => Node::Candidates(items),
            },
            Node::Named { element, .. } => Node::Box(element).settle(),
            Node::Box(XmlBox::Unkeyed(items)) if items.len() == 1 => Node::Box(&items[0]).settle(),
            other => other,
        }
    }

    /// Textual content of a scalar-like node.
    pub fn text(self, ctx: &DecodeContext<'_>) -> Result<Cow<'de, str>> {
        match self.settle() {
            Node::Box(XmlBox::Simple(simple)) => Ok(simple.xml_string()),
            Node::Scalar(simple) => Ok(simple.xml_string()),
            Node::Box(XmlBox::Null) => Ok(Cow::Borrowed("")),
            Node::Box(XmlBox::Keyed(keyed)) if keyed.elements.is_empty() => Ok(Cow::Borrowed("")),
            Node::Box(XmlBox::Keyed(keyed))
                if keyed.elements.len() == 1 && keyed.elements[0].0 == VALUE_KEY =>
            {
                Node::Box(&keyed.elements[0].1).text(ctx)
            }
            Node::Text(text) => Ok(text),
            Node::Absent => Err(Error::key_not_found(&ctx.path, ctx.path.last_key().unwrap_or_default())),
            other => Err(Error::type_mismatch(&ctx.path, "a simple value", other.shape())),
        }
    }

    /// Items of the node read as a sequence.
    pub fn items(self, ctx: &DecodeContext<'_>) -> Vec<Node<'de>> {
        match self {
            Node::Absent => Vec::new(),
            Node::Box(value) => box_items(value, ctx),
            Node::Scalar(_) | Node::Text(_) => vec![self],
            Node::Candidates(items) => {
                // one unkeyed child under the key is the sequence itself
                if items.len() == 1 {
                    if let XmlBox::Unkeyed(inner) = items[0] {
                        return inner.iter().map(Node::Box).collect();
                    }
                }
                items.into_iter().map(Node::Box).collect()
            }
            Node::Mixed(entries) => entries
                .into_iter()
                .map(|(key, element)| Node::Named { key, element })
                .collect(),
            Node::Named { element, .. } => box_items(element, ctx),
            Node::Choice { key, element } => vec![Node::Named { key, element }],
        }
    }

    /// Named alternatives the node offers, in document order. `names` are
    /// the alternatives the caller knows; a named item whose own name is
    /// among them is that alternative.
    pub fn alternatives(self, ctx: &DecodeContext<'_>, names: &[&str]) -> Result<Vec<(Cow<'de, str>, Node<'de>)>> {
        match self {
            Node::Named { key, element } => {
                if names.iter().any(|name| key == *name) {
                    Ok(vec![(key, Node::Box(element))])
                } else {
                    Node::Box(element).alternatives(ctx, names)
                }
            }
            Node::Choice { key, element } => Ok(vec![(key, Node::Box(element))]),
            Node::Scalar(simple) => Ok(vec![(simple.xml_string(), Node::Absent)]),
            Node::Text(text) => Ok(vec![(text, Node::Absent)]),
            Node::Absent => Ok(Vec::new()),
            Node::Mixed(entries) => Ok(group(entries.into_iter())),
            Node::Candidates(items) if items.len() > 1 => Err(Error::type_mismatch(
                &ctx.path,
                "one element holding an alternative",
                format!("{} repeated elements", items.len()),
            )),
            Node::Candidates(items) => match items.into_iter().next() {
                Some(first) => Node::Box(first).alternatives(ctx, names),
                None => Ok(Vec::new()),
            },
            Node::Box(value) => match value {
                XmlBox::Null => Ok(Vec::new()),
                XmlBox::Simple(simple) => Ok(vec![(simple.xml_string(), Node::Absent)]),
                XmlBox::SingleElement(single) => {
                    Ok(vec![(ctx.convert_key(&single.key), Node::Box(&single.element))])
                }
                XmlBox::Choice(choice) => Ok(vec![(ctx.convert_key(&choice.key), Node::Box(&choice.element))]),
                XmlBox::Keyed(_) => {
                    let view = KeyedView::of(Node::Box(value), ctx)?;
                    Ok(group(view.elements.into_iter()))
                }
                XmlBox::Unkeyed(items) if items.len() == 1 => Node::Box(&items[0]).alternatives(ctx, names),
                XmlBox::Unkeyed(_) => {
                    Err(Error::type_mismatch(&ctx.path, "one element holding an alternative", value.shape()))
                }
            },
        }
    }
}

fn box_items<'de>(value: &'de XmlBox, ctx: &DecodeContext<'_>) -> Vec<Node<'de>> {
    match value {
        XmlBox::Null => Vec::new(),
        XmlBox::Simple(_) => vec![Node::Box(value)],
        XmlBox::Unkeyed(items) => items.iter().map(Node::Box).collect(),
        XmlBox::Keyed(keyed) => keyed
            .elements
            .iter()
            .map(|(key, element)| Node::Named { key: ctx.convert_key(key), element })
            .collect(),
        XmlBox::SingleElement(single) => {
            vec![Node::Named { key: ctx.convert_key(&single.key), element: &single.element }]
        }
        XmlBox::Choice(choice) => vec![Node::Named { key: ctx.convert_key(&choice.key), element: &choice.element }],
    }
}

/// Same-named entries gathered under their first occurrence.
pub(crate) fn group<'de>(
    entries: impl Iterator<Item = (Cow<'de, str>, &'de XmlBox)>,
) -> Vec<(Cow<'de, str>, Node<'de>)> {
    let mut groups: Vec<(Cow<'de, str>, Vec<&'de XmlBox>)> = Vec::new();
    for (key, element) in entries {
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, items)) => items.push(element),
            None => groups.push((key, vec![element])),
        }
    }
    groups.into_iter().map(|(key, items)| (key, Node::Candidates(items))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::KeyedBox;
    use crate::options::DecoderOptions;

    fn text(value: &str) -> XmlBox {
        XmlBox::Simple(SimpleBox::from(value))
    }

    #[test]
    fn settle_drills_through_single_wrappers() {
        let wrapped = XmlBox::Unkeyed(vec![text("7")]);
        let options = DecoderOptions::default();
        let ctx = DecodeContext::root(&options);
        let node = Node::Candidates(vec![&wrapped]);
        assert_eq!(node.text(&ctx).unwrap(), "7");
    }

    #[test]
    fn lone_unkeyed_candidate_is_the_sequence() {
        let wrapped = XmlBox::Unkeyed(vec![text("a"), text("b")]);
        let options = DecoderOptions::default();
        let ctx = DecodeContext::root(&options);
        assert_eq!(Node::Candidates(vec![&wrapped]).items(&ctx).len(), 2);
        // a single keyed candidate is one item, not its children
        let mut keyed = KeyedBox::new();
        keyed.push_element("x", text("1"));
        keyed.push_element("y", text("2"));
        let keyed = XmlBox::Keyed(keyed);
        assert_eq!(Node::Candidates(vec![&keyed]).items(&ctx).len(), 1);
        assert_eq!(Node::Box(&keyed).items(&ctx).len(), 2);
    }

    #[test]
    fn keyed_alternatives_group_repeats() {
        let mut keyed = KeyedBox::new();
        keyed.push_element("int", text("1"));
        keyed.push_element("string", text("x"));
        keyed.push_element("int", text("2"));
        let keyed = XmlBox::Keyed(keyed);
        let options = DecoderOptions::default();
        let ctx = DecodeContext::root(&options);
        let alternatives = Node::Box(&keyed).alternatives(&ctx, &[]).unwrap();
        let names: Vec<_> = alternatives.iter().map(|(key, _)| key.as_ref()).collect();
        assert_eq!(names, vec!["int", "string"]);
        assert!(matches!(&alternatives[0].1, Node::Candidates(items) if items.len() == 2));
    }
}
