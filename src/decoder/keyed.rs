use std::borrow::Cow;
use std::collections::HashMap;
use serde::de::{Deserialize, DeserializeSeed, MapAccess};

use crate::boxes::{SimpleBox, XmlBox};
use crate::error::{CodingPath, Error, Result};
use crate::placement::{markup_name, NodeDecoding, VALUE_KEY};
use super::node::{group, Node, NULL};
use super::{decode_node, decode_value, ChoiceResolver, DecodeContext, NodeDeserializer, SlotDecoder, UnkeyedDecodingContainer, SUPER_KEY};

// ————————————————————————————————————————————————————————————————————————————
// VIEW
// ————————————————————————————————————————————————————————————————————————————

/// Children and attributes of one element with names already converted to
/// field form.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyedView<'de> {
    pub elements: Vec<(Cow<'de, str>, &'de XmlBox)>,
    pub attributes: Vec<(Cow<'de, str>, &'de SimpleBox)>,
}

impl<'de> KeyedView<'de> {
    pub fn of(node: Node<'de>, ctx: &DecodeContext<'_>) -> Result<Self> {
        match node.settle() {
            Node::Absent => Ok(Self::default()),
            Node::Box(value) => match value {
                XmlBox::Null => Ok(Self::default()),
                XmlBox::Keyed(keyed) => Ok(KeyedView {
                    elements: convert(ctx, keyed.elements.iter().map(|(key, element)| (key.as_str(), element))),
                    attributes: convert(ctx, keyed.attributes.iter().map(|(key, value)| (key.as_str(), value))),
                }),
                XmlBox::SingleElement(single) => Ok(KeyedView {
                    elements: convert(ctx, std::iter::once((single.key.as_str(), &*single.element))),
                    attributes: convert(ctx, single.attributes.iter().map(|(key, value)| (key.as_str(), value))),
                }),
                XmlBox::Choice(choice) => Ok(KeyedView {
                    elements: convert(ctx, std::iter::once((choice.key.as_str(), &*choice.element))),
                    attributes: Vec::new(),
                }),
                // a text-only element is all content
                XmlBox::Simple(_) => Ok(KeyedView {
                    elements: vec![(Cow::Borrowed(VALUE_KEY), value)],
                    attributes: Vec::new(),
                }),
                XmlBox::Unkeyed(_) => Err(Error::type_mismatch(&ctx.path, "a keyed element", value.shape())),
            },
            Node::Choice { key, element } => Ok(KeyedView { elements: vec![(key, element)], attributes: Vec::new() }),
            Node::Mixed(entries) => Ok(KeyedView { elements: entries, attributes: Vec::new() }),
            other => Err(Error::type_mismatch(&ctx.path, "a keyed element", other.shape())),
        }
    }

    /// Candidates for `field` under `placement`: matching elements first,
    /// the attribute only when the placement allows and no element matched.
    pub fn gather(&self, placement: NodeDecoding, field: &str) -> Node<'de> {
        if field == VALUE_KEY {
            return self.content();
        }
        let name = markup_name(field);
        let elements: Vec<&'de XmlBox> = self.elements.iter()
            .filter(|(key, _)| key == name)
            .map(|(_, element)| *element)
            .collect();
        let attribute = self.attributes.iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| Node::Scalar(*value));

        match placement {
            NodeDecoding::Attribute => attribute.unwrap_or(Node::Absent),
            NodeDecoding::Element if elements.is_empty() => Node::Absent,
            NodeDecoding::Element => Node::Candidates(elements),
            NodeDecoding::ElementOrAttribute if elements.is_empty() => attribute.unwrap_or(Node::Absent),
            NodeDecoding::ElementOrAttribute => Node::Candidates(elements),
        }
    }

    /// `$value`: every child in document order when there are child
    /// elements, otherwise the element's text.
    fn content(&self) -> Node<'de> {
        if self.elements.iter().any(|(key, _)| key != VALUE_KEY) {
            return Node::Mixed(self.elements.clone());
        }
        let text: Vec<&'de XmlBox> = self.elements.iter().map(|(_, element)| *element).collect();
        if text.is_empty() {
            Node::Box(&NULL)
        } else {
            Node::Candidates(text)
        }
    }

    /// Map entries: element names in document order, then attributes as `@name`.
    pub fn map_entries(&self) -> Vec<(Cow<'de, str>, Node<'de>)> {
        let mut entries = group(self.elements.iter().cloned());
        for (key, value) in &self.attributes {
            entries.push((Cow::Owned(format!("@{key}")), Node::Scalar(*value)));
        }
        entries
    }
}

/// Convert names to field form. When two different names convert to the
/// same field name the first one keeps it and later ones are dropped.
fn convert<'de, V>(ctx: &DecodeContext<'_>, raw: impl Iterator<Item = (&'de str, V)>) -> Vec<(Cow<'de, str>, V)> {
    let mut owners: HashMap<String, &'de str> = HashMap::new();
    let mut out = Vec::new();
    for (name, value) in raw {
        let key = ctx.convert_key(name);
        match owners.get(key.as_ref()).copied() {
            Some(owner) if owner != name => {
                tracing::debug!(path = %ctx.path, key = %key, kept = owner, dropped = name, "decoded key collision");
                continue;
            }
            Some(_) => {}
            None => {
                owners.insert(key.clone().into_owned(), name);
            }
        }
        out.push((key, value));
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// CONTAINER
// ————————————————————————————————————————————————————————————————————————————

/// Named access to one element's children and attributes.
#[derive(Debug, Clone)]
pub struct KeyedDecodingContainer<'de, 'o> {
    view: KeyedView<'de>,
    ctx: DecodeContext<'o>,
    type_name: Option<&'o str>,
}

impl<'de, 'o> KeyedDecodingContainer<'de, 'o> {
    pub(crate) fn new(node: Node<'de>, ctx: DecodeContext<'o>) -> Result<Self> {
        let view = KeyedView::of(node, &ctx)?;
        Ok(KeyedDecodingContainer { view, ctx, type_name: None })
    }

    /// Resolve placement as fields of `type_name` (per-type overrides).
    pub fn for_type(mut self, type_name: &'o str) -> Self {
        self.type_name = Some(type_name);
        self
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.ctx.path
    }

    /// Element names in document order, then attribute names.
    pub fn all_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        let names = self.view.elements.iter().map(|(key, _)| key).chain(self.view.attributes.iter().map(|(key, _)| key));
        for key in names {
            if !keys.iter().any(|existing| existing == key) {
                keys.push(key.clone().into_owned());
            }
        }
        keys
    }

    pub fn contains(&self, key: &str) -> bool {
        !matches!(self.field(key), Node::Absent)
    }

    /// True when `key` is absent or an empty element.
    pub fn decode_nil(&self, key: &str) -> bool {
        self.field(key).is_nil()
    }

    pub fn decode<T: Deserialize<'de>>(&self, key: &str) -> Result<T> {
        decode_value(&self.child(key), self.field(key))
    }

    pub fn decode_if_present<T: Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        match self.field(key) {
            Node::Absent => Ok(None),
            node => decode_value(&self.child(key), node).map(Some),
        }
    }

    pub fn nested_keyed(&self, key: &str) -> Result<KeyedDecodingContainer<'de, 'o>> {
        match self.field(key) {
            Node::Absent => Err(Error::key_not_found(&self.ctx.path, markup_name(key))),
            node => KeyedDecodingContainer::new(node, self.child(key)),
        }
    }

    /// An absent key is an empty sequence.
    pub fn nested_unkeyed(&self, key: &str) -> Result<UnkeyedDecodingContainer<'de, 'o>> {
        UnkeyedDecodingContainer::new(self.field(key), self.child(key))
    }

    /// Resolve the alternative stored under `key`.
    pub fn choice_resolver<'a, T>(&self, key: &str) -> ChoiceResolver<'a, 'de, 'o, T> {
        ChoiceResolver::new(self.field(key), self.child(key))
    }

    pub fn super_decoder(&self) -> SlotDecoder<'de, 'o> {
        self.super_decoder_for(SUPER_KEY)
    }

    pub fn super_decoder_for(&self, key: &str) -> SlotDecoder<'de, 'o> {
        SlotDecoder::new(self.field(key), self.child(key))
    }

    pub(crate) fn field(&self, key: &str) -> Node<'de> {
        self.field_of(self.type_name, key)
    }

    pub(crate) fn field_of(&self, type_name: Option<&str>, key: &str) -> Node<'de> {
        let placement = self.ctx.options.node_decoding.resolve(type_name, key);
        self.view.gather(placement, key)
    }

    fn child(&self, key: &str) -> DecodeContext<'o> {
        self.ctx.child_key(markup_name(key))
    }

    /// serde map access over the declared struct fields present in the
    /// tree, plus the absent ones named in `elided`.
    pub(crate) fn into_struct_access(
        self,
        type_name: Option<&str>,
        fields: &'static [&'static str],
        elided: &[String],
    ) -> KeyedAccess<'de, 'o> {
        let entries = fields.iter()
            .map(|field| (Cow::Borrowed(*field), self.field_of(type_name, field)))
            .filter(|(field, node)| !matches!(node, Node::Absent) || elided.iter().any(|name| name == field))
            .collect();
        KeyedAccess::new(entries, self.ctx)
    }

    pub(crate) fn into_map_access(self) -> KeyedAccess<'de, 'o> {
        KeyedAccess::new(self.view.map_entries(), self.ctx)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SERDE ACCESS
// ————————————————————————————————————————————————————————————————————————————

pub(crate) struct KeyedAccess<'de, 'o> {
    entries: std::vec::IntoIter<(Cow<'de, str>, Node<'de>)>,
    pending: Option<(Cow<'de, str>, Node<'de>)>,
    ctx: DecodeContext<'o>,
}

impl<'de, 'o> KeyedAccess<'de, 'o> {
    fn new(entries: Vec<(Cow<'de, str>, Node<'de>)>, ctx: DecodeContext<'o>) -> Self {
        KeyedAccess { entries: entries.into_iter(), pending: None, ctx }
    }

    fn take_pending(&mut self) -> Result<(DecodeContext<'o>, Node<'de>)> {
        let Some((key, value)) = self.pending.take() else {
            return Err(Error::invalid_value(&self.ctx.path, "map value requested before its key"));
        };
        Ok((self.ctx.child_key(markup_name(&key)), value))
    }
}

impl<'de> MapAccess<'de> for KeyedAccess<'de, '_> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some((key, value)) = self.entries.next() else {
            return Ok(None);
        };
        let name = seed.deserialize(NodeDeserializer::new(Node::Text(key.clone()), self.ctx.clone()))?;
        self.pending = Some((key, value));
        Ok(Some(name))
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let (ctx, value) = self.take_pending()?;
        decode_node(&ctx, value, seed)
    }

    fn next_value<V: Deserialize<'de>>(&mut self) -> Result<V> {
        let (ctx, value) = self.take_pending()?;
        decode_value(&ctx, value)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}
