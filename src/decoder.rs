//! Decoding containers: read a box tree back into typed values.
//!
//! The tree is only ever borrowed. Containers hold a [`Node`] view onto it
//! (a box, an attribute value, a run of same-named elements, ...), so every
//! retry and every alternative tried during choice resolution reads the
//! same input without copying or consuming it.
pub mod keyed;
pub mod unkeyed;
pub mod choice;
mod node;
mod deserializer;

use std::borrow::Cow;
use serde::de::{Deserialize, DeserializeOwned, DeserializeSeed};

use crate::boxes::XmlBox;
use crate::error::{CodingPath, Error, Result};
use crate::options::DecoderOptions;

pub use keyed::KeyedDecodingContainer;
pub use unkeyed::UnkeyedDecodingContainer;
pub use choice::{ChoiceDecodingContainer, ChoiceResolver};
pub(crate) use node::Node;
pub(crate) use deserializer::NodeDeserializer;

pub use crate::encoder::SUPER_KEY;

// ————————————————————————————————————————————————————————————————————————————
// CONTEXT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub(crate) struct DecodeContext<'o> {
    pub options: &'o DecoderOptions,
    pub path: CodingPath,
}

impl<'o> DecodeContext<'o> {
    pub fn root(options: &'o DecoderOptions) -> Self {
        DecodeContext { options, path: CodingPath::root() }
    }

    pub fn child_key(&self, key: &str) -> Self {
        DecodeContext { options: self.options, path: self.path.child_key(key) }
    }

    pub fn child_index(&self, index: usize) -> Self {
        DecodeContext { options: self.options, path: self.path.child_index(index) }
    }

    /// Field-form name for a markup name read off a box.
    pub fn convert_key<'k>(&self, key: &'k str) -> Cow<'k, str> {
        let strategy = &self.options.key_decoding;
        if strategy.is_identity() {
            Cow::Borrowed(key)
        } else {
            Cow::Owned(strategy.apply(&self.path, key))
        }
    }
}

/// Decode `node` with `seed`, locating any unplaced error at `ctx.path`.
pub(crate) fn decode_node<'de, S: DeserializeSeed<'de>>(
    ctx: &DecodeContext<'_>,
    node: Node<'de>,
    seed: S,
) -> Result<S::Value> {
    seed.deserialize(NodeDeserializer::new(node, ctx.clone()))
        .map_err(|error| error.or_path(&ctx.path))
}

/// Decode `node` as a `T`.
///
/// Struct fields with nothing in the tree are left out of the first read so
/// serde can default them. A field serde then reports missing is handed the
/// absent node on a re-read, which turns a missing sequence into an empty
/// one and anything else into a located [`Error::KeyNotFound`].
pub(crate) fn decode_value<'de, T: Deserialize<'de>>(ctx: &DecodeContext<'_>, node: Node<'de>) -> Result<T> {
    let mut elided: Vec<String> = Vec::new();
    loop {
        let de = NodeDeserializer::new(node.clone(), ctx.clone()).eliding(elided.clone());
        let error = match T::deserialize(de) {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        let field = error.missing_field_name()
            .filter(|field| !elided.iter().any(|name| name == field))
            .map(str::to_owned);
        let Some(field) = field else {
            return Err(error.or_path(&ctx.path));
        };
        tracing::trace!(path = %ctx.path, field = %field, "re-reading with absent field");
        elided.push(field);
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TOP LEVEL
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default)]
pub struct XmlDecoder {
    options: DecoderOptions,
}

impl XmlDecoder {
    pub fn new(options: DecoderOptions) -> Self {
        XmlDecoder { options }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Start a hand-driven pass over `root`.
    pub fn top_level<'de>(&self, root: &'de XmlBox) -> SlotDecoder<'de, '_> {
        SlotDecoder::new(Node::Box(root), DecodeContext::root(&self.options))
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn decode<'de, T: Deserialize<'de>>(&self, root: &'de XmlBox) -> Result<T> {
        decode_value(&DecodeContext::root(&self.options), Node::Box(root))
    }

    /// Parse markup and decode its root element.
    pub fn decode_str<T: DeserializeOwned>(&self, markup: &str) -> Result<T> {
        let root = crate::markup::parse_box(markup)?;
        self.decode(&root)
    }
}

/// A decoder anchored at one node: the document root, a `super` entry, or
/// one item of an unkeyed container.
#[derive(Debug, Clone)]
pub struct SlotDecoder<'de, 'o> {
    node: Node<'de>,
    ctx: DecodeContext<'o>,
}

impl<'de, 'o> SlotDecoder<'de, 'o> {
    pub(crate) fn new(node: Node<'de>, ctx: DecodeContext<'o>) -> Self {
        SlotDecoder { node, ctx }
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.ctx.path
    }

    /// Absent, or an empty element.
    pub fn is_null(&self) -> bool {
        self.node.is_nil()
    }

    pub fn keyed_container(&self) -> Result<KeyedDecodingContainer<'de, 'o>> {
        KeyedDecodingContainer::new(self.node.clone(), self.ctx.clone())
    }

    pub fn unkeyed_container(&self) -> Result<UnkeyedDecodingContainer<'de, 'o>> {
        UnkeyedDecodingContainer::new(self.node.clone(), self.ctx.clone())
    }

    /// The node as exactly one named alternative.
    pub fn choice_container(&self) -> Result<ChoiceDecodingContainer<'de, 'o>> {
        if let Node::Named { key, element } | Node::Choice { key, element } = &self.node {
            return Ok(ChoiceDecodingContainer::new(key.clone(), Node::Box(*element), self.ctx.clone()));
        }
        let mut alternatives = self.node.clone().alternatives(&self.ctx, &[])?;
        if alternatives.len() != 1 {
            return Err(Error::type_mismatch(
                &self.ctx.path,
                "a single alternative",
                format!("{} alternatives", alternatives.len()),
            ));
        }
        let (key, element) = alternatives.remove(0);
        Ok(ChoiceDecodingContainer::new(key, element, self.ctx.clone()))
    }

    pub fn choice_resolver<'a, T>(&self) -> ChoiceResolver<'a, 'de, 'o, T> {
        ChoiceResolver::new(self.node.clone(), self.ctx.clone())
    }

    pub fn decode<T: Deserialize<'de>>(&self) -> Result<T> {
        decode_value(&self.ctx, self.node.clone())
    }
}
