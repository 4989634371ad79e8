//! Encoding containers: drive a value's serde self-description into a box
//! tree.
//!
//! Every write goes through one of three container kinds (keyed, unkeyed,
//! single-element), each holding a slot in a shared [`BoxArena`]. The serde
//! [`Serializer`](serde::Serializer) in `serializer` is a thin driver over
//! the same containers, so hand-written and derived encoding follow one set
//! of placement and naming rules.
pub mod keyed;
pub mod unkeyed;
pub mod single;
mod serializer;

use serde::Serialize;

use crate::boxes::{Attributes, XmlBox};
use crate::boxes::keyed::insert_attribute;
use crate::cell::{BoxArena, Cell, CellId, KeyedCell, SingleElementCell};
use crate::error::{CodingPath, Error, Result};
use crate::markup::Element;
use crate::options::EncoderOptions;

pub use keyed::KeyedEncodingContainer;
pub use unkeyed::UnkeyedEncodingContainer;
pub use single::SingleElementEncodingContainer;

/// Key under which `super_encoder` writes.
pub const SUPER_KEY: &str = "super";

// ————————————————————————————————————————————————————————————————————————————
// CONTEXT
// ————————————————————————————————————————————————————————————————————————————

/// Explicit traversal state threaded through every container.
#[derive(Debug, Clone)]
pub(crate) struct EncodeContext<'o> {
    pub options: &'o EncoderOptions,
    pub path: CodingPath,
}

impl<'o> EncodeContext<'o> {
    pub fn root(options: &'o EncoderOptions) -> Self {
        EncodeContext { options, path: CodingPath::root() }
    }

    pub fn child_key(&self, key: &str) -> Self {
        EncodeContext { options: self.options, path: self.path.child_key(key) }
    }

    pub fn child_index(&self, index: usize) -> Self {
        EncodeContext { options: self.options, path: self.path.child_index(index) }
    }

    /// Markup name for `key`, transformed at the moment it is attached.
    pub fn convert_key(&self, key: &str) -> String {
        self.options.key_encoding.apply(&self.path, key)
    }
}

/// Encode one value on its own; used for children before they are attached.
pub(crate) fn encode_value<T: Serialize + ?Sized>(ctx: &EncodeContext<'_>, value: &T) -> Result<XmlBox> {
    value
        .serialize(serializer::BoxSerializer::new(ctx.clone()))
        .map_err(|error| error.or_path(&ctx.path))
}

pub(crate) fn write_attribute(attributes: &mut Attributes, path: &CodingPath, key: String, value: XmlBox) -> Result<()> {
    match value {
        XmlBox::Simple(simple) => {
            if !insert_attribute(attributes, key.clone(), simple) {
                tracing::debug!(%path, key = %key, "duplicate attribute write ignored");
            }
            Ok(())
        }
        // absent optionals leave no attribute behind
        XmlBox::Null => Ok(()),
        other => Err(Error::invalid_value(
            path,
            format!("attribute `{key}` must be a simple value, found {}", other.shape()),
        )),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TOP LEVEL
// ————————————————————————————————————————————————————————————————————————————

/// Encoder configured once, reusable across passes.
#[derive(Debug, Clone, Default)]
pub struct XmlEncoder {
    options: EncoderOptions,
}

impl XmlEncoder {
    pub fn new(options: EncoderOptions) -> Self {
        XmlEncoder { options }
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Start a hand-driven pass.
    pub fn top_level(&self) -> TopLevelEncoder<'_> {
        TopLevelEncoder::new(&self.options)
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<XmlBox> {
        encode_value(&EncodeContext::root(&self.options), value)
    }

    pub fn encode_to_element<T: Serialize + ?Sized>(&self, value: &T, root_key: &str) -> Result<Element> {
        let root = self.encode(value)?;
        Element::from_box(root_key, &root)
    }

    pub fn encode_to_string<T: Serialize + ?Sized>(&self, value: &T, root_key: &str) -> Result<String> {
        Ok(self.encode_to_element(value, root_key)?.to_xml_string())
    }
}

/// Owns the arena of one encode pass. The root slot takes whichever
/// container (or single value) is requested; `finish` freezes the tree.
#[derive(Debug)]
pub struct TopLevelEncoder<'o> {
    arena: BoxArena,
    root: CellId,
    options: &'o EncoderOptions,
}

impl<'o> TopLevelEncoder<'o> {
    pub fn new(options: &'o EncoderOptions) -> Self {
        let mut arena = BoxArena::new();
        let root = arena.alloc(Cell::Pending);
        TopLevelEncoder { arena, root, options }
    }

    pub fn slot(&mut self) -> SlotEncoder<'_> {
        SlotEncoder::new(&mut self.arena, self.root, EncodeContext::root(self.options))
    }

    pub fn keyed_container(&mut self) -> KeyedEncodingContainer<'_> {
        self.slot().keyed_container()
    }

    pub fn unkeyed_container(&mut self) -> UnkeyedEncodingContainer<'_> {
        self.slot().unkeyed_container()
    }

    pub fn single_element_container(&mut self) -> SingleElementEncodingContainer<'_> {
        self.slot().single_element_container()
    }

    pub fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.slot().encode(value)
    }

    pub fn finish(self) -> XmlBox {
        self.arena.into_box(self.root)
    }
}

/// An encoder anchored at one slot of a parent: the root of a pass, or the
/// `super` entry of a container. Asking for the same container kind twice
/// reuses the slot; a different kind replaces it.
#[derive(Debug)]
pub struct SlotEncoder<'a> {
    arena: &'a mut BoxArena,
    cell: CellId,
    ctx: EncodeContext<'a>,
}

impl<'a> SlotEncoder<'a> {
    pub(crate) fn new(arena: &'a mut BoxArena, cell: CellId, ctx: EncodeContext<'a>) -> Self {
        SlotEncoder { arena, cell, ctx }
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.ctx.path
    }

    pub fn keyed_container(self) -> KeyedEncodingContainer<'a> {
        if !self.arena.is_keyed(self.cell) {
            self.arena.set(self.cell, Cell::Keyed(KeyedCell::default()));
        }
        KeyedEncodingContainer::new(self.arena, self.cell, self.ctx, None)
    }

    pub fn unkeyed_container(self) -> UnkeyedEncodingContainer<'a> {
        if !self.arena.is_unkeyed(self.cell) {
            self.arena.set(self.cell, Cell::Unkeyed(Vec::new()));
        }
        UnkeyedEncodingContainer::new(self.arena, self.cell, self.ctx)
    }

    pub fn single_element_container(self) -> SingleElementEncodingContainer<'a> {
        if !self.arena.is_single(self.cell) {
            self.arena.set(self.cell, Cell::SingleElement(SingleElementCell::default()));
        }
        SingleElementEncodingContainer::new(self.arena, self.cell, self.ctx, None)
    }

    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<()> {
        let value = encode_value(&self.ctx, value)?;
        self.arena.set(self.cell, Cell::Built(value));
        Ok(())
    }

    pub fn encode_nil(self) {
        self.arena.set(self.cell, Cell::Built(XmlBox::Null));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::boxes::{KeyedBox, SimpleBox, SingleElementBox};

    fn int(x: i64) -> XmlBox {
        XmlBox::Simple(SimpleBox::Int(x))
    }

    #[test]
    fn hand_driven_pass_builds_nested_tree() {
        let options = EncoderOptions::default();
        let mut top = TopLevelEncoder::new(&options);
        {
            let mut root = top.keyed_container();
            root.encode("@id", "b1").unwrap();
            root.encode("title", "Dune").unwrap();
            {
                let mut tags = root.nested_unkeyed("tag");
                tags.encode("scifi").unwrap();
                tags.encode("classic").unwrap();
            }
            let mut meta = root.nested_keyed("meta");
            meta.encode("pages", &412).unwrap();
        }
        let mut expected = KeyedBox::new();
        expected.insert_attribute("id", SimpleBox::from("b1"));
        expected.push_element("title", XmlBox::Simple(SimpleBox::from("Dune")));
        expected.push_element("tag", XmlBox::Unkeyed(vec![
            XmlBox::Simple(SimpleBox::from("scifi")),
            XmlBox::Simple(SimpleBox::from("classic")),
        ]));
        let mut meta = KeyedBox::new();
        meta.push_element("pages", int(412));
        expected.push_element("meta", XmlBox::Keyed(meta));
        assert_eq!(top.finish(), XmlBox::Keyed(expected));
    }

    #[test]
    fn super_encoder_writes_under_reserved_key() {
        let options = EncoderOptions::default();
        let mut top = TopLevelEncoder::new(&options);
        {
            let mut root = top.keyed_container();
            root.encode("own", &1).unwrap();
            let mut parent = root.super_encoder().keyed_container();
            parent.encode("inherited", &2).unwrap();
        }
        let XmlBox::Keyed(root) = top.finish() else { panic!("keyed root expected") };
        assert_eq!(root.element_keys(), vec!["own", SUPER_KEY]);
        let inherited: Vec<_> = root.elements_named(SUPER_KEY).collect();
        let mut expected = KeyedBox::new();
        expected.push_element("inherited", int(2));
        assert_eq!(inherited, vec![&XmlBox::Keyed(expected)]);
    }

    #[test]
    fn top_level_single_value_and_choice() {
        let options = EncoderOptions::default();
        let mut top = TopLevelEncoder::new(&options);
        top.encode(&42u8).unwrap();
        assert_eq!(top.finish(), XmlBox::Simple(SimpleBox::UInt(42)));

        let mut top = TopLevelEncoder::new(&options);
        {
            let mut choice = top.single_element_container();
            choice.encode("int", &1).unwrap();
            choice.encode("string", "one").unwrap();
        }
        assert_eq!(
            top.finish(),
            XmlBox::SingleElement(SingleElementBox::new("string", XmlBox::Simple(SimpleBox::from("one")))),
        );
    }

    #[test]
    fn reusing_a_slot_keeps_earlier_writes() {
        let options = EncoderOptions::default();
        let mut top = TopLevelEncoder::new(&options);
        top.keyed_container().encode("a", &1).unwrap();
        top.keyed_container().encode("b", &2).unwrap();
        let XmlBox::Keyed(root) = top.finish() else { panic!("keyed root expected") };
        assert_eq!(root.element_keys(), vec!["a", "b"]);
    }
}
